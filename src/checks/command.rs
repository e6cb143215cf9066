//! External command check.
//!
//! Runs a program and reads anomaly rows from its stdout. This is how
//! data-consistency probes (SQL queries, scripts) plug in without being
//! compiled into the binary.
//!
//! Output contract:
//! - Exit status non-zero: the check errors with the program's stderr
//! - Empty stdout or `null`: healthy
//! - JSON array of objects: one payload row per object
//! - Anything else: the check errors
//! - Still running at the deadline: killed, and the check errors

use crate::{Check, Payload};
use anyhow::{bail, Context};
use log::{debug, warn};
use serde_json::Value;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a running probe is polled while a deadline is set
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct CommandCheck {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandCheck {
    pub fn new(name: String, program: String, args: Vec<String>) -> Self {
        CommandCheck {
            name,
            program,
            args,
            timeout: None,
        }
    }

    /// Kill the probe if it is still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Check for CommandCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> anyhow::Result<Payload> {
        debug!("executing {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run {}", self.program))?;

        // A full pipe would stall the probe, so drain both while waiting.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => match wait_with_deadline(&mut child, limit)? {
                Some(status) => status,
                None => bail!(
                    "{} did not finish within {}ms and was killed",
                    self.program,
                    limit.as_millis()
                ),
            },
            None => child
                .wait()
                .with_context(|| format!("failed to wait for {}", self.program))?,
        };

        let stdout = collect(stdout);
        if !status.success() {
            let stderr = collect(stderr);
            bail!("{} exited with {}: {}", self.program, status, stderr.trim());
        }

        parse_rows(&stdout).with_context(|| format!("unexpected output from {}", self.program))
    }

    fn description(&self) -> Option<&str> {
        Some("Run an external probe and report the rows it prints")
    }
}

/// Wait for `child` until `limit` elapses. On expiry the child is killed and
/// reaped, and `None` is returned.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> anyhow::Result<Option<ExitStatus>> {
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait().context("failed to poll probe")? {
            return Ok(Some(status));
        }

        let elapsed = start.elapsed();
        if elapsed >= limit {
            warn!("probe pid {} exceeded {}ms, killing it", child.id(), limit.as_millis());
            if let Err(e) = child.kill() {
                warn!("failed to kill probe pid {}: {}", child.id(), e);
            }
            child.wait().context("failed to reap killed probe")?;
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL.min(limit - elapsed));
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    let mut pipe = pipe?;
    thread::Builder::new()
        .name("health-check-pipe".to_string())
        .spawn(move || {
            let mut buf = Vec::new();
            // A read error just truncates what we report.
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
        .ok()
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

/// Parse probe stdout into payload rows.
pub fn parse_rows(stdout: &str) -> anyhow::Result<Payload> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Payload::new());
    }

    let value: Value = serde_json::from_str(trimmed).context("output is not valid JSON")?;

    match value {
        Value::Null => Ok(Payload::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(row) => Ok(row),
                other => bail!("row {} is not an object: {}", index, other),
            })
            .collect(),
        _ => bail!("expected a JSON array of objects"),
    }
}
