//! Single check execution.
//!
//! Runs exactly one check, times it, and classifies the outcome.
//!
//! # Graceful Degradation
//!
//! This module handles check failures gracefully:
//! - Check returns an error: Converted to an Error result carrying the error text
//! - Check panics: Caught via std::panic::catch_unwind, converted to an Error result
//! - `name()` panics: Error result under a placeholder name
//! - Check timeout: Error result with timeout message; the worker thread is detached
//! - Worker spawn failure: Error result, the caller still gets a CheckResult
//!
//! `execute` always returns a CheckResult. No function in this module will panic.

use crate::{Check, CheckResult, CheckStatus, Payload};
use log::{debug, info, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of invoking a check's logic, before classification.
#[derive(Debug)]
enum Outcome {
    Completed(Payload),
    Failed(String),
}

/// Executes one check safely and produces exactly one result.
#[derive(Debug, Clone, Default)]
pub struct CheckRunner {
    timeout: Option<Duration>,
}

impl CheckRunner {
    /// Create a runner without a timeout
    pub fn new() -> Self {
        CheckRunner { timeout: None }
    }

    /// Create a runner that fails checks running longer than `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        CheckRunner { timeout }
    }

    /// Run the check and build its result.
    pub fn execute(&self, check: &Arc<dyn Check>) -> CheckResult {
        let start = Instant::now();

        let name = match check_name(check.as_ref()) {
            Ok(name) => name,
            Err(message) => {
                warn!("check name could not be read: {}", message);
                return CheckResult::failed(
                    UNNAMED_CHECK.to_string(),
                    format!("Check name is unavailable: {}", message),
                    elapsed_ms(start),
                );
            }
        };
        debug!("running check '{}'", name);

        let outcome = match self.timeout {
            Some(limit) => invoke_with_timeout(check, limit),
            None => invoke(check.as_ref()),
        };

        let result = match outcome {
            Outcome::Completed(data) => CheckResult::completed(name, data, 0.0),
            Outcome::Failed(message) => CheckResult::failed(name, message, 0.0),
        }
        .with_execution_time(elapsed_ms(start));

        match result.status() {
            CheckStatus::Error => warn!(
                "check '{}' errored after {:.2} ms: {}",
                result.name(),
                result.execution_time_ms(),
                result.message()
            ),
            status => info!(
                "check '{}' finished with {} in {:.2} ms ({} items)",
                result.name(),
                status,
                result.execution_time_ms(),
                result.count()
            ),
        }

        result
    }
}

/// Display name used when a check's `name()` panics.
pub const UNNAMED_CHECK: &str = "<unnamed check>";

/// Read a check's name, containing any panic raised by `name()`.
pub fn check_name(check: &dyn Check) -> Result<String, String> {
    panic::catch_unwind(AssertUnwindSafe(|| check.name().to_string()))
        .map_err(|panic| panic_message(panic.as_ref()))
}

/// Milliseconds since `start`, rounded to 2 decimal places.
pub fn elapsed_ms(start: Instant) -> f64 {
    round_ms(start.elapsed())
}

fn round_ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn invoke(check: &dyn Check) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| check.run())) {
        Ok(Ok(payload)) => Outcome::Completed(payload),
        Ok(Err(err)) => Outcome::Failed(format!("{:#}", err)),
        Err(panic) => Outcome::Failed(panic_message(panic.as_ref())),
    }
}

fn invoke_with_timeout(check: &Arc<dyn Check>, limit: Duration) -> Outcome {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(check);

    let spawned = thread::Builder::new()
        .name("health-check-worker".to_string())
        .spawn(move || {
            // The receiver is gone if we already timed out.
            let _ = tx.send(invoke(worker.as_ref()));
        });

    if let Err(e) = spawned {
        return Outcome::Failed(format!("Failed to start check worker: {}", e));
    }

    match rx.recv_timeout(limit) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => Outcome::Failed(format!(
            "Check timed out after {}ms",
            limit.as_millis()
        )),
        Err(RecvTimeoutError::Disconnected) => {
            Outcome::Failed("Check worker exited without reporting a result".to_string())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Check panicked during execution".to_string()
    }
}
