//! TCP connectivity check.
//!
//! Resolves each `host:port` target and attempts a connection within the
//! configured timeout. Every unreachable target becomes one payload row.

use crate::{Check, Payload, Record};
use serde_json::json;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TcpCheck {
    name: String,
    targets: Vec<String>,
    connect_timeout: Duration,
}

impl TcpCheck {
    pub fn new(name: String, targets: Vec<String>, connect_timeout_ms: u64) -> Self {
        TcpCheck {
            name,
            targets,
            connect_timeout: Duration::from_millis(connect_timeout_ms.max(1)),
        }
    }

    fn probe(&self, target: &str) -> Result<(), String> {
        let addrs: Vec<SocketAddr> = target
            .to_socket_addrs()
            .map_err(|e| format!("resolution failed: {}", e))?
            .collect();

        if addrs.is_empty() {
            return Err("resolution returned no addresses".to_string());
        }

        // Any reachable address is enough.
        let mut last_error: Option<io::Error> = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.connect_timeout) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => e.to_string(),
            None => "connection failed".to_string(),
        })
    }
}

impl Check for TcpCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> anyhow::Result<Payload> {
        let mut unreachable = Payload::new();

        for target in &self.targets {
            if let Err(error) = self.probe(target) {
                let mut row = Record::new();
                row.insert("target".to_string(), json!(target));
                row.insert("error".to_string(), json!(error));
                unreachable.push(row);
            }
        }

        Ok(unreachable)
    }

    fn description(&self) -> Option<&str> {
        Some("Verify TCP connectivity to configured targets")
    }
}
