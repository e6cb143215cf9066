//! Built-in check kinds.
//!
//! This module turns config definitions into constructed checks:
//! - Tcp: Connectivity to one or more `host:port` targets
//! - Command: External probe printing a JSON array of anomaly rows
//! - Env: Required environment variables
//!
//! # Graceful Degradation
//!
//! Building the registry never fails as a whole:
//! - Unparseable definition: Kept as an unresolved registry entry
//! - Definition that cannot be constructed: Kept as an unresolved entry
//!
//! Checks themselves report problems through their payload, or as an error
//! when the probe itself cannot run.

pub mod command;
pub mod env;
pub mod tcp;

use crate::config::{CheckDefinition, CheckEntry, HealthDocConfig};
use crate::registry::Registry;
use crate::{Check, HealthDocError};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

pub use command::CommandCheck;
pub use env::EnvCheck;
pub use tcp::TcpCheck;

/// Build the registry for every configured check, in config order.
pub fn build_registry(config: &HealthDocConfig) -> Registry {
    let mut registry = Registry::new();

    for entry in &config.checks {
        match resolve(entry, config.engine.timeout()) {
            Ok(check) => {
                debug!("registered check '{}' ({})", entry.id, check.name());
                registry.register(entry.id.clone(), check);
            }
            Err(e) => {
                warn!("{}", e);
                registry.register_unresolved(entry.id.clone(), e.to_string());
            }
        }
    }

    registry
}

/// Construct the check described by one config entry.
///
/// `default_timeout` bounds external probes that set no timeout of their own,
/// so a probe abandoned by the runner does not keep running.
pub fn resolve(
    entry: &CheckEntry,
    default_timeout: Option<Duration>,
) -> Result<Arc<dyn Check>, HealthDocError> {
    let definition = entry
        .definition
        .as_ref()
        .map_err(|reason| HealthDocError::InvalidCheck {
            id: entry.id.clone(),
            reason: reason.clone(),
        })?;

    let check: Arc<dyn Check> = match definition {
        CheckDefinition::Tcp {
            name,
            targets,
            connect_timeout_ms,
        } => {
            if targets.is_empty() {
                return Err(invalid(entry, "tcp check needs at least one target"));
            }
            Arc::new(TcpCheck::new(
                display_name(name, "TCP connectivity", &entry.id),
                targets.clone(),
                *connect_timeout_ms,
            ))
        }
        CheckDefinition::Command {
            name,
            program,
            args,
            timeout_ms,
        } => {
            if program.trim().is_empty() {
                return Err(invalid(entry, "command check needs a program"));
            }
            let timeout = match timeout_ms {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(*ms)),
                None => default_timeout,
            };
            Arc::new(
                CommandCheck::new(
                    display_name(name, "Command", &entry.id),
                    program.clone(),
                    args.clone(),
                )
                .with_timeout(timeout),
            )
        }
        CheckDefinition::Env { name, required } => Arc::new(EnvCheck::new(
            display_name(name, "Environment", &entry.id),
            required.clone(),
        )),
    };

    Ok(check)
}

fn invalid(entry: &CheckEntry, reason: &str) -> HealthDocError {
    HealthDocError::InvalidCheck {
        id: entry.id.clone(),
        reason: reason.to_string(),
    }
}

fn display_name(name: &Option<String>, kind: &str, id: &str) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.clone(),
        _ => format!("{} ({})", kind, id),
    }
}
