//! Configuration file loading.
//!
//! The config file is TOML with an optional `[engine]` table and an ordered
//! `[[checks]]` array:
//!
//! ```toml
//! [engine]
//! parallel = true
//! timeout_ms = 10000
//!
//! [[checks]]
//! id = "db-port"
//! kind = "tcp"
//! name = "Database connectivity"
//! targets = ["127.0.0.1:5432"]
//! ```
//!
//! A malformed file is an error. A malformed check entry is not: it is kept
//! as an unresolved entry so the rest of the registry stays usable.

use crate::engine::orchestrator::AggregatorConfig;
use crate::HealthDocError;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "health-doc.toml";

fn default_connect_timeout_ms() -> u64 {
    2000
}

/// How to construct one check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckDefinition {
    /// TCP connectivity to each target
    Tcp {
        name: Option<String>,
        targets: Vec<String>,
        #[serde(default = "default_connect_timeout_ms")]
        connect_timeout_ms: u64,
    },
    /// External program printing a JSON array of anomaly rows
    Command {
        name: Option<String>,
        program: String,
        #[serde(default)]
        args: Vec<String>,
        /// Kill the program after this long (defaults to the engine timeout)
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Required environment variables
    Env {
        name: Option<String>,
        required: Vec<String>,
    },
}

/// One `[[checks]]` entry, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEntry {
    pub id: String,
    /// The parsed definition, or why it could not be parsed
    pub definition: Result<CheckDefinition, String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    engine: AggregatorConfig,
    #[serde(default)]
    checks: Vec<toml::Value>,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthDocConfig {
    pub engine: AggregatorConfig,
    pub checks: Vec<CheckEntry>,
}

impl HealthDocConfig {
    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HealthDocError> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| HealthDocError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents).map_err(|source| HealthDocError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(contents)?;

        let mut seen = HashSet::new();
        let mut checks = Vec::with_capacity(raw.checks.len());

        for (index, value) in raw.checks.into_iter().enumerate() {
            let Some(id) = value.get("id").and_then(toml::Value::as_str).map(str::to_string) else {
                warn!("dropping checks[{}]: missing string 'id'", index);
                continue;
            };

            let definition = if seen.insert(id.clone()) {
                CheckDefinition::deserialize(value).map_err(|e| e.message().trim().to_string())
            } else {
                Err("duplicate check id".to_string())
            };

            if let Err(reason) = &definition {
                warn!("check '{}' is unresolved: {}", id, reason);
            }

            checks.push(CheckEntry { id, definition });
        }

        Ok(HealthDocConfig {
            engine: raw.engine,
            checks,
        })
    }
}
