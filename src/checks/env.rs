//! Required environment variable check.

use crate::{Check, Payload, Record};
use serde_json::json;
use std::env;

/// Reports each required variable that is unset or empty.
#[derive(Debug, Clone)]
pub struct EnvCheck {
    name: String,
    required: Vec<String>,
}

impl EnvCheck {
    pub fn new(name: String, required: Vec<String>) -> Self {
        EnvCheck { name, required }
    }
}

impl Check for EnvCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> anyhow::Result<Payload> {
        Ok(self
            .required
            .iter()
            .filter(|var| env::var_os(var).map_or(true, |value| value.is_empty()))
            .map(|var| {
                let mut row = Record::new();
                row.insert("variable".to_string(), json!(var));
                row
            })
            .collect())
    }

    fn description(&self) -> Option<&str> {
        Some("Verify required environment variables are set")
    }
}
