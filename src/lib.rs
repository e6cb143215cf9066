//! health-doc library
//!
//! Runs a registry of independent, pluggable diagnostic checks against a live
//! application and aggregates their results for presentation or scripting.
//!
//! This library provides:
//! - The [`Check`] contract every diagnostic implements
//! - Safe, timed execution of a single check ([`engine::runner::CheckRunner`])
//! - Selection and aggregation over a registry ([`engine::orchestrator::ResultAggregator`])
//! - Built-in probe kinds (TCP connectivity, external commands, environment)
//! - Text, JSON, and JUnit reporters
//!
//! # Example
//!
//! ```no_run
//! use health_doc::{run_checks, HealthDocConfig, Selector};
//!
//! let config = HealthDocConfig::load("health-doc.toml").expect("config");
//! let report = run_checks(&config, Some(&Selector::All));
//! println!("Checks passed: {}", report.summary().passed);
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod registry;

use engine::orchestrator::ResultAggregator;
use engine::result::HealthReport;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

// Re-exports for public API
pub use config::HealthDocConfig;
pub use engine::orchestrator::{AggregatorConfig, Selector};
pub use engine::result::{summarize, CheckResults, ResultSummary};
pub use registry::Registry;

/// One row of a check payload: field name to value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The anomalies a check found. Empty means healthy.
pub type Payload = Vec<Record>;

/// Message reported for a check whose payload is empty.
pub const SUCCESS_MESSAGE: &str = "All checks passed successfully";

/// A diagnostic unit with a stable name and a run operation.
///
/// `run` returns the anomalies it observed; an empty payload means the
/// check is healthy. Any error returned (or panic raised) is captured by
/// the runner and reported as [`CheckStatus::Error`].
pub trait Check: Send + Sync {
    /// Human-readable identity used for display.
    fn name(&self) -> &str;

    /// Perform the diagnostic.
    fn run(&self) -> anyhow::Result<Payload>;

    /// Optional description of what this check validates
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Outcome classification of one check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Payload was empty
    Success,
    /// Payload listed anomalies
    Warning,
    /// The check itself failed to run
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Success => write!(f, "success"),
            CheckStatus::Warning => write!(f, "warning"),
            CheckStatus::Error => write!(f, "error"),
        }
    }
}

/// Immutable record produced by one check execution.
///
/// Only the runner builds these, so `status`, `data` and `count` always
/// agree: `Error` carries no data, `Success` has a zero count and
/// `Warning` has a positive one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
    data: Payload,
    count: usize,
    #[serde(rename = "execution_time")]
    execution_time_ms: f64,
}

impl CheckResult {
    /// Classify a completed payload.
    pub(crate) fn completed(name: String, data: Payload, execution_time_ms: f64) -> Self {
        let count = data.len();
        if count == 0 {
            CheckResult {
                name,
                status: CheckStatus::Success,
                message: SUCCESS_MESSAGE.to_string(),
                data: Vec::new(),
                count: 0,
                execution_time_ms,
            }
        } else {
            CheckResult {
                name,
                status: CheckStatus::Warning,
                message: format!("Found {} issue(s)", count),
                data,
                count,
                execution_time_ms,
            }
        }
    }

    /// Record a failed run. Any partial payload is discarded.
    pub(crate) fn failed(name: String, message: String, execution_time_ms: f64) -> Self {
        CheckResult {
            name,
            status: CheckStatus::Error,
            message,
            data: Vec::new(),
            count: 0,
            execution_time_ms,
        }
    }

    pub(crate) fn with_execution_time(mut self, execution_time_ms: f64) -> Self {
        self.execution_time_ms = execution_time_ms;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Wall-clock duration in milliseconds, rounded to 2 decimals.
    pub fn execution_time_ms(&self) -> f64 {
        self.execution_time_ms
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.status, self.name, self.message)
    }
}

/// Error types for health-doc operations.
#[derive(Debug, Error)]
pub enum HealthDocError {
    /// Configuration file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// A check definition could not be turned into a check
    #[error("invalid check definition '{id}': {reason}")]
    InvalidCheck { id: String, reason: String },
    /// Report serialization failed
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// Run the selected checks from a loaded configuration.
///
/// Builds the registry from `config.checks`, runs the selection with the
/// engine settings from `config.engine`, and wraps the results in a
/// [`HealthReport`]. A `None` selector runs nothing.
///
/// # Example
///
/// ```no_run
/// use health_doc::{run_checks, HealthDocConfig, Selector};
///
/// let config = HealthDocConfig::default();
/// let report = run_checks(&config, Selector::parse("db-port").as_ref());
/// let summary = report.summary();
/// println!("Passed: {}, Failed: {}", summary.passed, summary.failed);
/// ```
pub fn run_checks(config: &HealthDocConfig, selector: Option<&Selector>) -> HealthReport {
    let registry = checks::build_registry(config);
    let aggregator = ResultAggregator::new(config.engine.clone());

    let start = Instant::now();
    let results = aggregator.run_selected(&registry, selector);

    HealthReport {
        results,
        total_duration_ms: engine::runner::elapsed_ms(start),
    }
}
