//! Result aggregation and reporting.
//!
//! Holds the identity-keyed result map, summary tallies, and the report
//! wrapper handed to output formatters.

use crate::{CheckResult, CheckStatus};
use indexmap::IndexMap;
use serde::Serialize;

/// Results keyed by check identity, in registry order.
pub type CheckResults = IndexMap<String, CheckResult>;

/// Result summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    pub total: u32,
}

impl ResultSummary {
    /// Process exit code for this summary.
    ///
    /// 0 = all passed, 1 = anomalies found, 2 = at least one check errored.
    pub fn exit_code(&self) -> u8 {
        if self.errors > 0 {
            2
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Tally results by status.
pub fn summarize(results: &CheckResults) -> ResultSummary {
    let mut summary = ResultSummary::default();

    for result in results.values() {
        summary.total += 1;

        match result.status() {
            CheckStatus::Success => summary.passed += 1,
            CheckStatus::Warning => summary.failed += 1,
            CheckStatus::Error => summary.errors += 1,
        }
    }

    summary
}

/// One aggregator run, ready for a reporter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub results: CheckResults,
    pub total_duration_ms: f64,
}

impl HealthReport {
    pub fn new(results: CheckResults) -> Self {
        HealthReport {
            results,
            total_duration_ms: 0.0,
        }
    }

    /// Calculate summary statistics
    pub fn summary(&self) -> ResultSummary {
        summarize(&self.results)
    }

    /// Results that found anomalies
    pub fn warnings(&self) -> impl Iterator<Item = (&String, &CheckResult)> {
        self.results
            .iter()
            .filter(|(_, r)| r.status() == CheckStatus::Warning)
    }

    /// Results whose check failed to run
    pub fn errors(&self) -> impl Iterator<Item = (&String, &CheckResult)> {
        self.results
            .iter()
            .filter(|(_, r)| r.status() == CheckStatus::Error)
    }
}
