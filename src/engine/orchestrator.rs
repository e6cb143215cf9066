//! Check selection and aggregation.
//!
//! Runs a selected subset of the registry through the [`CheckRunner`] and
//! collects the results keyed by check identity.
//!
//! # Graceful Degradation
//!
//! - Check failures: Contained by the runner, iteration continues
//! - Unresolved registry entries: Skipped with a warning, never run or listed
//! - Unknown selector: Returns an empty result map (not an error)
//! - Absent selector: Returns an empty result map without running anything
//! - Worker thread failure in parallel mode: Reported as an Error result
//!
//! Results are always keyed and ordered by registry position, whatever the
//! completion order of parallel checks.

use crate::engine::result::CheckResults;
use crate::engine::runner::{check_name, CheckRunner, UNNAMED_CHECK};
use crate::registry::{Registry, Resolution};
use crate::{Check, CheckResult, CheckStatus};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Aggregator configuration, read from the `[engine]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Run selected checks concurrently
    pub parallel: bool,
    /// Upper bound on concurrently running checks
    pub max_parallel: usize,
    /// Stop after the first check that does not succeed
    pub fail_fast: bool,
    /// Per-check timeout in milliseconds (None or 0 = no timeout)
    pub timeout_ms: Option<u64>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            parallel: false,
            max_parallel: 4,
            fail_fast: false,
            timeout_ms: None,
        }
    }
}

impl AggregatorConfig {
    /// Per-check timeout, with 0 treated as none.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Which registry entries to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Only(String),
}

impl Selector {
    /// Parse a selector from a request value.
    ///
    /// An empty string means no selection at all ("browse" mode), `"all"`
    /// selects every entry, and anything else is an exact identity.
    pub fn parse(raw: &str) -> Option<Selector> {
        match raw {
            "" => None,
            "all" => Some(Selector::All),
            id => Some(Selector::Only(id.to_string())),
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == id,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "all"),
            Selector::Only(id) => write!(f, "{}", id),
        }
    }
}

/// A listable registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableCheck {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// List resolvable registry entries without running them.
///
/// Unresolved entries are skipped, so one bad definition never hides the
/// rest of the registry.
pub fn list_available(registry: &Registry) -> Vec<AvailableCheck> {
    registry
        .entries()
        .iter()
        .filter_map(|entry| match &entry.resolution {
            Resolution::Resolved(check) => match check_name(check.as_ref()) {
                Ok(name) => Some(AvailableCheck {
                    id: entry.id.clone(),
                    name,
                    description: check_description(check.as_ref()),
                }),
                Err(message) => {
                    warn!("skipping check '{}': name() panicked: {}", entry.id, message);
                    None
                }
            },
            Resolution::Unresolved(reason) => {
                warn!("skipping check '{}': {}", entry.id, reason);
                None
            }
        })
        .collect()
}

fn check_description(check: &dyn Check) -> Option<String> {
    panic::catch_unwind(AssertUnwindSafe(|| check.description().map(str::to_string)))
        .ok()
        .flatten()
}

/// Runs selections of the registry and collects their results.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    config: AggregatorConfig,
    runner: CheckRunner,
}

impl ResultAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        let runner = CheckRunner::with_timeout(config.timeout());
        ResultAggregator { config, runner }
    }

    /// Run the entries chosen by `selector` in registry order.
    ///
    /// `None` runs nothing and returns an empty map.
    pub fn run_selected(&self, registry: &Registry, selector: Option<&Selector>) -> CheckResults {
        let Some(selector) = selector else {
            debug!("no selector given, not running any checks");
            return CheckResults::new();
        };

        let selected: Vec<(&str, &Arc<dyn Check>)> = registry
            .entries()
            .iter()
            .filter(|entry| selector.matches(&entry.id))
            .filter_map(|entry| match &entry.resolution {
                Resolution::Resolved(check) => Some((entry.id.as_str(), check)),
                Resolution::Unresolved(reason) => {
                    warn!("cannot run check '{}': {}", entry.id, reason);
                    None
                }
            })
            .collect();

        if selected.is_empty() {
            debug!("selector '{}' matched no runnable checks", selector);
            return CheckResults::new();
        }

        info!("running {} check(s) for selector '{}'", selected.len(), selector);

        if self.config.parallel && selected.len() > 1 {
            self.run_parallel(&selected)
        } else {
            self.run_sequential(&selected)
        }
    }

    fn run_sequential(&self, selected: &[(&str, &Arc<dyn Check>)]) -> CheckResults {
        let mut results = CheckResults::with_capacity(selected.len());

        for &(id, check) in selected {
            let result = self.runner.execute(check);
            let stop = self.should_stop(&result);
            results.insert(id.to_string(), result);

            if stop {
                info!("fail-fast: skipping remaining checks after '{}'", id);
                break;
            }
        }

        results
    }

    fn run_parallel(&self, selected: &[(&str, &Arc<dyn Check>)]) -> CheckResults {
        let mut results = CheckResults::with_capacity(selected.len());
        let batch_size = self.config.max_parallel.max(1);

        for batch in selected.chunks(batch_size) {
            let runner = &self.runner;

            let batch_results: Vec<(&str, CheckResult)> = thread::scope(|s| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|&(id, check)| {
                        let spawned = thread::Builder::new()
                            .name("health-check-batch".to_string())
                            .spawn_scoped(s, move || runner.execute(check));
                        (id, check, spawned)
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(id, check, spawned)| {
                        let name = || {
                            check_name(check.as_ref()).unwrap_or_else(|_| UNNAMED_CHECK.to_string())
                        };
                        let result = match spawned {
                            Ok(handle) => handle.join().unwrap_or_else(|_| {
                                CheckResult::failed(name(), "Check worker panicked".to_string(), 0.0)
                            }),
                            Err(e) => CheckResult::failed(
                                name(),
                                format!("Failed to start check worker: {}", e),
                                0.0,
                            ),
                        };
                        (id, result)
                    })
                    .collect()
            });

            let stop = batch_results.iter().any(|(_, r)| self.should_stop(r));

            for (id, result) in batch_results {
                results.insert(id.to_string(), result);
            }

            if stop {
                info!("fail-fast: skipping remaining batches");
                break;
            }
        }

        results
    }

    fn should_stop(&self, result: &CheckResult) -> bool {
        self.config.fail_fast && result.status() != CheckStatus::Success
    }
}
