//! Single check execution tests.
//!
//! Classification, failure isolation, and timing of CheckRunner.

use crate::mocks::*;
use health_doc::engine::runner::{CheckRunner, UNNAMED_CHECK};
use health_doc::{Check, CheckStatus, SUCCESS_MESSAGE};
use std::sync::Arc;
use std::time::Duration;

fn execute(check: Arc<MockCheck>) -> health_doc::CheckResult {
    let check: Arc<dyn Check> = check;
    CheckRunner::new().execute(&check)
}

#[test]
fn test_empty_payload_is_success() {
    let result = execute(healthy("Empty"));

    assert_eq!(result.status(), CheckStatus::Success);
    assert_eq!(result.count(), 0);
    assert!(result.data().is_empty());
    assert_eq!(result.message(), SUCCESS_MESSAGE);
    assert_eq!(result.name(), "Empty");
}

#[test]
fn test_payload_of_n_is_warning() {
    for n in [1, 3, 17] {
        let result = execute(anomalies("Rows", n));

        assert_eq!(result.status(), CheckStatus::Warning);
        assert_eq!(result.count(), n);
        assert_eq!(result.data().len(), n);
        assert_eq!(result.message(), format!("Found {} issue(s)", n));
    }
}

#[test]
fn test_payload_rows_are_kept_in_order() {
    let result = execute(anomalies("Rows", 3));
    let ids: Vec<_> = result.data().iter().map(|row| row["id"].clone()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_error_is_contained() {
    let check = failing("Broken", "db down");
    let result = execute(check.clone());

    assert_eq!(result.status(), CheckStatus::Error);
    assert_eq!(result.message(), "db down");
    assert!(result.data().is_empty());
    assert_eq!(result.count(), 0);
    assert_eq!(check.runs(), 1);
}

#[test]
fn test_panic_is_contained() {
    let result = execute(panicking("Panics", "index out of range"));

    assert_eq!(result.status(), CheckStatus::Error);
    assert_eq!(result.message(), "index out of range");
    assert_eq!(result.count(), 0);
}

#[test]
fn test_execution_time_is_non_negative() {
    let result = execute(healthy("Fast"));
    assert!(result.execution_time_ms() >= 0.0);
}

#[test]
fn test_slower_check_takes_longer() {
    let fast = execute(healthy("Fast"));
    let delayed = execute(slow("Slow", Duration::from_millis(40), 0));

    assert!(delayed.execution_time_ms() >= 40.0);
    assert!(delayed.execution_time_ms() > fast.execution_time_ms());
}

#[test]
fn test_execution_time_has_two_decimals() {
    let result = execute(slow("Slow", Duration::from_millis(3), 1));
    let scaled = result.execution_time_ms() * 100.0;
    assert!((scaled - scaled.round()).abs() < 1e-6);
}

#[test]
fn test_timeout_becomes_error() {
    let check: Arc<dyn Check> = slow("Stuck", Duration::from_millis(500), 0);
    let runner = CheckRunner::with_timeout(Some(Duration::from_millis(25)));

    let result = runner.execute(&check);

    assert_eq!(result.status(), CheckStatus::Error);
    assert_eq!(result.message(), "Check timed out after 25ms");
    assert!(result.data().is_empty());
    assert!(result.execution_time_ms() < 500.0);
}

#[test]
fn test_timeout_still_catches_errors_and_panics() {
    let runner = CheckRunner::with_timeout(Some(Duration::from_secs(5)));

    let broken: Arc<dyn Check> = failing("Broken", "db down");
    let result = runner.execute(&broken);
    assert_eq!(result.status(), CheckStatus::Error);
    assert_eq!(result.message(), "db down");

    let boom: Arc<dyn Check> = panicking("Panics", "boom");
    let result = runner.execute(&boom);
    assert_eq!(result.status(), CheckStatus::Error);
    assert_eq!(result.message(), "boom");
}

#[test]
fn test_each_execution_is_fresh() {
    let check: Arc<dyn Check> = anomalies("Rows", 2);
    let runner = CheckRunner::new();

    let first = runner.execute(&check);
    let second = runner.execute(&check);

    assert_eq!(first.count(), 2);
    assert_eq!(second.count(), 2);
    assert_eq!(first.data(), second.data());
}

#[test]
fn test_panicking_name_is_contained() {
    let check: Arc<dyn Check> = Arc::new(NamelessCheck);

    for runner in [
        CheckRunner::new(),
        CheckRunner::with_timeout(Some(Duration::from_secs(5))),
    ] {
        let result = runner.execute(&check);
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.name(), UNNAMED_CHECK);
        assert_eq!(result.message(), "Check name is unavailable: name exploded");
        assert!(result.data().is_empty());
    }
}
