//! Configuration and end-to-end tests.
//!
//! Loads config files from disk, builds the registry, and runs it.

use health_doc::checks::build_registry;
use health_doc::engine::orchestrator::list_available;
use health_doc::{run_checks, CheckStatus, HealthDocConfig, HealthDocError, Selector};
use std::fs;
use std::net::TcpListener;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("health-doc.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_load_and_run_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let open = listener.local_addr().unwrap().to_string();

    let (_dir, path) = write_config(&format!(
        r#"
[[checks]]
id = "port"
kind = "tcp"
name = "Local port"
targets = ["{open}"]

[[checks]]
id = "env"
kind = "env"
name = "Environment"
required = ["HEALTH_DOC_E2E_SURELY_UNSET", "PATH"]

[[checks]]
id = "ghost"
kind = "smoke-signal"
"#
    ));

    let config = HealthDocConfig::load(&path).unwrap();
    let report = run_checks(&config, Some(&Selector::All));

    let keys: Vec<_> = report.results.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["port", "env"]);

    assert_eq!(report.results["port"].status(), CheckStatus::Success);
    assert_eq!(report.results["env"].status(), CheckStatus::Warning);
    assert_eq!(report.results["env"].count(), 1);
    assert!(report.total_duration_ms >= 0.0);

    let summary = report.summary();
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_listing_skips_invalid_definitions() {
    let (_dir, path) = write_config(
        r#"
[[checks]]
id = "env"
kind = "env"
required = ["PATH"]

[[checks]]
id = "no-program"
kind = "command"
program = "   "

[[checks]]
id = "no-kind"

[[checks]]
id = "named"
kind = "env"
name = "Named check"
required = []
"#,
    );

    let config = HealthDocConfig::load(&path).unwrap();
    let registry = build_registry(&config);
    assert_eq!(registry.len(), 4);

    let available = list_available(&registry);
    let listed: Vec<_> = available
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![("env", "Environment (env)"), ("named", "Named check")]
    );
    assert!(available.iter().all(|c| c.description.is_some()));
}

#[test]
fn test_engine_section_is_applied() {
    let (_dir, path) = write_config(
        r#"
[engine]
fail_fast = true

[[checks]]
id = "first"
kind = "env"
required = ["HEALTH_DOC_E2E_SURELY_UNSET"]

[[checks]]
id = "second"
kind = "env"
required = []
"#,
    );

    let config = HealthDocConfig::load(&path).unwrap();
    assert!(config.engine.fail_fast);

    let report = run_checks(&config, Some(&Selector::All));
    assert_eq!(report.results.len(), 1);
    assert!(report.results.contains_key("first"));
}

#[test]
fn test_run_checks_without_selector() {
    let (_dir, path) = write_config(
        r#"
[[checks]]
id = "env"
kind = "env"
required = ["PATH"]
"#,
    );

    let config = HealthDocConfig::load(&path).unwrap();
    let report = run_checks(&config, None);
    assert!(report.results.is_empty());
    assert_eq!(report.summary().total, 0);
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = HealthDocConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, HealthDocError::ConfigRead { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[cfg(unix)]
#[test]
fn test_command_probe_end_to_end() {
    let (_dir, path) = write_config(
        r#"
[[checks]]
id = "orphans"
kind = "command"
name = "Orphaned journal rows"
program = "sh"
args = ["-c", "echo '[{\"journal\": 12, \"store\": \"north\"}]'"]

[[checks]]
id = "db"
kind = "command"
name = "Database reachable"
program = "sh"
args = ["-c", "echo 'db down' >&2; exit 1"]
"#,
    );

    let config = HealthDocConfig::load(&path).unwrap();
    let report = run_checks(&config, Some(&Selector::All));

    let orphans = &report.results["orphans"];
    assert_eq!(orphans.status(), CheckStatus::Warning);
    assert_eq!(orphans.count(), 1);
    assert_eq!(orphans.data()[0]["store"], "north");

    let db = &report.results["db"];
    assert_eq!(db.status(), CheckStatus::Error);
    assert!(db.message().contains("db down"));

    assert_eq!(report.summary().exit_code(), 2);
}

#[cfg(unix)]
fn process_alive(pid: &str) -> bool {
    std::process::Command::new("sh")
        .args(["-c", &format!("kill -0 {} 2>/dev/null", pid)])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(unix)]
#[test]
fn test_timed_out_command_probe_is_killed() {
    use std::thread;
    use std::time::{Duration, Instant};

    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let path = dir.path().join("health-doc.toml");
    fs::write(
        &path,
        format!(
            r#"
[engine]
timeout_ms = 200

[[checks]]
id = "stuck"
kind = "command"
program = "sh"
args = ["-c", "echo $$ > '{}'; exec sleep 30"]
"#,
            pid_file.display()
        ),
    )
    .unwrap();

    let config = HealthDocConfig::load(&path).unwrap();
    let report = run_checks(&config, Some(&Selector::All));

    let stuck = &report.results["stuck"];
    assert_eq!(stuck.status(), CheckStatus::Error);

    let pid = fs::read_to_string(&pid_file).unwrap();
    let pid = pid.trim();

    // The runner may report before the probe's own deadline has fired.
    let deadline = Instant::now() + Duration::from_secs(5);
    while process_alive(pid) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(!process_alive(pid), "probe {} outlived its timeout", pid);
}
