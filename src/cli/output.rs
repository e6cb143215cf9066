//! Output formatting for health-doc.
//!
//! Provides terminal, JSON, and JUnit XML output formatters, plus the JSON
//! status document used by dashboards.
//!
//! # Graceful Degradation
//!
//! - Color: Disabled via NO_COLOR or --no-color
//! - Empty reports: Produce valid output with zero checks
//! - Non-string payload values: Rendered as compact JSON

use crate::cli::args::OutputFormat;
use crate::engine::orchestrator::AvailableCheck;
use crate::engine::result::{CheckResults, HealthReport};
use crate::{CheckResult, CheckStatus, HealthDocError, Record};
use colored::Colorize;
use quick_xml::escape::escape;
use serde::Serialize;
use serde_json::Value;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a health report into a string
    fn format(&self, report: &HealthReport) -> Result<String, HealthDocError>;
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn tag(&self, status: CheckStatus) -> String {
        let (text, painted) = match status {
            CheckStatus::Success => ("[PASS]", "[PASS]".green()),
            CheckStatus::Warning => ("[WARN]", "[WARN]".yellow()),
            CheckStatus::Error => ("[ERR ]", "[ERR ]".red()),
        };
        if self.color {
            painted.to_string()
        } else {
            text.to_string()
        }
    }

    fn line(&self, result: &CheckResult) -> String {
        let tag = self.tag(result.status());
        match result.status() {
            CheckStatus::Success => format!(
                "  {} {} PASSED in {:.2} ms",
                tag,
                result.name(),
                result.execution_time_ms()
            ),
            CheckStatus::Warning => format!(
                "  {} {} FAILED in {:.2} ms",
                tag,
                result.name(),
                result.execution_time_ms()
            ),
            CheckStatus::Error => format!("  {} {} ERROR: {}", tag, result.name(), result.message()),
        }
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &HealthReport) -> Result<String, HealthDocError> {
        let mut output = String::new();

        if report.results.is_empty() {
            output.push_str("No checks were run.\n");
        }

        for (id, result) in &report.results {
            // Skip passing checks in quiet mode
            if self.quiet && result.status() == CheckStatus::Success {
                continue;
            }

            output.push_str(&self.line(result));
            output.push('\n');

            if self.verbose {
                output.push_str(&format!("         id: {}\n", id));
                if result.status() == CheckStatus::Warning {
                    output.push_str(&format!("         {}\n", result.message()));
                    for row in result.data() {
                        output.push_str(&format!("           - {}\n", format_row(row)));
                    }
                }
            }
        }

        let summary = report.summary();
        output.push('\n');
        output.push_str(&format!(
            "Health Check Summary: {} passed, {} failed, {} errors.\n",
            summary.passed, summary.failed, summary.errors
        ));
        output.push_str(&format!("Total time: {:.2} ms", report.total_duration_ms));

        Ok(output)
    }
}

/// Render one payload row as `key=value` pairs.
pub fn format_row(row: &Record) -> String {
    row.iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: crate::ResultSummary,
    total_duration_ms: f64,
    results: &'a CheckResults,
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &HealthReport) -> Result<String, HealthDocError> {
        let document = JsonReport {
            summary: report.summary(),
            total_duration_ms: report.total_duration_ms,
            results: &report.results,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(json)
    }
}

/// JUnit XML formatter
#[derive(Default)]
pub struct JunitFormatter;

impl JunitFormatter {
    pub fn new() -> Self {
        JunitFormatter
    }
}

impl OutputFormatter for JunitFormatter {
    fn format(&self, report: &HealthReport) -> Result<String, HealthDocError> {
        let summary = report.summary();
        let seconds = report.total_duration_ms / 1000.0;

        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        output.push_str(&format!(
            "<testsuites tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">\n",
            summary.total, summary.failed, summary.errors, seconds
        ));
        output.push_str(&format!(
            "  <testsuite name=\"health-doc\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">\n",
            summary.total, summary.failed, summary.errors, seconds
        ));

        for (id, result) in &report.results {
            output.push_str(&format!(
                "    <testcase name=\"{}\" classname=\"health-doc.{}\" time=\"{:.3}\">\n",
                escape(result.name()),
                escape(id.as_str()),
                result.execution_time_ms() / 1000.0
            ));

            match result.status() {
                CheckStatus::Success => {
                    output.push_str(&format!(
                        "      <system-out>{}</system-out>\n",
                        escape(result.message())
                    ));
                }
                CheckStatus::Warning => {
                    let rows: Vec<String> = result.data().iter().map(format_row).collect();
                    output.push_str(&format!(
                        "      <failure message=\"{}\">{}</failure>\n",
                        escape(result.message()),
                        escape(rows.join("\n").as_str())
                    ));
                }
                CheckStatus::Error => {
                    output.push_str(&format!(
                        "      <error message=\"{}\" />\n",
                        escape(result.message())
                    ));
                }
            }

            output.push_str("    </testcase>\n");
        }

        output.push_str("  </testsuite>\n");
        output.push_str("</testsuites>");
        Ok(output)
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(
    format: OutputFormat,
    no_color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(!no_color, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Junit => Box::new(JunitFormatter::new()),
    }
}

#[derive(Serialize)]
struct StatusDocument<'a> {
    checks: &'a [AvailableCheck],
    results: &'a CheckResults,
}

/// JSON document for dashboards: the check picker plus any results.
pub fn format_status(
    checks: &[AvailableCheck],
    results: &CheckResults,
) -> Result<String, HealthDocError> {
    Ok(serde_json::to_string_pretty(&StatusDocument { checks, results })?)
}
