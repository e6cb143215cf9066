//! Command line arguments for health-doc.

use crate::config::DEFAULT_CONFIG_FILE;
use crate::engine::orchestrator::AggregatorConfig;
use clap::{Args as _, FromArgMatches, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
    /// JUnit XML for CI/CD integration
    Junit,
}

/// Parsed command line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "health-doc",
    version,
    about = "Run application health checks and report the results"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file
    #[arg(
        long,
        global = true,
        env = "HEALTH_DOC_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        value_name = "FILE"
    )]
    pub config: PathBuf,

    /// Include messages, payload rows, and info-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Command to execute
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run checks and print one line per check plus a summary (default)
    Check(CheckArgs),
    /// List available checks without running them
    List,
    /// Print available checks and selected results as JSON
    Status {
        /// "all" or a check id; without it nothing is run
        #[arg(long, value_name = "SELECTOR")]
        run: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
pub struct CheckArgs {
    /// "all" or a single check id
    #[arg(default_value = "all")]
    pub selector: String,

    /// Output format
    #[arg(long, value_enum, env = "HEALTH_DOC_FORMAT", default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only print checks that did not pass
    #[arg(short, long)]
    pub quiet: bool,

    /// Run checks in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Stop after the first check that does not pass
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-check timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,
}

impl Default for CheckArgs {
    fn default() -> Self {
        CheckArgs {
            selector: "all".to_string(),
            format: OutputFormat::default(),
            quiet: false,
            parallel: false,
            fail_fast: false,
            timeout: None,
        }
    }
}

impl CheckArgs {
    /// Layer command line overrides on top of the configured engine settings.
    pub fn apply_to(&self, engine: &mut AggregatorConfig) {
        if self.parallel {
            engine.parallel = true;
        }
        if self.fail_fast {
            engine.fail_fast = true;
        }
        if let Some(timeout) = self.timeout {
            engine.timeout_ms = Some(timeout);
        }
    }
}

impl Args {
    /// The command to run, defaulting to `check all`.
    ///
    /// The default goes through the same parser as an explicit `check`, so
    /// environment overrides such as `HEALTH_DOC_FORMAT` still apply.
    pub fn selected_command(&self) -> Result<Command, clap::Error> {
        match &self.command {
            Some(command) => Ok(command.clone()),
            None => default_check_args().map(Command::Check),
        }
    }
}

fn default_check_args() -> Result<CheckArgs, clap::Error> {
    let matches =
        CheckArgs::augment_args(clap::Command::new("check")).try_get_matches_from(["check"])?;
    CheckArgs::from_arg_matches(&matches)
}
