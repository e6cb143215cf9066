//! health-doc CLI entry point
//!
//! Runs configured application health checks and reports the results.

use clap::Parser;
use health_doc::cli::args::{Args, CheckArgs, Command};
use health_doc::cli::output::{format_status, get_formatter};
use health_doc::engine::orchestrator::{list_available, ResultAggregator};
use health_doc::{checks, run_checks, HealthDocConfig, Selector};
use std::process::ExitCode;

/// Exit code for configuration or rendering failures
const RUNTIME_ERROR: u8 = 3;

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = match HealthDocConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(RUNTIME_ERROR);
        }
    };

    let command = match args.selected_command() {
        Ok(command) => command,
        Err(e) => e.exit(),
    };

    match command {
        Command::List => print_check_list(&config),
        Command::Status { run } => print_status(&config, run.as_deref()),
        Command::Check(check_args) => run_check_command(&args, config, &check_args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    builder.format_timestamp(None);
    builder.init();
}

fn print_check_list(config: &HealthDocConfig) -> ExitCode {
    let registry = checks::build_registry(config);
    let available = list_available(&registry);

    if available.is_empty() {
        println!("No checks configured.");
        return ExitCode::SUCCESS;
    }

    let width = available.iter().map(|c| c.id.len()).max().unwrap_or(0);

    println!("Available checks:");
    println!();
    for check in &available {
        println!("  {:width$}  {}", check.id, check.name, width = width);
        if let Some(description) = &check.description {
            println!("  {:width$}  {}", "", description, width = width);
        }
    }

    ExitCode::SUCCESS
}

fn print_status(config: &HealthDocConfig, run: Option<&str>) -> ExitCode {
    let registry = checks::build_registry(config);
    let available = list_available(&registry);
    let selector = run.and_then(Selector::parse);

    let aggregator = ResultAggregator::new(config.engine.clone());
    let results = aggregator.run_selected(&registry, selector.as_ref());

    match format_status(&available, &results) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(RUNTIME_ERROR)
        }
    }
}

fn run_check_command(args: &Args, mut config: HealthDocConfig, check_args: &CheckArgs) -> ExitCode {
    check_args.apply_to(&mut config.engine);

    let selector = Selector::parse(&check_args.selector);
    let report = run_checks(&config, selector.as_ref());

    if let Some(Selector::Only(id)) = &selector {
        if report.results.is_empty() {
            eprintln!("No runnable check with id '{}'. Run 'health-doc list' to see available checks.", id);
        }
    }

    let no_color = args.no_color || std::env::var_os("NO_COLOR").is_some();
    let formatter = get_formatter(check_args.format, no_color, args.verbose, check_args.quiet);

    match formatter.format(&report) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error rendering report: {}", e);
            return ExitCode::from(RUNTIME_ERROR);
        }
    }

    ExitCode::from(report.summary().exit_code())
}
