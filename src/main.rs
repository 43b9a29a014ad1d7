//! Stackplan CLI entrypoint.
//!
//! This is the main entrypoint for the stackplan command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stackplan::cli::{Cli, Commands, OutputFormat, OutputFormatter};
use stackplan::config::{ConfigParser, InputValidator, PlanInput, find_input_file};
use stackplan::constraints::{check_all_dependencies, resolve_dependency_graph};
use stackplan::error::Result;
use stackplan::reconciler::Reconciler;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit status for malformed input, distinct from blocked or failed runs.
const INVALID_INPUT: u8 = 2;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose, matches!(cli.output, OutputFormat::Json));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_input_error() {
                ExitCode::from(INVALID_INPUT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Initializes the logging system.
///
/// Logs go to stderr, as JSON lines when the output format is JSON.
fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Writes a formatted document to stdout.
fn emit(document: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{document}")?;
    Ok(())
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Check { warnings } => cmd_check(cli.input.as_ref(), warnings, &formatter),
        Commands::Plan {
            serialize,
            detailed,
            strict,
        } => cmd_plan(cli.input.as_ref(), serialize, detailed, strict, &formatter),
        Commands::Graph => cmd_graph(cli.input.as_ref(), &formatter),
    }
}

/// Validate the input and report conflicts and missing dependencies.
fn cmd_check(input_path: Option<&PathBuf>, show_warnings: bool, formatter: &OutputFormatter) -> Result<()> {
    let input = load_input(input_path)?;

    let result = InputValidator::new().validate(&input)?;
    let deployments = input.resolve_deployments()?;
    let stacks = input.stacks_by_name()?;
    let report = Reconciler::new(&deployments, &stacks, input.settings).reconcile()?;

    let warnings: &[String] = if show_warnings || formatter.is_json() {
        &result.warnings
    } else {
        &[]
    };
    emit(&formatter.format_check(warnings, &report.conflicts, &report.missing))?;
    if formatter.is_json() {
        return Ok(());
    }

    eprintln!("\nInput summary:");
    eprintln!("  Deployments: {}", deployments.len());
    eprintln!("  Live stacks: {}", stacks.len());
    eprintln!("  Conflicting pairs: {}", report.conflicts.len());
    eprintln!("  Deployments with missing dependencies: {}", report.missing.len());

    Ok(())
}

/// Show the change plan.
fn cmd_plan(
    input_path: Option<&PathBuf>,
    serialize: bool,
    detailed: bool,
    strict: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let input = load_input(input_path)?;
    InputValidator::new().validate(&input)?;

    let mut settings = input.settings;
    settings.serialize |= serialize;

    let deployments = input.resolve_deployments()?;
    let stacks = input.stacks_by_name()?;
    let reconciler = Reconciler::new(&deployments, &stacks, settings);
    let report = if strict {
        reconciler.reconcile_checked()?
    } else {
        reconciler.reconcile()?
    };

    emit(&formatter.format_plan(&report, detailed))?;
    if detailed && !formatter.is_json() {
        eprintln!("{report}");
    }

    Ok(())
}

/// Show the deployment dependency graph.
fn cmd_graph(input_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let input = load_input(input_path)?;
    InputValidator::new().validate(&input)?;

    let deployments = input.resolve_deployments()?;
    let (satisfied, _) = check_all_dependencies(&deployments)?;
    let graph = resolve_dependency_graph(&satisfied, input.settings.skip_nonblocking);

    emit(&formatter.format_graph(&graph))
}

/// Resolves the input path, searching upwards when none is given.
fn resolve_input_path(input_path: Option<&PathBuf>) -> Result<PathBuf> {
    input_path.map_or_else(|| find_input_file("."), |path| Ok(path.clone()))
}

/// Loads the input document with `.env` and environment overrides.
fn load_input(input_path: Option<&PathBuf>) -> Result<PlanInput> {
    let input_file = resolve_input_path(input_path)?;
    debug!("Loading input from: {}", input_file.display());

    let parser = ConfigParser::new().with_base_path(input_file.parent().unwrap_or_else(|| Path::new(".")));
    parser.load_dotenv()?;

    let input = parser.load_with_env(&input_file)?;
    info!(
        "Loaded {} deployments and {} live stacks",
        input.deployments.len(),
        input.stacks.len()
    );
    Ok(input)
}
