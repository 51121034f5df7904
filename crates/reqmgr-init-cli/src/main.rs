// crates/reqmgr-init-cli/src/main.rs
// ============================================================================
// Module: Bootstrap Initializer Entry Point
// Description: Parses arguments, wires components, and maps outcomes to exit codes.
// Purpose: Run the one-shot database initialization from the command line.
// Dependencies: clap, reqmgr-init-cli, reqmgr-init-config, reqmgr-init-core,
//               reqmgr-init-store-postgres
// ============================================================================

//! ## Overview
//! `reqmgr-init` reads its configuration from the process environment,
//! optionally layered over a dotenv file, installs the log subscriber, and
//! runs either the full initialization or a dry run. The exit status is the
//! exit code of the single terminal error, or zero on success. Argument
//! errors are configuration failures and exit with 1.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use reqmgr_init_cli::init_logging;
use reqmgr_init_cli::report::render_failure;
use reqmgr_init_cli::report::render_summary;
use reqmgr_init_cli::run_dry;
use reqmgr_init_cli::run_full;
use reqmgr_init_cli::t;
use reqmgr_init_config::BootstrapConfig;
use reqmgr_init_config::load_env_file;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::CorrelationContext;
use reqmgr_init_core::ErrorKind;
use reqmgr_init_core::InitializationSummary;
use reqmgr_init_core::LayeredEnv;
use reqmgr_init_core::MapEnv;
use reqmgr_init_core::ProcessEnv;
use reqmgr_init_store_postgres::BcryptHasher;
use reqmgr_init_store_postgres::DirectoryMigrationSource;
use reqmgr_init_store_postgres::PostgresConnector;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Bootstrap initializer for the requirements management service database.
#[derive(Parser, Debug)]
#[command(name = "reqmgr-init", version)]
struct Cli {
    /// Validate configuration and construct components without touching the database.
    #[arg(long)]
    dry_run: bool,
    /// Force debug-level logging.
    #[arg(long, short = 'v')]
    verbose: bool,
    /// Directory holding `<version>_<name>.up.sql` migration files.
    #[arg(long, value_name = "DIR", default_value = "migrations")]
    migrations_dir: PathBuf,
    /// Dotenv file read beneath the process environment.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return emit_argument_error(&err),
    };

    let mut context = CorrelationContext::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(&cli, &mut context)))
        .unwrap_or_else(|payload| Err(panic_error(payload.as_ref())));

    match outcome {
        Ok(summary) => match write_stdout_line(&render_summary(&summary)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => emit_failure(&output_error("stdout", err, &context)),
        },
        Err(error) => emit_failure(&error),
    }
}

/// Loads configuration, installs logging, and runs the selected mode.
fn execute(cli: &Cli, context: &mut CorrelationContext) -> Result<InitializationSummary, BootstrapError> {
    let file_env = match &cli.env_file {
        Some(path) => load_env_file(path).map_err(|err| {
            BootstrapError::from_opaque(err)
                .with_correlation(context.correlation_id())
                .with_context("env_file", path.display().to_string())
        })?,
        None => MapEnv::new(),
    };
    let env = Arc::new(LayeredEnv::new(ProcessEnv, file_env));
    let config = BootstrapConfig::from_env(env.as_ref());

    init_logging(config.logging.effective_level(), config.logging.effective_format(), cli.verbose)
        .map_err(|err| BootstrapError::system(err.to_string()).with_correlation(context.correlation_id()))?;

    let connector = PostgresConnector::new(
        Arc::new(DirectoryMigrationSource::new(&cli.migrations_dir)),
        Arc::new(BcryptHasher::new()),
        env,
    );
    let outcome = if cli.dry_run {
        run_dry(&config, &connector, context)
    } else {
        run_full(&config, &connector, context)
    };
    outcome.map_err(|failure| failure.error)
}

// ============================================================================
// SECTION: Failure Output
// ============================================================================

/// Reports an argument error; help and version requests succeed.
fn emit_argument_error(err: &clap::Error) -> ExitCode {
    match err.kind() {
        ClapErrorKind::DisplayHelp
        | ClapErrorKind::DisplayVersion
        | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = write_stdout_line(err.render().to_string().trim_end());
            ExitCode::SUCCESS
        }
        _ => {
            let message = t!("cli.args.invalid", error = err.render().to_string().trim_end());
            let error = BootstrapError::new(ErrorKind::Config, message);
            emit_failure(&error)
        }
    }
}

/// Writes the failure report and returns its exit code.
fn emit_failure(error: &BootstrapError) -> ExitCode {
    let _ = write_stderr_line(&render_failure(error));
    ExitCode::from(error.exit_code())
}

/// Converts a panic payload into a System-kind error.
fn panic_error(payload: &(dyn std::any::Any + Send)) -> BootstrapError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    BootstrapError::system(t!("system.panic", detail = detail))
}

/// Builds the error for a failed write to an output stream.
fn output_error(stream: &str, err: std::io::Error, context: &CorrelationContext) -> BootstrapError {
    BootstrapError::system(t!("output.write_failed", stream = stream, error = err))
        .with_correlation(context.correlation_id())
        .with_cause(err)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
