//! qgate CLI tool.
//!
//! Usage:
//! ```bash
//! qgate check [OPTIONS] [PATH]
//! qgate list-rules
//! qgate init
//! ```
//!
//! Exit codes: `0` allowed, `2` blocked, `3` invalid arguments,
//! configuration or internal error.

use anyhow::Result;
use clap::{Parser, Subcommand};
use qgate_core::ConfigError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod scope;

/// Exit code when the gate blocks.
pub const EXIT_BLOCKED: u8 = 2;

/// Exit code for argument, configuration and internal errors.
pub const EXIT_ERROR: u8 = 3;

/// Static quality gate for Python: complexity, SOLID, purity and error handling
#[derive(Parser)]
#[command(name = "qgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the quality gate
    Check(commands::check::CheckArgs),

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for gate results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here
            let code = if e.use_stderr() { EXIT_ERROR } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check(args) => commands::check::run(&args, cli.config.as_deref()),
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Prints configuration problems as diagnostics, everything else with its cause chain.
fn report_error(err: anyhow::Error) {
    match err.downcast::<ConfigError>() {
        Ok(config_err) => eprintln!("{:?}", miette::Report::new(config_err)),
        Err(other) => eprintln!("Error: {other:?}"),
    }
}
