// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Metrica CLI - AppMetrica log exports and reports from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Export one day of events as CSV
//! metrica logs --type events --app-id 1234567 \
//!     --since "2024-01-01 00:00:00" --until "2024-01-01 23:59:59" \
//!     --fields "event_name,event_timestamp,device_id"
//!
//! # Daily users for January, as JSON
//! metrica --format json report --ids 1234567 \
//!     --date1 2024-01-01 --date2 2024-01-31 \
//!     --metrics ym:ce:users --dimensions ym:ce:date
//!
//! # Authorize once and keep the token
//! metrica token login
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use metrica_fetch::FetchError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, logs, report, token};

/// Environment variable holding a token to use instead of the cache.
const ENV_TOKEN: &str = "METRICA_TOKEN";

// ============================================================================
// CLI Definition
// ============================================================================

/// Metrica CLI - AppMetrica log exports and reports.
#[derive(Parser)]
#[command(name = "metrica")]
#[command(about = "AppMetrica log export and reporting CLI")]
#[command(long_about = r#"
Metrica downloads raw logs and aggregated reports from AppMetrica.

On first use a browser window asks you to authorize access; paste the token
it shows and choose whether to keep it. Later runs reuse the saved token.

Examples:
  metrica logs --type events --app-id 1234567 \
      --since "2024-01-01 00:00:00" --until "2024-01-01 23:59:59" \
      --fields event_name,event_timestamp
  metrica report --ids 1234567 --date1 7daysAgo --date2 today \
      --metrics ym:ce:users --dimensions ym:ce:date
  metrica token login
  metrica config path
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format for tables (csv or json).
    #[arg(long, short = 'f', default_value = "csv", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Token to use instead of the cached one (also read from METRICA_TOKEN).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Token cache file.
    #[arg(long, global = true)]
    pub token_path: Option<PathBuf>,

    /// Keep the token in the OS keychain instead of a file.
    #[arg(long, global = true)]
    pub keychain: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no log output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Returns the token given on the command line or in the environment.
    pub fn explicit_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(ENV_TOKEN).ok())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download a raw log export.
    #[command(visible_alias = "l")]
    Logs(logs::LogsArgs),

    /// Download an aggregated report.
    #[command(visible_alias = "r")]
    Report(report::ReportArgs),

    /// Manage the cached token.
    Token(token::TokenArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// CSV with a header line; plain text for non-table output.
    #[default]
    Csv,
    /// JSON for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The service rejected the token.
    Unauthorized = 2,
    /// The export was not ready within the configured limits.
    Timeout = 4,
}

impl ExitCode {
    /// Picks the exit code for an error.
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FetchError>() {
            Some(e) if e.is_unauthorized() => Self::Unauthorized,
            Some(FetchError::PollExhausted { .. }) => Self::Timeout,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("metrica=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metrica=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Logs(args) => logs::run(args, &cli).await,
        Commands::Report(args) => report::run(args, &cli).await,
        Commands::Token(args) => token::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    std::process::exit(ExitCode::Success as i32);
}
