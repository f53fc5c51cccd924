//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use metrica_store::{Settings, default_config_dir, default_settings_path};
use tracing::info;

use super::load_settings;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a settings file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(*force).await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await?;

    match cli.format {
        OutputFormat::Csv => {
            println!("Metrica Configuration");
            println!("{}", "─".repeat(40));
            println!();
            for line in describe(&settings) {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

/// Human-readable lines for `config show`.
fn describe(settings: &Settings) -> Vec<String> {
    let limit = |v: Option<String>| v.unwrap_or_else(|| "none".to_string());

    vec![
        format!("API URL:          {}", settings.api_url),
        format!("OAuth URL:        {}", settings.oauth_url),
        format!("Client id:        {}", settings.client_id),
        format!("Token path:       {}", settings.token_path.display()),
        format!(
            "Token backend:    {}",
            if settings.use_keychain { "keychain" } else { "file" }
        ),
        format!("Poll interval:    {}s", settings.poll_interval_secs),
        format!(
            "Max attempts:     {}",
            limit(settings.max_poll_attempts.map(|n| n.to_string()))
        ),
        format!(
            "Max wait:         {}",
            limit(settings.max_poll_wait_secs.map(|n| format!("{n}s")))
        ),
        format!("Page size:        {}", settings.page_size),
        format!("Connect timeout:  {}s", settings.connect_timeout_secs),
        format!(
            "Request timeout:  {}",
            limit(settings.request_timeout_secs.map(|n| format!("{n}s")))
        ),
    ]
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();

    match cli.format {
        OutputFormat::Csv => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config(force: bool) -> Result<()> {
    let path = default_settings_path();

    if path.exists() && !force {
        println!("Settings already exist at {} (use --force to overwrite)", path.display());
        return Ok(());
    }

    Settings::default().save_to(&path).await?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
