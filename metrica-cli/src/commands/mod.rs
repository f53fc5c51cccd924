//! CLI command implementations.

pub mod config;
pub mod logs;
pub mod report;
pub mod token;

use std::sync::Arc;

use anyhow::{Context, Result};
use metrica_fetch::{AuthorizationFlow, FetchContextBuilder};
use metrica_store::Settings;
use tracing::debug;

use crate::Cli;

/// Loads settings and applies environment and command-line overrides.
pub async fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load_default()
        .await
        .context("failed to load settings")?
        .with_env_overrides();

    if let Some(path) = &cli.token_path {
        settings.token_path.clone_from(path);
    }
    if cli.keychain {
        settings.use_keychain = true;
    }

    settings.validate()?;
    debug!(api_url = %settings.api_url, token_path = %settings.token_path.display(), "Settings ready");
    Ok(settings)
}

/// Starts a context builder from settings, optionally with a custom flow.
pub fn context_builder(
    settings: &Settings,
    flow: Option<Arc<dyn AuthorizationFlow>>,
) -> FetchContextBuilder {
    let builder = FetchContextBuilder::from_settings(settings);
    match flow {
        Some(flow) => builder.authorization_flow(flow),
        None => builder,
    }
}
