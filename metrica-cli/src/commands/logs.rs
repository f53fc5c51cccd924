//! Logs command - download a raw log export.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use metrica_core::{DateDimension, LogExportRequest, LogResource};
use metrica_fetch::{LogExportClient, PollPolicy};
use metrica_store::Settings;
use tracing::info;

use super::{context_builder, load_settings};
use crate::Cli;
use crate::output::write_table;

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    /// Resource to export (events, installations, crashes, ...).
    #[arg(long = "type", short = 't')]
    pub resource: LogResource,

    /// Application id.
    #[arg(long)]
    pub app_id: u64,

    /// Range start, e.g. "2024-01-01 00:00:00".
    #[arg(long)]
    pub since: String,

    /// Range end, e.g. "2024-01-31 23:59:59".
    #[arg(long)]
    pub until: String,

    /// Comma-separated fields to export.
    #[arg(long)]
    pub fields: String,

    /// Timestamp the range applies to (default or receive).
    #[arg(long, default_value = "default")]
    pub date_dimension: DateDimension,

    /// Seconds between status checks while the export is prepared.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Give up after this many requests.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Give up after waiting this many seconds in total.
    #[arg(long)]
    pub max_wait: Option<u64>,

    /// Write the table to a file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl LogsArgs {
    /// Builds the export request.
    pub fn request(&self) -> LogExportRequest {
        LogExportRequest::new(
            self.resource,
            self.app_id,
            self.since.clone(),
            self.until.clone(),
            self.fields.clone(),
        )
        .with_date_dimension(self.date_dimension)
    }

    /// Combines the configured poll policy with command-line limits.
    pub fn poll_policy(&self, settings: &Settings) -> PollPolicy {
        let interval = self
            .interval
            .map_or_else(|| settings.poll_interval(), Duration::from_secs);

        let mut policy = PollPolicy::new(interval);
        if let Some(attempts) = self.max_attempts.or(settings.max_poll_attempts) {
            policy = policy.with_max_attempts(attempts);
        }
        if let Some(secs) = self.max_wait.or(settings.max_poll_wait_secs) {
            policy = policy.with_max_wait(Duration::from_secs(secs));
        }
        policy
    }
}

/// Runs the logs command.
pub async fn run(args: &LogsArgs, cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await?;
    let request = args.request();

    let ctx = context_builder(&settings, None)
        .poll_policy(args.poll_policy(&settings))
        .build()?;
    let client = LogExportClient::new(Arc::new(ctx));

    info!(resource = %request.resource, application_id = request.application_id, "Requesting export");

    let token = cli.explicit_token();
    let table = client.fetch_logs(&request, token.as_deref()).await?;

    write_table(&table, cli, args.output.as_deref()).await
}
