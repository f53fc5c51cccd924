//! Report command - download an aggregated report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use metrica_core::{Accuracy, ReportQuery};
use metrica_fetch::ReportClient;
use tracing::info;

use super::{context_builder, load_settings};
use crate::Cli;
use crate::output::write_table;

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Application ids, comma-separated.
    #[arg(long, required = true, value_delimiter = ',')]
    pub ids: Vec<u64>,

    /// Range start (YYYY-MM-DD, today, 7daysAgo, ...).
    #[arg(long)]
    pub date1: String,

    /// Range end.
    #[arg(long)]
    pub date2: String,

    /// Comma-separated metrics.
    #[arg(long)]
    pub metrics: String,

    /// Comma-separated dimensions.
    #[arg(long, default_value = "")]
    pub dimensions: String,

    /// Filter expression.
    #[arg(long)]
    pub filters: Option<String>,

    /// Time grouping (day, week, month, ...).
    #[arg(long)]
    pub group: Option<String>,

    /// Sampling accuracy (low, medium, high, full).
    #[arg(long, default_value = "full")]
    pub accuracy: Accuracy,

    /// Include rows whose dimensions are undefined.
    #[arg(long)]
    pub include_undefined: bool,

    /// Language of dimension values.
    #[arg(long)]
    pub lang: Option<String>,

    /// Rows per page.
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Write the table to a file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ReportArgs {
    /// Builds the report query.
    pub fn query(&self) -> ReportQuery {
        let mut builder = ReportQuery::builder()
            .ids(self.ids.iter().copied())
            .date_range(self.date1.clone(), self.date2.clone())
            .metrics(self.metrics.clone())
            .dimensions(self.dimensions.clone())
            .accuracy(self.accuracy);

        if let Some(filters) = &self.filters {
            builder = builder.filters(filters.clone());
        }
        if let Some(group) = &self.group {
            builder = builder.group(group.clone());
        }
        if self.include_undefined {
            builder = builder.include_undefined(true);
        }
        if let Some(lang) = &self.lang {
            builder = builder.lang(lang.clone());
        }

        builder.build()
    }
}

/// Runs the report command.
pub async fn run(args: &ReportArgs, cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await?;
    let query = args.query();

    let mut builder = context_builder(&settings, None);
    if let Some(size) = args.page_size {
        builder = builder.page_size(size);
    }
    let client = ReportClient::new(Arc::new(builder.build()?));

    info!(ids = ?query.ids, date1 = %query.date1, date2 = %query.date2, "Requesting report");

    let token = cli.explicit_token();
    let table = client.fetch_report(&query, token.as_deref()).await?;

    write_table(&table, cli, args.output.as_deref()).await
}
