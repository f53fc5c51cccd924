//! Output formatting for CLI.

mod delimited;
mod json;

pub use delimited::CsvFormatter;
pub use json::JsonFormatter;

use std::path::Path;

use anyhow::{Context, Result};
use metrica_core::ResultTable;
use tracing::info;

use crate::{Cli, OutputFormat};

/// Formats a table in the format selected on the command line.
pub fn format_table(table: &ResultTable, cli: &Cli) -> Result<String> {
    match cli.format {
        OutputFormat::Csv => CsvFormatter::new().format_table(table),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_table(table),
    }
}

/// Writes a table to `output`, or to stdout when no file is given.
pub async fn write_table(table: &ResultTable, cli: &Cli, output: Option<&Path>) -> Result<()> {
    let rendered = format_table(table, cli)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, rendered.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = table.len(), "Output written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
