//! CSV output formatting.

use anyhow::Result;
use metrica_core::ResultTable;

/// Writes tables as CSV with a header line.
#[derive(Debug, Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    /// Creates a new CSV formatter.
    pub fn new() -> Self {
        Self
    }

    /// Formats a table. A table without columns renders as nothing.
    pub fn format_table(&self, table: &ResultTable) -> Result<String> {
        if table.columns.is_empty() && table.rows.is_empty() {
            return Ok(String::new());
        }

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
