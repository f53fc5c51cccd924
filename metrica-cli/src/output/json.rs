//! JSON output formatting.

use anyhow::Result;
use metrica_core::ResultTable;
use serde::Serialize;

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a table as an array of objects keyed by column name, one
    /// trailing newline included.
    pub fn format_table(&self, table: &ResultTable) -> Result<String> {
        let mut json = self.format(&table.to_records())?;
        json.push('\n');
        Ok(json)
    }
}
