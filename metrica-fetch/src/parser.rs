//! CSV and error-body parsing.

use metrica_core::ResultTable;
use serde::Deserialize;

use crate::error::FetchError;

/// Parses a CSV body whose first record holds the column names.
///
/// Blank lines are skipped, ragged rows are kept as-is and a leading UTF-8
/// byte order mark is ignored. An empty body yields an empty table.
pub fn parse_csv(body: &str) -> Result<ResultTable, FetchError> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = reader.records();

    let columns = match records.next() {
        Some(header) => header?.iter().map(str::to_string).collect(),
        None => return Ok(ResultTable::default()),
    };

    let rows = records
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    Ok(ResultTable::new(columns, rows))
}

/// Error body returned by the reporting API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extracts the `message` field of a JSON error body, falling back to the
/// raw body when it is not JSON or has no message.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string())
}
