//! Domain models for Metrica.
//!
//! ## Submodules
//!
//! - [`logs`] - Log export request types
//! - [`report`] - Reporting query types
//! - [`table`] - Tabular results

mod logs;
mod report;
mod table;

pub use logs::{DateDimension, LogExportRequest, LogResource};
pub use report::{Accuracy, ReportQuery, ReportQueryBuilder};
pub use table::ResultTable;

/// Removes every whitespace character (spaces, tabs, newlines) from `value`.
///
/// Field, metric and dimension lists are often written across several lines
/// in calling code; the API rejects any whitespace inside them.
pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalises a report language code (`"EN"` -> `"en"`).
pub fn normalize_lang(lang: &str) -> String {
    lang.trim().to_lowercase()
}
