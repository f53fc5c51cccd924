//! Tabular results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named columns plus rows of string cells.
///
/// Rows keep the order in which the API returned them. Rows may be shorter or
/// longer than the column list when the source data is ragged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    /// Column names.
    pub columns: Vec<String>,
    /// Data rows.
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Creates a table.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Creates an empty table with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends the rows of `other`. Columns of `self` win; if `self` has no
    /// columns yet it takes those of `other`.
    pub fn append(&mut self, other: ResultTable) {
        if self.columns.is_empty() {
            self.columns = other.columns;
        }
        self.rows.extend(other.rows);
    }

    /// Concatenates pages row-wise, preserving page order.
    pub fn concat(pages: impl IntoIterator<Item = ResultTable>) -> Self {
        pages.into_iter().fold(Self::default(), |mut acc, page| {
            acc.append(page);
            acc
        })
    }

    /// Converts rows to JSON objects keyed by column name.
    ///
    /// Cells beyond the last named column are keyed by their position.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (idx, cell) in row.iter().enumerate() {
                    let key = self
                        .columns
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| idx.to_string());
                    record.insert(key, Value::String(cell.clone()));
                }
                Value::Object(record)
            })
            .collect()
    }
}
