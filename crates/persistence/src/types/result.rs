//! Query results and the response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows returned by a backend, cells already converted to JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Result column names, in select order.
    pub columns: Vec<String>,
    /// Rows, each with one cell per entry in `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Creates a result set.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The response body the grid expects.
///
/// `records_filtered` equals `records_total` when no search is active. The
/// two counts and `data` come from separate statements, so a concurrent write
/// can make them disagree slightly; the grid tolerates that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// Draw counter echoed from the request.
    pub draw: i64,
    /// Row count before filtering.
    pub records_total: u64,
    /// Row count after filtering, before paging.
    pub records_filtered: u64,
    /// The page of rows, cells in requested column order.
    pub data: Vec<Vec<Value>>,
}
