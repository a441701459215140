//! Rows and outcome of the last executed statement.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;

use crate::types::{FetchMode, QueryType};

/// Outcome of one successful execution. Replaced wholesale by the next call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub rows: ResultSet,
    pub rows_affected: u64,
    /// Only set after a write that generated an AUTO_INCREMENT value.
    pub last_insert_id: Option<u64>,
    pub query_type: QueryType,
    pub fetch_mode: FetchMode,
}

impl ExecutionResult {
    #[must_use]
    pub fn row(&self, offset: usize) -> Option<&CustomDbRow> {
        self.rows.results.get(offset)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
