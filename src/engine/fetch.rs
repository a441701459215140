use crate::error::DbError;
use crate::results::{CustomDbRow, ExecutionResult};
use crate::types::{FetchMode, Fields, RowValues};

use super::Engine;

/// Rows returned by [`Engine::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRows {
    List(Vec<CustomDbRow>),
    /// Rows keyed by the display value of one column, in first-seen key order.
    /// When two rows share a key the later row replaces the earlier one.
    Indexed(Vec<(String, CustomDbRow)>),
}

impl FetchedRows {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            FetchedRows::List(rows) => rows.len(),
            FetchedRows::Indexed(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row stored under `key`. Always `None` for a `List`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CustomDbRow> {
        match self {
            FetchedRows::List(_) => None,
            FetchedRows::Indexed(rows) => rows.iter().find(|(k, _)| k == key).map(|(_, row)| row),
        }
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<CustomDbRow> {
        match self {
            FetchedRows::List(rows) => rows,
            FetchedRows::Indexed(rows) => rows.into_iter().map(|(_, row)| row).collect(),
        }
    }
}

fn index_rows(result: &ExecutionResult, column: &str) -> Vec<(String, CustomDbRow)> {
    let mut indexed: Vec<(String, CustomDbRow)> = Vec::with_capacity(result.row_count());
    for row in &result.rows.results {
        let key = row
            .lookup(column, result.fetch_mode)
            .map(RowValues::to_key_string)
            .unwrap_or_default();
        match indexed.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = row.clone(),
            None => indexed.push((key, row.clone())),
        }
    }
    indexed
}

impl Engine {
    /// Run `query` (when given) and borrow the stored result.
    async fn stored_result(
        &mut self,
        query: Option<&str>,
    ) -> Result<Option<&ExecutionResult>, DbError> {
        if let Some(sql) = query {
            self.query(sql, FetchMode::Assoc, &Fields::new()).await?;
        }
        Ok(self.last_result.as_ref())
    }

    /// All rows of the stored result, or of `query` when one is given.
    ///
    /// With `index_column`, rows are keyed by that column's value. The rows come
    /// back as a plain list when the first row has no such column.
    ///
    /// # Errors
    /// Whatever running `query` returns.
    pub async fn fetch(
        &mut self,
        query: Option<&str>,
        index_column: Option<&str>,
    ) -> Result<FetchedRows, DbError> {
        let Some(result) = self.stored_result(query).await? else {
            return Ok(FetchedRows::List(Vec::new()));
        };
        let indexable = index_column.filter(|column| {
            result
                .row(0)
                .is_some_and(|row| row.lookup(column, result.fetch_mode).is_some())
        });
        Ok(match indexable {
            Some(column) => FetchedRows::Indexed(index_rows(result, column)),
            None => FetchedRows::List(result.rows.results.clone()),
        })
    }

    /// Row at `offset`, or `None` past the end.
    ///
    /// # Errors
    /// Whatever running `query` returns.
    pub async fn fetch_row(
        &mut self,
        offset: usize,
        query: Option<&str>,
    ) -> Result<Option<CustomDbRow>, DbError> {
        Ok(self
            .stored_result(query)
            .await?
            .and_then(|result| result.row(offset))
            .cloned())
    }

    /// Values of one column across all rows. Rows without the column are skipped.
    ///
    /// # Errors
    /// Whatever running `query` returns.
    pub async fn fetch_col(
        &mut self,
        column: &str,
        query: Option<&str>,
    ) -> Result<Vec<RowValues>, DbError> {
        let Some(result) = self.stored_result(query).await? else {
            return Ok(Vec::new());
        };
        Ok(result
            .rows
            .results
            .iter()
            .filter_map(|row| row.lookup(column, result.fetch_mode).cloned())
            .collect())
    }

    /// A single value: `column` of the row at `offset`.
    ///
    /// # Errors
    /// Whatever running `query` returns.
    pub async fn fetch_var(
        &mut self,
        column: &str,
        offset: usize,
        query: Option<&str>,
    ) -> Result<Option<RowValues>, DbError> {
        Ok(self.stored_result(query).await?.and_then(|result| {
            result
                .row(offset)
                .and_then(|row| row.lookup(column, result.fetch_mode))
                .cloned()
        }))
    }

    /// The stored rows rendered as JSON objects in the stored fetch mode.
    #[must_use]
    pub fn fetch_json(&self) -> Vec<serde_json::Value> {
        self.last_result
            .as_ref()
            .map(|result| {
                result
                    .rows
                    .results
                    .iter()
                    .map(|row| row.to_json(result.fetch_mode))
                    .collect()
            })
            .unwrap_or_default()
    }
}
