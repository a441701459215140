use crate::error::DbError;
use crate::query_builder::{
    BoundStatement, InsertRows, WhereClause, build_bulk_insert, build_delete, build_insert,
    build_update, quote_ident,
};
use crate::results::ExecutionResult;
use crate::rewrite::apply_table_prefix;
use crate::types::{FetchMode, Fields};

use super::Engine;

impl Engine {
    /// Run a statement with `:name` placeholders bound from `binds`.
    ///
    /// The previous result is dropped first, so after an error
    /// [`last_result`](Engine::last_result) is `None`.
    ///
    /// # Errors
    /// `DbError::EmptyInput` for blank SQL, `DbError::Bind` when a placeholder has
    /// no value, and the driver's `Connection`/`Prepare`/`Execution`/`Timeout` errors.
    pub async fn query(
        &mut self,
        sql: &str,
        fetch_mode: FetchMode,
        binds: &Fields,
    ) -> Result<&ExecutionResult, DbError> {
        self.flush();
        let result = self.dispatch(sql, fetch_mode, binds).await?;
        let stored = self.last_result.insert(result);
        Ok(&*stored)
    }

    async fn run_bound(&mut self, statement: BoundStatement) -> Result<&ExecutionResult, DbError> {
        self.query(&statement.sql, FetchMode::Assoc, &statement.params)
            .await
    }

    /// Insert one row. With `update_on_duplicate`, existing rows with the same key
    /// are updated to the supplied values.
    ///
    /// # Errors
    /// `DbError::EmptyInput` for empty `fields`, plus anything [`Engine::query`] returns.
    pub async fn insert(
        &mut self,
        fields: &Fields,
        table: &str,
        update_on_duplicate: bool,
    ) -> Result<&ExecutionResult, DbError> {
        let statement = build_insert(table, fields, update_on_duplicate)?;
        self.run_bound(statement).await
    }

    /// Insert many rows in one statement. Rows whose columns differ from the first
    /// row's are skipped.
    ///
    /// # Errors
    /// `DbError::EmptyInput` when no usable rows remain, plus anything
    /// [`Engine::query`] returns.
    pub async fn insert_multiple(
        &mut self,
        rows: &[Fields],
        table: &str,
    ) -> Result<&ExecutionResult, DbError> {
        let statement = build_bulk_insert(table, rows)?;
        self.run_bound(statement).await
    }

    /// Insert a single row or a batch, whichever `rows` holds.
    ///
    /// `update_on_duplicate` applies to single rows only.
    ///
    /// # Errors
    /// See [`Engine::insert`] and [`Engine::insert_multiple`].
    pub async fn insert_rows(
        &mut self,
        rows: impl Into<InsertRows>,
        table: &str,
        update_on_duplicate: bool,
    ) -> Result<&ExecutionResult, DbError> {
        match rows.into() {
            InsertRows::Single(fields) => self.insert(&fields, table, update_on_duplicate).await,
            InsertRows::Multiple(rows) => self.insert_multiple(&rows, table).await,
        }
    }

    /// # Errors
    /// `DbError::EmptyInput` for empty `fields` or an empty WHERE clause, plus
    /// anything [`Engine::query`] returns.
    pub async fn update(
        &mut self,
        fields: &Fields,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<&ExecutionResult, DbError> {
        let statement = build_update(table, fields, where_clause)?;
        self.run_bound(statement).await
    }

    /// # Errors
    /// `DbError::EmptyInput` for an empty WHERE clause, plus anything
    /// [`Engine::query`] returns.
    pub async fn delete(
        &mut self,
        table: &str,
        where_clause: &WhereClause,
    ) -> Result<&ExecutionResult, DbError> {
        let statement = build_delete(table, where_clause)?;
        self.run_bound(statement).await
    }

    /// Switch the default database of the connection.
    ///
    /// # Errors
    /// `DbError::InvalidIdentifier` for names with characters other than ASCII
    /// alphanumerics, `_` and `$`.
    pub async fn select_database(&mut self, database: &str) -> Result<(), DbError> {
        check_identifier(database)?;
        let sql = format!("USE {}", quote_ident(database));
        self.query(&sql, FetchMode::Assoc, &Fields::new()).await?;
        Ok(())
    }

    /// `SET NAMES` for the connection.
    ///
    /// # Errors
    /// `DbError::InvalidIdentifier` for an unusable charset name.
    pub async fn set_character_encoding(&mut self, charset: &str) -> Result<(), DbError> {
        check_identifier(charset)?;
        let sql = format!("SET NAMES '{charset}'");
        self.query(&sql, FetchMode::Assoc, &Fields::new()).await?;
        Ok(())
    }

    /// Set the connection, database and server character sets, then the client
    /// and results sets through `SET CHARACTER SET`.
    ///
    /// # Errors
    /// `DbError::InvalidIdentifier` for an unusable charset name.
    pub async fn set_character_set(&mut self, charset: &str) -> Result<(), DbError> {
        check_identifier(charset)?;
        let sql = format!(
            "SET character_set_connection = '{charset}', character_set_database = '{charset}', character_set_server = '{charset}'"
        );
        self.query(&sql, FetchMode::Assoc, &Fields::new()).await?;
        self.query(
            &format!("SET CHARACTER SET '{charset}'"),
            FetchMode::Assoc,
            &Fields::new(),
        )
        .await?;
        Ok(())
    }

    /// Whether `table` has a column named exactly `field` in the current database.
    ///
    /// The table prefix is applied to `table` as it is to statement text. A missing
    /// table reports `false`. The stored result is left untouched.
    ///
    /// # Errors
    /// Anything the `information_schema` lookup raises.
    pub async fn table_contains_field(&mut self, table: &str, field: &str) -> Result<bool, DbError> {
        let table = apply_table_prefix(table.trim_matches('`'), self.config.prefix()).into_owned();
        let binds = Fields::new().with("table", table).with("field", field);
        let rows = self
            .probe(
                "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = :table AND COLUMN_NAME = :field \
                 LIMIT 1",
                &binds,
            )
            .await?;
        Ok(!rows.is_empty())
    }
}

/// Names that are spliced into SQL because MySQL cannot bind them.
fn check_identifier(name: &str) -> Result<(), DbError> {
    if !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(format!(
            "{name:?} is not a plain identifier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_restricted() {
        assert!(check_identifier("site_db").is_ok());
        assert!(check_identifier("utf8mb4").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("x; DROP TABLE t").is_err());
        assert!(check_identifier("a`b").is_err());
    }
}
