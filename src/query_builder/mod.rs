//! Statement construction from `{column: value}` mappings.
//!
//! Builders emit SQL with `:name` placeholders plus the bind map for them. Column
//! and table names are backtick-quoted; values are never interpolated.

use crate::error::{DbError, QueryContext};
use crate::translation::{self, is_placeholder_name};
use crate::types::Fields;

mod dml;
mod insert;
mod predicate;

pub use dml::{build_delete, build_update};
pub use insert::{build_bulk_insert, build_insert};
pub use predicate::{CompareOp, Predicate, WhereClause};

/// SQL template with named placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Fields,
}

impl BoundStatement {
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Fields) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Placeholder names in template order.
    #[must_use]
    pub fn placeholder_names(&self) -> Vec<&str> {
        translation::placeholder_names(&self.sql)
    }

    /// Check that every placeholder in the template has a bound value.
    ///
    /// # Errors
    /// Returns `DbError::Bind` naming the unbound placeholders.
    pub fn validate(&self) -> Result<(), DbError> {
        translation::bind_named(&self.sql, &self.params)
            .map(|_| ())
            .map_err(|missing| DbError::Bind {
                context: QueryContext::new(self.sql.clone()),
                message: missing.to_string(),
            })
    }
}

/// Input accepted by [`Engine::insert_rows`](crate::Engine::insert_rows).
#[derive(Debug, Clone, PartialEq)]
pub enum InsertRows {
    Single(Fields),
    Multiple(Vec<Fields>),
}

impl From<Fields> for InsertRows {
    fn from(fields: Fields) -> Self {
        InsertRows::Single(fields)
    }
}

impl From<Vec<Fields>> for InsertRows {
    fn from(rows: Vec<Fields>) -> Self {
        InsertRows::Multiple(rows)
    }
}

/// Backtick-quote an identifier, doubling embedded backticks.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub(crate) fn check_placeholder(name: &str) -> Result<(), DbError> {
    if is_placeholder_name(name) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(format!(
            "{name:?} cannot be used as a bind parameter name"
        )))
    }
}

/// Column names double as placeholder names, so they must be plain identifiers.
pub(crate) fn check_columns(fields: &Fields) -> Result<(), DbError> {
    fields.keys().try_for_each(check_placeholder)
}

pub(crate) fn column_list(fields: &Fields) -> String {
    fields
        .keys()
        .map(|key| format!(" {}", quote_ident(key)))
        .collect::<Vec<_>>()
        .join(",")
}
