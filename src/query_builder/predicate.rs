use crate::error::DbError;
use crate::types::{Fields, RowValues};

use super::{check_placeholder, quote_ident};

/// WHERE argument for `update` and `delete`.
///
/// `Raw` is inserted verbatim: the caller is responsible for any literal it
/// embeds. Prefer `Predicate`, whose values are bound.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Raw(String),
    Predicate(Predicate),
}

impl From<&str> for WhereClause {
    fn from(raw: &str) -> Self {
        WhereClause::Raw(raw.to_string())
    }
}

impl From<String> for WhereClause {
    fn from(raw: String) -> Self {
        WhereClause::Raw(raw)
    }
}

impl From<Predicate> for WhereClause {
    fn from(predicate: Predicate) -> Self {
        WhereClause::Predicate(predicate)
    }
}

impl WhereClause {
    /// Render to SQL text plus the binds the text references.
    ///
    /// # Errors
    /// `DbError::EmptyInput` for a blank raw clause or a predicate with no terms.
    pub fn render(&self) -> Result<(String, Fields), DbError> {
        match self {
            WhereClause::Raw(raw) if raw.trim().is_empty() => {
                Err(DbError::EmptyInput("empty WHERE clause".to_string()))
            }
            WhereClause::Raw(raw) => Ok((raw.trim().to_string(), Fields::new())),
            WhereClause::Predicate(predicate) => predicate.render(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::IsNull => "IS NULL",
            CompareOp::IsNotNull => "IS NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Term {
    column: String,
    op: CompareOp,
    value: Option<RowValues>,
}

/// Column comparisons joined with `AND`, rendered with bound values.
///
/// ```rust
/// use mysql_middleware::prelude::*;
///
/// let (sql, binds) = Predicate::new().eq("id", 7).is_null("deleted_at").render().unwrap();
/// assert_eq!(sql, "`id` = :w0_id AND `deleted_at` IS NULL");
/// assert_eq!(binds.get("w0_id"), Some(&RowValues::Int(7)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn compare(
        mut self,
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<RowValues>,
    ) -> Self {
        let value = match op {
            CompareOp::IsNull | CompareOp::IsNotNull => None,
            _ => Some(value.into()),
        };
        self.terms.push(Term {
            column: column.into(),
            op,
            value,
        });
        self
    }

    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.compare(column, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.compare(column, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.compare(column, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn le(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.compare(column, CompareOp::Le, value)
    }

    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.compare(column, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn ge(self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.compare(column, CompareOp::Ge, value)
    }

    #[must_use]
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.compare(column, CompareOp::IsNull, RowValues::Null)
    }

    #[must_use]
    pub fn is_not_null(self, column: impl Into<String>) -> Self {
        self.compare(column, CompareOp::IsNotNull, RowValues::Null)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as `` `col` op :w{n}_{col} `` terms joined with `AND`.
    ///
    /// # Errors
    /// `DbError::EmptyInput` with no terms, `DbError::InvalidIdentifier` for a column
    /// that cannot be used in a placeholder name.
    pub fn render(&self) -> Result<(String, Fields), DbError> {
        if self.terms.is_empty() {
            return Err(DbError::EmptyInput("predicate has no terms".to_string()));
        }
        let mut binds = Fields::new();
        let mut parts = Vec::with_capacity(self.terms.len());
        for (idx, term) in self.terms.iter().enumerate() {
            let column = quote_ident(&term.column);
            match &term.value {
                Some(value) => {
                    let name = format!("w{idx}_{}", term.column);
                    check_placeholder(&name)?;
                    parts.push(format!("{column} {} :{name}", term.op.sql()));
                    binds.set(name, value.clone());
                }
                None => parts.push(format!("{column} {}", term.op.sql())),
            }
        }
        Ok((parts.join(" AND "), binds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bound_terms() {
        let (sql, binds) = Predicate::new()
            .eq("id", 3)
            .ge("age", 18)
            .is_not_null("email")
            .render()
            .unwrap();
        assert_eq!(sql, "`id` = :w0_id AND `age` >= :w1_age AND `email` IS NOT NULL");
        assert_eq!(binds.len(), 2);
        assert_eq!(binds.get("w1_age"), Some(&RowValues::Int(18)));
    }

    #[test]
    fn same_column_twice_gets_two_names() {
        let (sql, binds) = Predicate::new().gt("n", 1).lt("n", 9).render().unwrap();
        assert_eq!(sql, "`n` > :w0_n AND `n` < :w1_n");
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn empty_clauses_are_rejected() {
        assert!(matches!(Predicate::new().render(), Err(DbError::EmptyInput(_))));
        assert!(matches!(
            WhereClause::from("  ").render(),
            Err(DbError::EmptyInput(_))
        ));
    }

    #[test]
    fn raw_clause_passes_through() {
        let (sql, binds) = WhereClause::from("`id` = 4").render().unwrap();
        assert_eq!(sql, "`id` = 4");
        assert!(binds.is_empty());
    }
}
