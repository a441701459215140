//! Named-placeholder resolution.
//!
//! Statements are written with `:name` placeholders; the MySQL wire protocol only
//! knows positional `?`. [`bind_named`] rewrites the text and orders the bound
//! values to match, skipping anything inside string literals, quoted identifiers
//! and comments.

use std::borrow::Cow;
use std::fmt;

mod parsers;
mod scanner;

pub(crate) use parsers::is_placeholder_name;
use scanner::scan_placeholders;

use crate::types::{Fields, RowValues};

/// A statement ready for a positional driver.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalStatement<'a> {
    pub sql: Cow<'a, str>,
    pub params: Vec<RowValues>,
}

/// Placeholders present in the template with no bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingBinds(pub Vec<String>);

impl fmt::Display for MissingBinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|name| format!(":{name}")).collect();
        write!(f, "no value bound for {}", names.join(", "))
    }
}

/// Names of every placeholder in `sql`, in order of appearance (repeats included).
#[must_use]
pub fn placeholder_names(sql: &str) -> Vec<&str> {
    scan_placeholders(sql).into_iter().map(|span| span.name).collect()
}

/// Replace each `:name` with `?` and collect the matching values from `binds`.
///
/// A name used twice is bound twice. Values in `binds` that the statement never
/// references are ignored. Returns a borrowed `Cow` when the text has no
/// placeholders.
///
/// # Errors
/// Returns [`MissingBinds`] listing every placeholder without a value.
pub fn bind_named<'a>(
    sql: &'a str,
    binds: &Fields,
) -> Result<PositionalStatement<'a>, MissingBinds> {
    let spans = scan_placeholders(sql);
    if spans.is_empty() {
        return Ok(PositionalStatement {
            sql: Cow::Borrowed(sql),
            params: Vec::new(),
        });
    }

    let mut out = String::with_capacity(sql.len());
    let mut params = Vec::with_capacity(spans.len());
    let mut missing: Vec<String> = Vec::new();
    let mut cursor = 0;

    for span in &spans {
        out.push_str(&sql[cursor..span.start]);
        out.push('?');
        cursor = span.end;
        match binds.get(span.name) {
            Some(value) => params.push(value.clone()),
            None => {
                if !missing.iter().any(|name| name == span.name) {
                    missing.push(span.name.to_string());
                }
            }
        }
    }
    out.push_str(&sql[cursor..]);

    if missing.is_empty() {
        Ok(PositionalStatement {
            sql: Cow::Owned(out),
            params,
        })
    } else {
        Err(MissingBinds(missing))
    }
}
