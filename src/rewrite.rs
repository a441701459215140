//! Query classification and text rewriting applied before every statement is prepared.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_TABLE_PREFIX, EngineConfig};
use crate::types::QueryType;

static WRITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(create|insert|replace|alter|delete|update|optimize|truncate|set)")
        .expect("write keyword pattern is valid")
});

static TABLE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\btbl_([A-Za-z0-9_$]+)").expect("table token pattern is valid")
});

static LEGACY_ENGINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bTYPE\s*=\s*(MyISAM|InnoDB)\b").expect("engine pattern is valid")
});

static CACHE_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*SELECT\s+SQL(_NO)?_CACHE\b").expect("cache directive pattern is valid")
});

static LEADING_SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\s*)SELECT\s+").expect("select pattern is valid"));

/// Classify a statement by its leading keyword. Advisory only: nothing prevents a
/// `Read` statement from changing data.
#[must_use]
pub fn classify(sql: &str) -> QueryType {
    if WRITE_RE.is_match(sql) {
        QueryType::Write
    } else {
        QueryType::Read
    }
}

/// How read statements are annotated with query-cache hints.
///
/// The server-side query cache was removed in MySQL 8.0 (and `SQL_CACHE` with it),
/// so hints are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CacheHintDialect {
    /// Leave read statements untouched.
    #[default]
    None,
    /// `SELECT SQL_CACHE` when caching is enabled, `SELECT SQL_NO_CACHE` otherwise.
    MySqlQueryCache,
}

impl CacheHintDialect {
    /// Returns the hinted statement, or `None` when no hint applies.
    #[must_use]
    pub fn apply(self, sql: &str, caching_enabled: bool) -> Option<String> {
        match self {
            CacheHintDialect::None => None,
            CacheHintDialect::MySqlQueryCache => {
                if CACHE_DIRECTIVE_RE.is_match(sql) || !LEADING_SELECT_RE.is_match(sql) {
                    return None;
                }
                let hint = if caching_enabled {
                    "SQL_CACHE"
                } else {
                    "SQL_NO_CACHE"
                };
                Some(
                    LEADING_SELECT_RE
                        .replace(sql, |caps: &Captures| format!("{}SELECT {hint} ", &caps[1]))
                        .into_owned(),
                )
            }
        }
    }
}

/// Replace the `tbl_` table token with `prefix`, keeping the rest of each identifier.
///
/// Identifiers that already carry `prefix` are left alone so the rewrite can be
/// applied more than once. Named placeholders such as `:tbl_id` are not table names
/// and keep their spelling.
#[must_use]
pub fn apply_table_prefix<'a>(sql: &'a str, prefix: &str) -> Cow<'a, str> {
    if prefix == DEFAULT_TABLE_PREFIX {
        return Cow::Borrowed(sql);
    }
    // Only prefixes that extend `tbl_` can produce text the pattern matches again.
    let extends_token = prefix.starts_with(DEFAULT_TABLE_PREFIX);
    TABLE_TOKEN_RE.replace_all(sql, |caps: &Captures| {
        let whole = &caps[0];
        let is_placeholder = caps
            .get(0)
            .is_some_and(|m| sql[..m.start()].ends_with(':'));
        if is_placeholder || (extends_token && whole.starts_with(prefix)) {
            whole.to_string()
        } else {
            format!("{prefix}{}", &caps[1])
        }
    })
}

/// Rewrite `sql` for execution: table prefix, legacy engine syntax for writes,
/// cache hints for reads.
#[must_use]
pub fn rewrite(sql: &str, query_type: QueryType, config: &EngineConfig) -> String {
    let prefixed = apply_table_prefix(sql, config.prefix());
    match query_type {
        QueryType::Write => LEGACY_ENGINE_RE
            .replace_all(&prefixed, "ENGINE=$1")
            .into_owned(),
        QueryType::Read => config
            .cache_hint
            .apply(&prefixed, config.caching_enabled)
            .unwrap_or_else(|| prefixed.into_owned()),
    }
}
