use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::DbError;
use crate::types::{FetchMode, Fields};

use super::Engine;

static STATEMENT_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";[\r\n]+").expect("statement break pattern is valid"));

/// Split a script on `;` followed by line breaks. Blank pieces are dropped and a
/// trailing `;` on the last statement is removed.
pub(crate) fn split_script(script: &str) -> Vec<&str> {
    STATEMENT_BREAK_RE
        .split(script)
        .map(|piece| piece.trim().trim_end_matches(';').trim_end())
        .filter(|piece| !piece.is_empty())
        .collect()
}

impl Engine {
    /// Run a multi-statement script in order, stopping at the first failure.
    ///
    /// With `force_engine`, `SET default_storage_engine=MYISAM` runs first. No
    /// transaction wraps the script: statements that ran before a failure stay
    /// applied. Returns the number of script statements executed.
    ///
    /// # Errors
    /// `DbError::EmptyInput` when the script holds no statements, otherwise the
    /// error of the first failing statement.
    pub async fn import(&mut self, script: &str, force_engine: bool) -> Result<usize, DbError> {
        let statements = split_script(script);
        if statements.is_empty() {
            return Err(DbError::EmptyInput("import script has no statements".to_string()));
        }
        if force_engine {
            self.query(
                "SET default_storage_engine=MYISAM",
                FetchMode::Assoc,
                &Fields::new(),
            )
            .await?;
        }

        let no_binds = Fields::new();
        for (idx, statement) in statements.iter().enumerate() {
            self.query(statement, FetchMode::Assoc, &no_binds).await?;
            info!(statement = idx + 1, total = statements.len(), "imported");
        }
        Ok(statements.len())
    }
}
