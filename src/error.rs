use std::time::Duration;

use thiserror::Error;

use crate::connection::{DriverError, DriverPhase};
use crate::diagnostics::query_hash;

/// Snapshot of the statement that was running when an error was raised.
///
/// Captured by value so later executions on the same engine cannot change what
/// an error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub query: String,
    pub query_hash: String,
}

impl QueryContext {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let query_hash = query_hash(&query);
        Self { query, query_hash }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error ({}): {message}", .code.as_deref().unwrap_or("-"))]
    Connection {
        code: Option<String>,
        message: String,
    },

    #[error("MySQL prepare error ({}): {message} in query: {}", .code.as_deref().unwrap_or("-"), .context.query)]
    Prepare {
        context: QueryContext,
        code: Option<String>,
        message: String,
    },

    #[error("Bind error: {message} in query: {}", .context.query)]
    Bind {
        context: QueryContext,
        message: String,
    },

    #[error("MySQL error ({}): {message} in query: {}", .code.as_deref().unwrap_or("-"), .context.query)]
    Execution {
        context: QueryContext,
        code: Option<String>,
        message: String,
    },

    #[error("Timed out after {elapsed:?} in query: {}", .context.query)]
    Timeout {
        context: QueryContext,
        elapsed: Duration,
    },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl DbError {
    /// Map a driver failure onto the error kind for the phase it happened in.
    pub(crate) fn from_driver(err: DriverError, context: QueryContext) -> Self {
        let DriverError {
            phase,
            code,
            message,
        } = err;
        match phase {
            DriverPhase::Connect => DbError::Connection { code, message },
            DriverPhase::Prepare => DbError::Prepare {
                context,
                code,
                message,
            },
            DriverPhase::Bind => DbError::Bind { context, message },
            DriverPhase::Execute | DriverPhase::Fetch => DbError::Execution {
                context,
                code,
                message,
            },
        }
    }

    /// The statement that was running, when the error is tied to one.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.context().map(|context| context.query.as_str())
    }

    #[must_use]
    pub fn context(&self) -> Option<&QueryContext> {
        match self {
            DbError::Prepare { context, .. }
            | DbError::Bind { context, .. }
            | DbError::Execution { context, .. }
            | DbError::Timeout { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Native driver error code, when the driver reported one.
    #[must_use]
    pub fn database_error_code(&self) -> Option<&str> {
        match self {
            DbError::Connection { code, .. }
            | DbError::Prepare { code, .. }
            | DbError::Execution { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Driver message without the query suffix added by `Display`.
    #[must_use]
    pub fn database_error_message(&self) -> String {
        match self {
            DbError::Connection { message, .. }
            | DbError::Prepare { message, .. }
            | DbError::Bind { message, .. }
            | DbError::Execution { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_carries_query_and_code() {
        let err = DbError::from_driver(
            DriverError::new(DriverPhase::Execute, Some("1062".into()), "Duplicate entry"),
            QueryContext::new("INSERT INTO `users` ( `id`) VALUES ( ?)"),
        );

        assert!(matches!(err, DbError::Execution { .. }));
        assert_eq!(err.database_error_code(), Some("1062"));
        assert_eq!(err.database_error_message(), "Duplicate entry");
        assert_eq!(err.query(), Some("INSERT INTO `users` ( `id`) VALUES ( ?)"));
        assert_eq!(
            err.to_string(),
            "MySQL error (1062): Duplicate entry in query: INSERT INTO `users` ( `id`) VALUES ( ?)"
        );
    }

    #[test]
    fn prepare_phase_maps_to_prepare_error() {
        let err = DbError::from_driver(
            DriverError::new(DriverPhase::Prepare, None, "syntax error"),
            QueryContext::new("SELEC 1"),
        );
        assert!(matches!(err, DbError::Prepare { .. }));
        assert_eq!(err.to_string(), "MySQL prepare error (-): syntax error in query: SELEC 1");
    }
}
