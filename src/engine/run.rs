use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::connection::DriverStatement;
use crate::diagnostics::{QueryExecuted, QueryFailed};
use crate::error::{DbError, QueryContext};
use crate::results::{ExecutionResult, ResultSet};
use crate::rewrite::{classify, rewrite};
use crate::translation::bind_named;
use crate::types::{FetchMode, Fields, QueryType};

use super::{Engine, ExecutionState};

impl Engine {
    /// The single path every statement takes: classify, rewrite, connect, bind,
    /// execute, then log and notify. Connection failures are logged like any
    /// other failed statement.
    ///
    /// Does not touch the stored result; callers decide whether to keep it.
    pub(crate) async fn dispatch(
        &mut self,
        sql: &str,
        fetch_mode: FetchMode,
        binds: &Fields,
    ) -> Result<ExecutionResult, DbError> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(DbError::EmptyInput("empty query".to_string()));
        }
        let query_type = classify(sql);
        let final_sql = rewrite(sql, query_type, &self.config);
        let context = QueryContext::new(final_sql.clone());
        self.last_query = Some(context.query.clone());
        self.last_query_hash = Some(context.query_hash.clone());

        if let Err(err) = self.connection.connect(None).await {
            return Err(self.fail(err, Duration::ZERO));
        }

        self.state = ExecutionState::Preparing;
        let started = Instant::now();
        let positional = match bind_named(&final_sql, binds) {
            Ok(positional) => positional,
            Err(missing) => {
                let err = DbError::Bind {
                    context,
                    message: missing.to_string(),
                };
                return Err(self.fail(err, started.elapsed()));
            }
        };
        self.state = ExecutionState::Bound;
        trace!(
            sql = %positional.sql,
            params = positional.params.len(),
            "statement bound"
        );

        let statement = DriverStatement {
            sql: &positional.sql,
            params: &positional.params,
            fetch: query_type == QueryType::Read,
        };
        self.state = ExecutionState::Executing;
        let timeout = self.config.statement_timeout();
        let handle = match self.connection.handle_mut() {
            Ok(handle) => handle,
            Err(err) => return Err(self.fail(err, started.elapsed())),
        };
        let outcome = match timeout {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, handle.run(statement)).await;
                if let Ok(outcome) = timed {
                    outcome
                } else {
                    // The server may still be working on the statement; the
                    // connection cannot be reused.
                    self.connection.discard();
                    let err = DbError::Timeout {
                        context,
                        elapsed: started.elapsed(),
                    };
                    return Err(self.fail(err, started.elapsed()));
                }
            }
            None => handle.run(statement).await,
        };
        let duration = started.elapsed();

        match outcome {
            Ok(outcome) => {
                let result = ExecutionResult {
                    rows: outcome.result_set.unwrap_or_default(),
                    rows_affected: outcome.rows_affected,
                    last_insert_id: match query_type {
                        QueryType::Write => outcome.last_insert_id.filter(|id| *id != 0),
                        QueryType::Read => None,
                    },
                    query_type,
                    fetch_mode,
                };
                self.succeed(&context, duration);
                Ok(result)
            }
            Err(driver_err) => Err(self.fail(DbError::from_driver(driver_err, context), duration)),
        }
    }

    fn succeed(&mut self, context: &QueryContext, duration: Duration) {
        self.state = ExecutionState::Succeeded;
        self.diagnostics
            .record_success(&context.query, &context.query_hash, duration);
        if self.observers.is_empty() {
            return;
        }
        let event = QueryExecuted {
            query: context.query.clone(),
            query_hash: context.query_hash.clone(),
            duration,
        };
        for observer in &self.observers {
            if catch_unwind(AssertUnwindSafe(|| observer.on_query_executed(&event))).is_err() {
                warn!(query_hash = %event.query_hash, "query observer panicked");
            }
        }
    }

    /// Record a failed statement and hand the error back unchanged.
    fn fail(&mut self, err: DbError, duration: Duration) -> DbError {
        self.state = ExecutionState::Failed;
        let (query, query_hash) = match err.context() {
            Some(context) => (context.query.clone(), context.query_hash.clone()),
            None => (
                self.last_query.clone().unwrap_or_default(),
                self.last_query_hash.clone().unwrap_or_default(),
            ),
        };
        let code = err.database_error_code().map(str::to_string);
        let message = err.database_error_message();
        self.diagnostics
            .record_failure(&query, &query_hash, duration, code.as_deref(), &message);

        let event = QueryFailed {
            query,
            query_hash,
            code,
            message,
        };
        for observer in &self.observers {
            if catch_unwind(AssertUnwindSafe(|| observer.on_query_error(&event))).is_err() {
                warn!(query_hash = %event.query_hash, "query observer panicked");
            }
        }
        err
    }

    /// Run a statement for its rows without replacing the stored result.
    pub(crate) async fn probe(&mut self, sql: &str, binds: &Fields) -> Result<ResultSet, DbError> {
        self.dispatch(sql, FetchMode::Assoc, binds)
            .await
            .map(|result| result.rows)
    }
}
