//! The execution engine: one connection, one statement at a time.

use std::fmt;
use std::sync::Arc;

use crate::config::{ConnectionConfig, EngineConfig, validate_prefix};
use crate::connection::{ConnectionManager, Connector};
use crate::diagnostics::{Diagnostics, QueryObserver};
use crate::error::DbError;
use crate::results::ExecutionResult;

mod fetch;
mod import;
mod run;
mod verbs;

pub use fetch::FetchedRows;

/// Progress of the statement currently (or most recently) handled by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Preparing,
    Bound,
    Executing,
    Succeeded,
    Failed,
}

/// Owns a connection and the outcome of the last statement run on it.
///
/// Every verb takes `&mut self`, so statements on one engine never interleave.
/// Use [`EnginePool`](crate::pool::EnginePool) to run statements concurrently.
pub struct Engine {
    config: EngineConfig,
    connection: ConnectionManager,
    diagnostics: Arc<Diagnostics>,
    observers: Vec<Arc<dyn QueryObserver>>,
    state: ExecutionState,
    last_result: Option<ExecutionResult>,
    last_query: Option<String>,
    last_query_hash: Option<String>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("connection", &self.connection)
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .field("last_query", &self.last_query)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with its own diagnostics, opening connections through `connector`.
    #[must_use]
    pub fn new(config: EngineConfig, connector: Arc<dyn Connector>) -> Self {
        let diagnostics = Arc::new(Diagnostics::new(config.slow_query_threshold()));
        Self::with_diagnostics(config, connector, diagnostics)
    }

    /// Engine that records into shared diagnostics.
    #[must_use]
    pub fn with_diagnostics(
        config: EngineConfig,
        connector: Arc<dyn Connector>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let connection = ConnectionManager::new(connector, config.connection.clone());
        Self {
            config,
            connection,
            diagnostics,
            observers: Vec::new(),
            state: ExecutionState::Idle,
            last_result: None,
            last_query: None,
            last_query_hash: None,
        }
    }

    /// Engine backed by the sqlx MySQL driver.
    #[cfg(feature = "mysql")]
    #[must_use]
    pub fn mysql(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(crate::mysql::MySqlConnector))
    }

    pub fn add_observer(&mut self, observer: Arc<dyn QueryObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Outcome of the last successful verb; `None` after a failure or a flush.
    #[must_use]
    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    /// AUTO_INCREMENT value generated by the last write, if any.
    #[must_use]
    pub fn insert_id(&self) -> Option<u64> {
        self.last_result.as_ref().and_then(|r| r.last_insert_id)
    }

    /// Final SQL text of the last statement sent to the driver.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    #[must_use]
    pub fn last_query_hash(&self) -> Option<&str> {
        self.last_query_hash.as_deref()
    }

    /// Forget the stored result.
    pub fn flush(&mut self) {
        self.last_result = None;
        self.state = ExecutionState::Idle;
    }

    pub fn enable_caching(&mut self) {
        self.config.caching_enabled = true;
    }

    pub fn disable_caching(&mut self) {
        self.config.caching_enabled = false;
    }

    /// Change the prefix that replaces `tbl_` in later statements.
    ///
    /// # Errors
    /// `DbError::Config` if the prefix has characters other than ASCII alphanumerics
    /// and `_`.
    pub fn set_prefix(&mut self, prefix: &str) -> Result<(), DbError> {
        validate_prefix(prefix)?;
        self.config.connection.prefix = prefix.to_string();
        self.connection.set_prefix(prefix);
        Ok(())
    }

    /// Open the connection. A no-op when already connected.
    ///
    /// # Errors
    /// `DbError::Connection` when the server cannot be reached or rejects the login.
    pub async fn connect(&mut self, config: Option<ConnectionConfig>) -> Result<(), DbError> {
        self.connection.connect(config).await
    }

    /// # Errors
    /// `DbError::Connection` if the driver fails while closing.
    pub async fn close(&mut self) -> Result<(), DbError> {
        self.flush();
        self.connection.close().await
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}
