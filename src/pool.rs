//! Pool of engines sharing one set of diagnostics.

use std::fmt;
use std::sync::Arc;

use deadpool::managed::{Manager, Metrics, Pool, RecycleResult};
use tracing::debug;

use crate::config::EngineConfig;
use crate::connection::Connector;
use crate::diagnostics::{Diagnostics, QueryObserver};
use crate::engine::Engine;
use crate::error::DbError;

/// Default number of engines a pool holds.
pub const DEFAULT_POOL_SIZE: usize = 16;

pub type EnginePool = Pool<EngineManager>;

/// Creates connected engines for an [`EnginePool`].
pub struct EngineManager {
    config: EngineConfig,
    connector: Arc<dyn Connector>,
    diagnostics: Arc<Diagnostics>,
    observers: Vec<Arc<dyn QueryObserver>>,
}

impl fmt::Debug for EngineManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineManager")
            .field("host", &self.config.connection.host)
            .field("database", &self.config.connection.database)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl EngineManager {
    #[must_use]
    pub fn new(config: EngineConfig, connector: Arc<dyn Connector>) -> Self {
        let diagnostics = Arc::new(Diagnostics::new(config.slow_query_threshold()));
        Self {
            config,
            connector,
            diagnostics,
            observers: Vec::new(),
        }
    }

    /// Observer attached to every engine the manager creates.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Diagnostics shared by all engines of the pool.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Build a pool of at most `max_size` engines.
    ///
    /// # Errors
    /// Returns `DbError::Config` if deadpool rejects the pool settings.
    pub fn into_pool(self, max_size: usize) -> Result<EnginePool, DbError> {
        Pool::builder(self)
            .max_size(max_size)
            .build()
            .map_err(|e| DbError::Config(format!("failed to build engine pool: {e}")))
    }
}

impl Manager for EngineManager {
    type Type = Engine;
    type Error = DbError;

    async fn create(&self) -> Result<Engine, DbError> {
        let mut engine = Engine::with_diagnostics(
            self.config.clone(),
            Arc::clone(&self.connector),
            Arc::clone(&self.diagnostics),
        );
        for observer in &self.observers {
            engine.add_observer(Arc::clone(observer));
        }
        engine.connect(None).await?;
        debug!("engine added to pool");
        Ok(engine)
    }

    async fn recycle(&self, engine: &mut Engine, _metrics: &Metrics) -> RecycleResult<DbError> {
        // A dropped connection is reopened on the next statement.
        engine.flush();
        Ok(())
    }
}

/// Pool of MySQL engines with the default size.
///
/// # Errors
/// Returns `DbError::Config` if the pool cannot be built.
#[cfg(feature = "mysql")]
pub fn mysql_pool(config: EngineConfig) -> Result<EnginePool, DbError> {
    EngineManager::new(config, Arc::new(crate::mysql::MySqlConnector)).into_pool(DEFAULT_POOL_SIZE)
}
