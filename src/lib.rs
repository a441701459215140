//! Async MySQL access layer.
//!
//! An [`Engine`] owns a single connection and funnels every statement through one
//! classify → rewrite → bind → prepare → execute → log path:
//!
//! ```rust,no_run
//! use mysql_middleware::prelude::*;
//!
//! # async fn demo() -> Result<(), DbError> {
//! let config = EngineConfig::builder()
//!     .host("localhost")
//!     .user("app")
//!     .password("secret")
//!     .database("site")
//!     .prefix("sym_")
//!     .build()?;
//! let mut engine = Engine::mysql(config);
//!
//! let fields = Fields::new().with("name", "Alice").with("age", 30);
//! engine.insert(&fields, "tbl_users", false).await?;
//!
//! let row = engine.fetch_row(0, Some("SELECT * FROM tbl_users")).await?;
//! # let _ = row;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod rewrite;
pub mod translation;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use config::{ConnectionConfig, EngineConfig, EngineConfigBuilder};
pub use connection::{
    ConnectionManager, Connector, DriverConnection, DriverError, DriverOutcome, DriverPhase,
    DriverStatement,
};
pub use diagnostics::{
    Diagnostics, LogEntry, LogFilter, LogKind, QueryExecuted, QueryFailed, QueryObserver,
    Statistics,
};
pub use engine::{Engine, ExecutionState, FetchedRows};
pub use error::{DbError, QueryContext};
pub use query_builder::{BoundStatement, CompareOp, InsertRows, Predicate, WhereClause};
pub use results::{CustomDbRow, ExecutionResult, ResultSet};
pub use rewrite::{CacheHintDialect, classify, rewrite};
pub use types::{FetchMode, Fields, QueryType, RowValues};
