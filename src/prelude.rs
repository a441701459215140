//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{ConnectionConfig, EngineConfig, EngineConfigBuilder};
pub use crate::connection::{Connector, DriverConnection};
pub use crate::diagnostics::{LogFilter, QueryExecuted, QueryFailed, QueryObserver, Statistics};
pub use crate::engine::{Engine, FetchedRows};
pub use crate::error::{DbError, QueryContext};
pub use crate::pool::{EngineManager, EnginePool};
pub use crate::query_builder::{InsertRows, Predicate, WhereClause};
pub use crate::results::{CustomDbRow, ExecutionResult};
pub use crate::rewrite::CacheHintDialect;
pub use crate::types::{FetchMode, Fields, QueryType, RowValues};

#[cfg(feature = "mysql")]
pub use crate::mysql::MySqlConnector;
