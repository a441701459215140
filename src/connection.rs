//! Connection lifecycle and the driver seam.
//!
//! The engine talks to a database through two object-safe traits: a [`Connector`]
//! opens a [`DriverConnection`], which runs one positional statement at a time.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::DbError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Where in the round trip a driver failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Connect,
    Prepare,
    Bind,
    Execute,
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub phase: DriverPhase,
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    #[must_use]
    pub fn new(phase: DriverPhase, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{:?} failed ({code}): {}", self.phase, self.message),
            None => write!(f, "{:?} failed: {}", self.phase, self.message),
        }
    }
}

/// A statement with `?` placeholders and its values in order.
#[derive(Debug, Clone, Copy)]
pub struct DriverStatement<'a> {
    pub sql: &'a str,
    pub params: &'a [RowValues],
    /// Read statements fetch rows; writes report affected rows and insert id.
    pub fetch: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DriverOutcome {
    pub result_set: Option<ResultSet>,
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

#[async_trait]
pub trait DriverConnection: Send {
    /// Prepare, bind and execute one statement, fetching rows when asked.
    async fn run(&mut self, statement: DriverStatement<'_>) -> Result<DriverOutcome, DriverError>;

    /// Release the handle.
    async fn close(&mut self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// Owns the single live connection of an engine.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    defaults: ConnectionConfig,
    active: Option<ConnectionConfig>,
    handle: Option<Box<dyn DriverConnection>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.defaults.host)
            .field("database", &self.defaults.database)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, defaults: ConnectionConfig) -> Self {
        Self {
            connector,
            defaults,
            active: None,
            handle: None,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Settings of the open connection, if any.
    #[must_use]
    pub fn active_config(&self) -> Option<&ConnectionConfig> {
        self.active.as_ref()
    }

    /// Open the connection unless one is already open.
    ///
    /// `supplied` is used only when it carries both host and user; otherwise the
    /// configured defaults are used. The table prefix always comes from the
    /// defaults.
    ///
    /// # Errors
    /// Returns `DbError::Connection` if the driver cannot open a handle.
    pub async fn connect(&mut self, supplied: Option<ConnectionConfig>) -> Result<(), DbError> {
        if self.is_connected() {
            return Ok(());
        }
        let mut config = match supplied {
            Some(config) if config.has_credentials() => config,
            _ => self.defaults.clone(),
        };
        config.prefix.clone_from(&self.defaults.prefix);

        let handle = self
            .connector
            .connect(&config)
            .await
            .map_err(|e| DbError::Connection {
                code: e.code,
                message: e.message,
            })?;
        info!(
            host = config.host.as_deref().unwrap_or(""),
            database = config.database.as_deref().unwrap_or(""),
            "connected"
        );
        self.handle = Some(handle);
        self.active = Some(config);
        Ok(())
    }

    /// Close and drop the handle. Closing an unopened manager is a no-op.
    ///
    /// # Errors
    /// Returns `DbError::Connection` if the driver reports a failure while closing;
    /// the handle is dropped either way.
    pub async fn close(&mut self) -> Result<(), DbError> {
        self.active = None;
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        debug!("closing connection");
        handle.close().await.map_err(|e| DbError::Connection {
            code: e.code,
            message: e.message,
        })
    }

    /// Drop the handle without a graceful close, e.g. after a timed-out round trip
    /// left the protocol state unknown.
    pub fn discard(&mut self) {
        self.active = None;
        self.handle = None;
    }

    pub(crate) fn handle_mut(&mut self) -> Result<&mut (dyn DriverConnection + 'static), DbError> {
        self.handle.as_deref_mut().ok_or_else(|| DbError::Connection {
            code: None,
            message: "not connected".to_string(),
        })
    }

    pub(crate) fn set_prefix(&mut self, prefix: &str) {
        self.defaults.prefix = prefix.to_string();
        if let Some(active) = self.active.as_mut() {
            active.prefix = prefix.to_string();
        }
    }
}
