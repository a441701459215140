// MySQL backend built on sqlx.
//
// - config: connect options from a `ConnectionConfig`
// - params: binding `RowValues` onto sqlx queries
// - query: decoding rows into a `ResultSet`
// - executor: the `DriverConnection` implementation and error mapping

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

use async_trait::async_trait;
use sqlx::Connection;
use sqlx::mysql::MySqlConnection;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connection::{Connector, DriverConnection, DriverError, DriverPhase};

pub use executor::MySqlDriverConnection;
pub use query::build_result_set;

/// Opens one `MySqlConnection` per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, DriverError> {
        let options = config::connect_options(config);
        debug!(port = config.port, "opening mysql connection");
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| executor::driver_error(DriverPhase::Connect, e))?;
        Ok(Box::new(MySqlDriverConnection::new(conn)))
    }
}
