use sqlx::ConnectOptions;
use sqlx::mysql::MySqlConnectOptions;

use crate::config::ConnectionConfig;

const DEFAULT_HOST: &str = "localhost";
const SESSION_CHARSET: &str = "utf8mb4";

/// Build sqlx connect options. Statement logging is left to the engine's
/// diagnostics, so sqlx's own is turned off.
#[must_use]
pub fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(config.host.as_deref().unwrap_or(DEFAULT_HOST))
        .port(config.port)
        .charset(SESSION_CHARSET);
    if let Some(user) = config.user.as_deref() {
        options = options.username(user);
    }
    if let Some(password) = config.password.as_deref() {
        options = options.password(password);
    }
    if let Some(database) = config
        .database
        .as_deref()
        .map(str::trim)
        .filter(|db| !db.is_empty())
    {
        options = options.database(database);
    }
    options.disable_statement_logging()
}
