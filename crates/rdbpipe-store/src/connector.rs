//! Connection factory for SQLite document databases

#![allow(clippy::result_large_err)]

use crate::connection::SqliteConnection;
use crate::db;
use crate::errors::{invalid_setting, Result};
use rdbpipe_core::{ConnectionFactory, ConnectionSettings};
use std::time::Duration;

/// Settings key naming the database file
pub const SETTING_PATH: &str = "path";
/// Settings key for the SQLite busy timeout in milliseconds
pub const SETTING_BUSY_TIMEOUT_MS: &str = "busy_timeout_ms";

/// Connection settings understood by the SQLite backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub path: String,
    pub busy_timeout: Option<Duration>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: db::MEMORY_PATH.to_string(),
            busy_timeout: None,
        }
    }
}

impl StoreSettings {
    /// Read `path` and `busy_timeout_ms` from opaque connection settings
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown keys or ill-typed values
    pub fn from_connection_settings(settings: &ConnectionSettings) -> Result<Self> {
        let mut parsed = Self::default();

        for (key, value) in settings.iter() {
            match key.as_str() {
                SETTING_PATH => {
                    parsed.path = value
                        .as_str()
                        .ok_or_else(|| invalid_setting(key, "expected a string"))?
                        .to_string();
                }
                SETTING_BUSY_TIMEOUT_MS => {
                    let millis = value
                        .as_u64()
                        .ok_or_else(|| invalid_setting(key, "expected a non-negative integer"))?;
                    parsed.busy_timeout = Some(Duration::from_millis(millis));
                }
                _ => return Err(invalid_setting(key, "unknown key")),
            }
        }

        Ok(parsed)
    }
}

/// Opens one `SqliteConnection` per driver
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl SqliteConnector {
    pub fn new() -> Self {
        Self
    }

    /// Open and configure a connection from already-parsed settings
    pub fn open(&self, settings: &StoreSettings) -> Result<SqliteConnection> {
        let conn = db::open(&settings.path)?;
        db::configure(&conn, settings.busy_timeout)?;

        tracing::debug!(
            component = module_path!(),
            op = "connect",
            path = settings.path.as_str(),
            "sqlite connection opened"
        );

        Ok(SqliteConnection::new(conn, settings.path.clone()))
    }
}

impl ConnectionFactory for SqliteConnector {
    type Connection = SqliteConnection;

    fn connect(&self, settings: &ConnectionSettings) -> Result<SqliteConnection> {
        let settings = StoreSettings::from_connection_settings(settings)?;
        self.open(&settings)
    }
}
