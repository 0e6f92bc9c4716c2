//! Connection manager
//!
//! A `Driver` owns at most one connection, opened on first use and reused
//! for the rest of its life. It resolves table references and runs
//! statements; it never retries and never wraps backend failures.

use crate::connection::{Connection, ConnectionFactory, ConnectionSettings};
use crate::errors::{json_type_name, PipelineError, RdbError, RdbErrorKind, Result};
use crate::statement::{Statement, Table};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lazily connected driver
pub struct Driver<F: ConnectionFactory> {
    factory: F,
    settings: ConnectionSettings,
    // Held across `connect` so concurrent first uses open a single connection.
    conn: Mutex<Option<Arc<F::Connection>>>,
}

impl<F: ConnectionFactory> Driver<F> {
    /// Create a driver; no connection is attempted
    pub fn new(factory: F, settings: ConnectionSettings) -> Self {
        Self {
            factory,
            settings,
            conn: Mutex::new(None),
        }
    }

    /// Create a driver from untyped settings
    ///
    /// # Errors
    ///
    /// Returns `RdbErrorKind::InvalidArgument` if `settings` is not a
    /// mapping. The factory is not called.
    pub fn from_value(factory: F, settings: Value) -> Result<Self> {
        Ok(Self::new(factory, ConnectionSettings::try_from_value(settings)?))
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Whether a connection has been opened
    ///
    /// # Errors
    ///
    /// `Concurrency` if the connection lock is poisoned.
    pub fn is_connected(&self) -> Result<bool> {
        Ok(self.lock()?.is_some())
    }

    /// The live connection, opened on first access
    ///
    /// A failed open leaves the driver unconnected, so the next access
    /// tries again.
    ///
    /// # Errors
    ///
    /// Whatever the factory returns, unchanged; `Concurrency` if the
    /// connection lock is poisoned.
    pub fn connection(&self) -> Result<Arc<F::Connection>> {
        let mut guard = self.lock()?;
        if let Some(conn) = guard.as_ref() {
            return Ok(Arc::clone(conn));
        }
        let conn = Arc::new(self.factory.connect(&self.settings)?);
        *guard = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Whether `name` is in the database's table list
    ///
    /// Queries every time; nothing is cached.
    ///
    /// # Errors
    ///
    /// Connection and execution failures unchanged; `Protocol` if the
    /// table list is not an array of names.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let listing = self.execute(&Statement::table_list())?;
        let tables = listing.as_array().ok_or_else(|| {
            RdbError::new(RdbErrorKind::Protocol)
                .with_op("table_exists")
                .with_message(format!(
                    "table_list returned <{}>, expected an array",
                    json_type_name(&listing)
                ))
        })?;
        Ok(tables.iter().any(|t| t.as_str() == Some(name)))
    }

    /// Resolve a table reference; never creates the table
    ///
    /// # Errors
    ///
    /// `RdbErrorKind::TableNotFound` if the table is absent, plus any
    /// error from `table_exists`.
    pub fn get_table(&self, name: &str) -> Result<Table> {
        if !self.table_exists(name)? {
            return Err(PipelineError::TableNotFound {
                table: name.to_string(),
            }
            .into());
        }
        Ok(Table::new(name))
    }

    /// Run a statement on the shared connection
    ///
    /// # Errors
    ///
    /// Connection and execution failures, unchanged.
    pub fn execute(&self, statement: &Statement) -> Result<Value> {
        let conn = self.connection()?;
        conn.run(statement)
    }

    /// Decode a JSON term and run it
    ///
    /// # Errors
    ///
    /// `RdbErrorKind::InvalidArgument` if `term` is not an executable
    /// statement, before any connection is opened. Otherwise as `execute`.
    pub fn execute_term(&self, term: &Value) -> Result<Value> {
        let statement = Statement::from_term(term)?;
        self.execute(&statement)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Arc<F::Connection>>>> {
        self.conn.lock().map_err(|_| {
            RdbError::new(RdbErrorKind::Concurrency)
                .with_op("connection")
                .with_message("connection lock poisoned")
        })
    }
}

impl<F: ConnectionFactory> std::fmt::Debug for Driver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("settings", &self.settings)
            .field("connected", &self.is_connected().map_err(|e| e.code()))
            .finish()
    }
}
