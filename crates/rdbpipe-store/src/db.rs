//! Database connection management
//!
//! Opening, configuring and table administration for SQLite-backed
//! document tables. Every document table has the layout
//! `(id TEXT PRIMARY KEY, doc TEXT NOT NULL)`.

#![allow(clippy::result_large_err)]

use crate::errors::{execution_error, from_rusqlite, open_failed, Result};
use rdbpipe_core::errors::{RdbError, RdbErrorKind};
use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// Path value selecting a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Open a SQLite database at the given path, or in memory for `:memory:`
pub fn open(path: &str) -> Result<Connection> {
    let conn = if path == MEMORY_PATH {
        Connection::open_in_memory()
    } else {
        Connection::open(path)
    };
    conn.map_err(|e| open_failed(path, e))
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    open(MEMORY_PATH)
}

/// Configure a freshly opened connection
pub fn configure(conn: &Connection, busy_timeout: Option<Duration>) -> Result<()> {
    // journal_mode answers with a row, so it goes through pragma_update
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(from_rusqlite)?;

    if let Some(timeout) = busy_timeout {
        conn.busy_timeout(timeout).map_err(from_rusqlite)?;
    }

    Ok(())
}

/// Quote an identifier for interpolation into SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Document table names follow RethinkDB's rule: `[A-Za-z0-9_-]+`
pub fn validate_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RdbError::new(RdbErrorKind::InvalidArgument)
            .with_op("create_table")
            .with_table(name)
            .with_message(format!(
                "Table name `{}` invalid (Use A-Z, a-z, 0-9, _ and - only).",
                name
            )))
    }
}

/// List user tables, sorted by name
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .map_err(from_rusqlite)?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(from_rusqlite)?;

    Ok(names)
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(found.is_some())
}

/// Create a document table
///
/// # Errors
///
/// - `InvalidArgument`: the name is not a valid table name
/// - `Execution`: the table already exists
pub fn create_table(conn: &Connection, name: &str) -> Result<()> {
    validate_table_name(name)?;
    if table_exists(conn, name)? {
        return Err(
            execution_error("create_table", format!("Table `{}` already exists.", name))
                .with_table(name),
        );
    }

    let sql = format!(
        "CREATE TABLE {} (id TEXT PRIMARY KEY NOT NULL, doc TEXT NOT NULL)",
        quote_ident(name)
    );
    conn.execute(&sql, []).map_err(from_rusqlite)?;
    Ok(())
}

/// Drop a document table
///
/// # Errors
///
/// `Execution` when the table does not exist
pub fn drop_table(conn: &Connection, name: &str) -> Result<()> {
    if !table_exists(conn, name)? {
        return Err(crate::errors::table_missing("drop_table", name));
    }

    let sql = format!("DROP TABLE {}", quote_ident(name));
    conn.execute(&sql, []).map_err(from_rusqlite)?;
    Ok(())
}
