//! Error handling for rdbpipe-store
//!
//! Wraps rdbpipe-core RdbError with store-specific helpers

use rdbpipe_core::errors::{RdbError, RdbErrorKind};

/// Result type alias using RdbError
pub type Result<T> = std::result::Result<T, RdbError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> RdbError {
    RdbError::new(RdbErrorKind::Execution)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an execution error for a failed backend operation
pub fn execution_error(op: &str, message: impl Into<String>) -> RdbError {
    RdbError::new(RdbErrorKind::Execution)
        .with_op(op.to_string())
        .with_message(message)
}

/// Create a connection error for a database that could not be opened
pub fn open_failed(path: &str, err: rusqlite::Error) -> RdbError {
    RdbError::new(RdbErrorKind::Connection)
        .with_op("connect")
        .with_message(format!("Could not open {}: {}", path, err))
}

/// Create an error for a settings key the store does not understand
pub fn invalid_setting(key: &str, reason: &str) -> RdbError {
    RdbError::new(RdbErrorKind::InvalidArgument)
        .with_op("connect")
        .with_message(format!("Invalid connection setting '{}': {}", key, reason))
}

/// Create an error for a statement against a table that does not exist
pub fn table_missing(op: &str, table: &str) -> RdbError {
    execution_error(op, format!("Table `{}` does not exist.", table)).with_table(table)
}

/// Create an error for a stored document that is not valid JSON
pub fn corrupt_document(table: &str, err: serde_json::Error) -> RdbError {
    RdbError::new(RdbErrorKind::Serialization)
        .with_op("read_document")
        .with_table(table)
        .with_message(format!("Stored document is not valid JSON: {}", err))
}

/// Create an error for a poisoned connection lock
pub fn lock_poisoned() -> RdbError {
    RdbError::new(RdbErrorKind::Concurrency)
        .with_op("sqlite")
        .with_message("sqlite connection lock poisoned")
}
