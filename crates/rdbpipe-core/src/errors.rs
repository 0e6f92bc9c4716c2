use serde_json::Value;
use thiserror::Error;

/// Result type alias using RdbError
pub type Result<T> = std::result::Result<T, RdbError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by the driver, the pipeline or a backend maps to
/// exactly one kind. Each kind has a stable code usable by callers that need
/// to react programmatically (e.g. disabling a stage on `NotConfigured`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdbErrorKind {
    /// Malformed connection settings, options, or a non-executable statement
    InvalidArgument,
    /// Table absent when resolving a table reference
    TableNotFound,
    /// A required pipeline input is missing or empty
    NotConfigured,
    /// The connection factory failed to open a connection
    Connection,
    /// Statement execution failed inside the database
    Execution,
    /// The database answered with something the driver cannot interpret
    Protocol,
    Serialization,
    Io,
    /// Shared connection state was poisoned by a panicking thread
    Concurrency,
    Internal,
}

impl RdbErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            RdbErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            RdbErrorKind::TableNotFound => "ERR_TABLE_NOT_FOUND",
            RdbErrorKind::NotConfigured => "ERR_NOT_CONFIGURED",
            RdbErrorKind::Connection => "ERR_CONNECTION",
            RdbErrorKind::Execution => "ERR_EXECUTION",
            RdbErrorKind::Protocol => "ERR_PROTOCOL",
            RdbErrorKind::Serialization => "ERR_SERIALIZATION",
            RdbErrorKind::Io => "ERR_IO",
            RdbErrorKind::Concurrency => "ERR_CONCURRENCY",
            RdbErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) plus context for debugging. Errors are
/// built with the `with_*` setters:
///
/// ```
/// use rdbpipe_core::errors::{RdbError, RdbErrorKind};
///
/// let err = RdbError::new(RdbErrorKind::TableNotFound)
///     .with_op("get_table")
///     .with_table("items");
/// assert_eq!(err.code(), "ERR_TABLE_NOT_FOUND");
/// ```
#[derive(Debug, Clone)]
pub struct RdbError {
    kind: RdbErrorKind,
    op: Option<String>,
    table: Option<String>,
    message: String,
    source: Option<Box<RdbError>>,
}

impl RdbError {
    /// Create a new error with the specified kind
    pub fn new(kind: RdbErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table name context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: RdbError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> RdbErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the table name context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&RdbError> {
        self.source.as_deref()
    }

    /// True when the caller should disable the stage instead of aborting.
    pub fn is_not_configured(&self) -> bool {
        self.kind == RdbErrorKind::NotConfigured
    }
}

impl std::fmt::Display for RdbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for RdbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures raised by the driver and the pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Connection settings were not a key/value mapping
    #[error("The argument connection_settings should be a mapping. Got <{found}> instead")]
    InvalidConnectionSettings { found: String },

    /// A value that does not decode to an executable statement
    #[error("Expecting an executable statement, got <{found}>")]
    InvalidStatement { found: String },

    /// Insert options that are not a mapping of recognized options
    #[error("Invalid insert options: {reason}")]
    InvalidInsertOptions { reason: String },

    /// A settings key holding a value of the wrong type
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Table absent at resolution time
    #[error("Table with name <{table}> not found.")]
    TableNotFound { table: String },

    #[error("Driver not provided.")]
    DriverNotProvided,

    #[error("Table name not provided.")]
    TableNameNotProvided,

    #[error("Insert options not provided.")]
    InsertOptionsNotProvided,
}

impl From<PipelineError> for RdbError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::InvalidConnectionSettings { .. } => {
                RdbError::new(RdbErrorKind::InvalidArgument)
                    .with_op("driver_init")
                    .with_message(message)
            }
            PipelineError::InvalidStatement { .. } => RdbError::new(RdbErrorKind::InvalidArgument)
                .with_op("execute")
                .with_message(message),
            PipelineError::InvalidInsertOptions { .. } | PipelineError::InvalidSetting { .. } => {
                RdbError::new(RdbErrorKind::InvalidArgument)
                    .with_op("pipeline_settings")
                    .with_message(message)
            }
            PipelineError::TableNotFound { table } => RdbError::new(RdbErrorKind::TableNotFound)
                .with_op("get_table")
                .with_table(table)
                .with_message(message),
            PipelineError::DriverNotProvided
            | PipelineError::TableNameNotProvided
            | PipelineError::InsertOptionsNotProvided => {
                RdbError::new(RdbErrorKind::NotConfigured)
                    .with_op("pipeline_init")
                    .with_message(message)
            }
        }
    }
}

/// Short type name of a JSON value, used in InvalidArgument messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_not_found_carries_table() {
        let err: RdbError = PipelineError::TableNotFound {
            table: "items".to_string(),
        }
        .into();

        assert_eq!(err.kind(), RdbErrorKind::TableNotFound);
        assert_eq!(err.table(), Some("items"));
        assert_eq!(err.message(), "Table with name <items> not found.");
    }

    #[test]
    fn test_not_configured_inputs_share_kind() {
        for err in [
            PipelineError::DriverNotProvided,
            PipelineError::TableNameNotProvided,
            PipelineError::InsertOptionsNotProvided,
        ] {
            let rdb: RdbError = err.into();
            assert!(rdb.is_not_configured());
            assert_eq!(rdb.op(), Some("pipeline_init"));
        }
    }

    #[test]
    fn test_display_includes_code_op_and_source() {
        let cause = RdbError::new(RdbErrorKind::Io).with_message("socket closed");
        let err = RdbError::new(RdbErrorKind::Connection)
            .with_op("connect")
            .with_message("could not reach server")
            .with_source(cause);

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_CONNECTION] in operation 'connect'"));
        assert!(rendered.contains("caused by [ERR_IO]: socket closed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&Value::Null), "null");
        assert_eq!(json_type_name(&serde_json::json!([1])), "array");
        assert_eq!(json_type_name(&serde_json::json!({})), "object");
    }
}
