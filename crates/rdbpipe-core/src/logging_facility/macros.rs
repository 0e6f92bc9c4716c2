//! Canonical logging macros
//!
//! Every operation boundary logged by the backends and the CLI goes through
//! these macros so that `component`, `op` and `event` are always present.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use rdbpipe_core::log_op_start;
/// log_op_start!("ingest");
/// log_op_start!("ingest", table = "items");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use rdbpipe_core::log_op_end;
/// log_op_end!("ingest", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// # Example
///
/// ```
/// # use rdbpipe_core::log_op_error;
/// # use rdbpipe_core::errors::{RdbError, RdbErrorKind};
/// let err = RdbError::new(RdbErrorKind::Execution).with_message("duplicate key");
/// log_op_error!("process_item", err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let rdb_err: $crate::errors::RdbError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?rdb_err.kind(),
            err_code = rdb_err.code(),
            message = rdb_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let rdb_err: $crate::errors::RdbError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?rdb_err.kind(),
            err_code = rdb_err.code(),
            message = rdb_err.message(),
            $($field)*
        );
    }};
}
