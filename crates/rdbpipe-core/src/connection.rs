//! Connection seam between the driver and a database backend
//!
//! The driver never speaks a wire protocol itself. A backend supplies a
//! `ConnectionFactory` that turns `ConnectionSettings` into a `Connection`,
//! and the connection runs the statements the driver hands it.

use crate::errors::{json_type_name, PipelineError, Result};
use crate::statement::Statement;
use rdbpipe_core_types::Sensitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Settings keys whose values never appear in Debug output
const REDACTED_KEYS: &[&str] = &["password", "auth_key", "token", "secret"];

/// Opaque key/value settings handed verbatim to a connection factory
///
/// No key is required; an empty mapping means "factory defaults".
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSettings(Map<String, Value>);

impl ConnectionSettings {
    /// Empty settings (factory defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Validate that `value` is a mapping and wrap it
    ///
    /// # Errors
    ///
    /// Returns `RdbErrorKind::InvalidArgument` for any non-object value,
    /// `null` included.
    pub fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PipelineError::InvalidConnectionSettings {
                found: json_type_name(&other).to_string(),
            }
            .into()),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if REDACTED_KEYS.contains(&key.as_str()) {
                map.entry(key, &Sensitive::new(value));
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// A live handle able to run statements
///
/// `run` blocks until the database answers. Any failure it returns is
/// propagated by the driver untouched.
pub trait Connection: Send + Sync {
    /// Run one statement and return the database's native result.
    ///
    /// # Errors
    ///
    /// Backend-defined; usually `RdbErrorKind::Execution`.
    fn run(&self, statement: &Statement) -> Result<Value>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn run(&self, statement: &Statement) -> Result<Value> {
        (**self).run(statement)
    }
}

/// Opens connections from settings
pub trait ConnectionFactory: Send + Sync {
    type Connection: Connection;

    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Backend-defined; usually `RdbErrorKind::Connection`, or
    /// `RdbErrorKind::InvalidArgument` for settings the backend rejects.
    fn connect(&self, settings: &ConnectionSettings) -> Result<Self::Connection>;
}

impl<F, C> ConnectionFactory for F
where
    F: Fn(&ConnectionSettings) -> Result<C> + Send + Sync,
    C: Connection,
{
    type Connection = C;

    fn connect(&self, settings: &ConnectionSettings) -> Result<C> {
        self(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RdbErrorKind;
    use serde_json::json;

    #[test]
    fn test_try_from_value_accepts_objects() {
        let settings =
            ConnectionSettings::try_from_value(json!({"host": "db1", "port": 28015})).unwrap();
        assert_eq!(settings.get("host"), Some(&json!("db1")));
        assert!(!settings.is_empty());
    }

    #[test]
    fn test_try_from_value_rejects_null() {
        let err = ConnectionSettings::try_from_value(Value::Null).unwrap_err();
        assert_eq!(err.kind(), RdbErrorKind::InvalidArgument);
        assert!(err.message().contains("<null>"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let settings = ConnectionSettings::new()
            .with("db", "scrapydb")
            .with("password", "hunter2");

        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("scrapydb"));
        assert!(rendered.contains("***REDACTED***"));
        assert!(!rendered.contains("hunter2"));
    }
}
