//! Settings extraction for the `from_settings` construction path
//!
//! The caller's runtime exposes a flat key/value surface. The three keys the
//! pipeline needs are read once, here, and turned into `PipelineSettings`.

use crate::errors::{json_type_name, PipelineError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Key holding the target table name
pub const SETTING_TABLE: &str = "table";
/// Key holding the connection settings mapping
pub const SETTING_CONNECTION: &str = "connection";
/// Key holding the insert options mapping
pub const SETTING_INSERT_OPTIONS: &str = "insert_options";

/// A key/value configuration surface supplied by the caller's runtime
pub trait SettingsSource {
    /// Value for `key`, or `None` when the key is absent
    fn get_setting(&self, key: &str) -> Option<Value>;
}

impl SettingsSource for Map<String, Value> {
    fn get_setting(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl SettingsSource for HashMap<String, Value> {
    fn get_setting(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// The three pipeline inputs as found in the settings source
///
/// Nothing here is validated beyond JSON types; presence checks belong to
/// pipeline construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// `None` when absent or null
    pub table: Option<String>,
    /// Defaults to `{}` when absent; any other type is kept for the driver
    /// to reject
    pub connection: Value,
    /// Defaults to `{}` when absent; `None` when explicitly null
    pub insert_options: Option<Value>,
}

impl PipelineSettings {
    /// Read the pipeline keys from `source`
    ///
    /// # Errors
    ///
    /// Returns `RdbErrorKind::InvalidArgument` if the table setting is
    /// present but not a string.
    pub fn extract<S: SettingsSource + ?Sized>(source: &S) -> Result<Self> {
        let table = match source.get_setting(SETTING_TABLE) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name),
            Some(other) => {
                return Err(PipelineError::InvalidSetting {
                    key: SETTING_TABLE.to_string(),
                    reason: format!("expected a string, got <{}>", json_type_name(&other)),
                }
                .into())
            }
        };

        let connection = source
            .get_setting(SETTING_CONNECTION)
            .unwrap_or_else(|| Value::Object(Map::new()));

        let insert_options = match source.get_setting(SETTING_INSERT_OPTIONS) {
            None => Some(Value::Object(Map::new())),
            Some(Value::Null) => None,
            Some(value) => Some(value),
        };

        Ok(Self {
            table,
            connection,
            insert_options,
        })
    }
}
