//! Settings loading
//!
//! A TOML file layered with `RDBPIPE_*` environment variables. Nested keys
//! use `__`, so `RDBPIPE_CONNECTION__PATH` overrides `[connection] path`.

use clap::Args;
use config::{Config, ConfigError, Environment, File, FileFormat};
use rdbpipe_core::settings::SETTING_CONNECTION;
use rdbpipe_core::ConnectionSettings;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RDBPIPE";

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Path to the TOML settings file
    #[arg(long)]
    pub config: PathBuf,
}

/// Load the settings mapping handed to the pipeline
pub fn load(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// The `connection` section as driver settings, empty when absent
pub fn connection_settings(
    settings: &Map<String, Value>,
) -> rdbpipe_core::Result<ConnectionSettings> {
    match settings.get(SETTING_CONNECTION) {
        Some(value) => ConnectionSettings::try_from_value(value.clone()),
        None => Ok(ConnectionSettings::new()),
    }
}
