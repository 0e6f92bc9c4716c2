//! rdbpipe core - document insert pipeline over a lazily connected driver
//!
//! This crate provides:
//! - `Driver`: owns one lazily created connection, resolves tables and
//!   executes statements
//! - `InsertPipeline`: resolves its table once and inserts one document per
//!   scraped item, with `before_insert` / `get_document` / `after_insert` hooks
//! - The statement model (`Statement`, `Table`, `InsertOptions`) and its JSON
//!   term encoding
//! - Settings extraction for the `from_settings` construction path
//! - Error and logging facilities shared by the backends and the CLI
//!
//! Wire protocols live behind the `Connection` / `ConnectionFactory` traits.

pub mod connection;
pub mod driver;
pub mod errors;
pub mod hooks;
pub mod item;
pub mod logging_facility;
pub mod pipeline;
pub mod settings;
pub mod statement;

// Logging macros expand to paths under this re-export.
pub use rdbpipe_core_types as core_types;

// Re-export commonly used types
pub use connection::{Connection, ConnectionFactory, ConnectionSettings};
pub use driver::Driver;
pub use errors::{PipelineError, RdbError, RdbErrorKind, Result};
pub use hooks::{DefaultHooks, HookFns, InsertHooks};
pub use item::{CrawlContext, Document, Item, Scraped};
pub use pipeline::{InsertPipeline, InsertPipelineBuilder};
pub use settings::{PipelineSettings, SettingsSource};
pub use statement::{ConflictStrategy, Durability, InsertOptions, Statement, Table};
