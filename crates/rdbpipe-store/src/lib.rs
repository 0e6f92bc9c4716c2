//! rdbpipe store - document tables on SQLite
//!
//! Provides:
//! - `SqliteConnector`: a `ConnectionFactory` opening SQLite databases
//! - `SqliteConnection`: runs table-list and insert statements with
//!   RethinkDB-shaped write summaries
//! - Table administration helpers (create, drop, list)

pub mod connection;
pub mod connector;
pub mod db;
pub mod errors;

// Re-export key types
pub use connection::SqliteConnection;
pub use connector::{SqliteConnector, StoreSettings};
pub use errors::Result;
