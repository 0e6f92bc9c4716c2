//! SQLite connection executing rdbpipe statements
//!
//! Documents are stored as JSON text keyed by the JSON text of their `id`
//! field. Inserts answer with a RethinkDB-shaped write summary; a primary
//! key conflict under the `error` strategy is reported in the summary
//! (`errors`, `first_error`), not as a Rust error.

#![allow(clippy::result_large_err)]

use crate::db::{self, quote_ident};
use crate::errors::{corrupt_document, from_rusqlite, lock_poisoned, table_missing, Result};
use rdbpipe_core::errors::{RdbError, RdbErrorKind};
use rdbpipe_core::{ConflictStrategy, Connection, Document, Durability, InsertOptions, Statement};
use rusqlite::OptionalExtension;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard};

/// Primary key field of every document table
pub const PRIMARY_KEY: &str = "id";

/// Result of one insert statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteSummary {
    pub inserted: u64,
    pub replaced: u64,
    pub unchanged: u64,
    pub errors: u64,
    pub deleted: u64,
    pub skipped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<Value>>,
}

impl WriteSummary {
    fn record_change(&mut self, options: &InsertOptions, old_val: Value, new_val: Value) {
        if options.return_changes == Some(true) {
            self.changes
                .get_or_insert_with(Vec::new)
                .push(json!({"old_val": old_val, "new_val": new_val}));
        }
    }

    fn into_value(self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| {
            RdbError::new(RdbErrorKind::Serialization)
                .with_op("insert")
                .with_message(e.to_string())
        })
    }
}

/// A single SQLite database shared by everything holding the driver
pub struct SqliteConnection {
    conn: Mutex<rusqlite::Connection>,
    path: String,
}

impl SqliteConnection {
    pub fn new(conn: rusqlite::Connection, path: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned())
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        db::list_tables(&*self.lock()?)
    }

    pub fn create_table(&self, name: &str) -> Result<()> {
        db::create_table(&*self.lock()?, name)
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        db::drop_table(&*self.lock()?, name)
    }

    /// Fetch one document by primary key value
    pub fn get_document(&self, table: &str, id: &Value) -> Result<Option<Value>> {
        let conn = self.lock()?;
        if !db::table_exists(&conn, table)? {
            return Err(table_missing("get", table));
        }
        let key = encode_key(id)?;
        read_document(&conn, table, &key)
    }

    /// Number of documents in a table
    pub fn count(&self, table: &str) -> Result<u64> {
        let conn = self.lock()?;
        if !db::table_exists(&conn, table)? {
            return Err(table_missing("count", table));
        }
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn insert(&self, table: &str, document: &Document, options: &InsertOptions) -> Result<Value> {
        let mut conn = self.lock()?;
        if !db::table_exists(&conn, table)? {
            return Err(table_missing("insert", table));
        }

        // durability applies to this statement only; the previous level is restored
        let previous = match options.durability {
            Some(durability) => {
                let previous: i64 = conn
                    .pragma_query_value(None, "synchronous", |row| row.get(0))
                    .map_err(from_rusqlite)?;
                let level = match durability {
                    Durability::Hard => "FULL",
                    Durability::Soft => "OFF",
                };
                conn.pragma_update(None, "synchronous", level)
                    .map_err(from_rusqlite)?;
                Some(previous)
            }
            None => None,
        };

        let result = write_one(&mut conn, table, document, options);

        if let Some(level) = previous {
            conn.pragma_update(None, "synchronous", level)
                .map_err(from_rusqlite)?;
        }
        result
    }
}

fn write_one(
    conn: &mut rusqlite::Connection,
    table: &str,
    document: &Document,
    options: &InsertOptions,
) -> Result<Value> {
    let mut summary = WriteSummary::default();
    let mut new_doc = document.clone();
    let id = match new_doc.get(PRIMARY_KEY) {
        Some(id) => id.clone(),
        None => {
            let generated = uuid::Uuid::new_v4().to_string();
            new_doc.insert(PRIMARY_KEY.to_string(), Value::String(generated.clone()));
            summary.generated_keys = Some(vec![generated.clone()]);
            Value::String(generated)
        }
    };

    if matches!(id, Value::Null | Value::Object(_)) {
        summary.errors = 1;
        summary.first_error = Some(format!(
            "Primary key `{}` cannot be {}: {}",
            PRIMARY_KEY,
            rdbpipe_core::errors::json_type_name(&id),
            id
        ));
        return summary.into_value();
    }
    let key = encode_key(&id)?;

    let tx = conn.transaction().map_err(from_rusqlite)?;
    let new_val = Value::Object(new_doc.clone());

    match read_document(&tx, table, &key)? {
        None => {
            write_document(&tx, table, &key, &new_val, false)?;
            summary.inserted = 1;
            summary.record_change(options, Value::Null, new_val);
        }
        Some(old_val) => match options.effective_conflict() {
            ConflictStrategy::Error => {
                summary.errors = 1;
                summary.first_error = Some(format!(
                    "Duplicate primary key `{}`:\n{}\n{}",
                    PRIMARY_KEY, old_val, new_val
                ));
            }
            strategy => {
                let merged = match (strategy, &old_val) {
                    (ConflictStrategy::Update, Value::Object(old)) => {
                        let mut merged = old.clone();
                        merged.extend(new_doc);
                        Value::Object(merged)
                    }
                    _ => new_val,
                };
                if merged == old_val {
                    summary.unchanged = 1;
                } else {
                    write_document(&tx, table, &key, &merged, true)?;
                    summary.replaced = 1;
                    summary.record_change(options, old_val, merged);
                }
            }
        },
    }

    tx.commit().map_err(from_rusqlite)?;
    summary.into_value()
}

impl Connection for SqliteConnection {
    fn run(&self, statement: &Statement) -> Result<Value> {
        match statement {
            Statement::TableList => Ok(json!(self.list_tables()?)),
            Statement::Insert {
                table,
                document,
                options,
            } => self.insert(table, document, options),
        }
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Numbers compare by value, so `1` and `1.0` name the same document
fn canonical_key(id: &Value) -> Value {
    match id {
        Value::Number(n) => n
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| id.clone()),
        Value::Array(items) => Value::Array(items.iter().map(canonical_key).collect()),
        other => other.clone(),
    }
}

fn encode_key(id: &Value) -> Result<String> {
    serde_json::to_string(&canonical_key(id)).map_err(|e| {
        RdbError::new(RdbErrorKind::Serialization)
            .with_op("encode_key")
            .with_message(e.to_string())
    })
}

fn read_document(conn: &rusqlite::Connection, table: &str, key: &str) -> Result<Option<Value>> {
    let sql = format!("SELECT doc FROM {} WHERE id = ?1", quote_ident(table));
    let raw: Option<String> = conn
        .query_row(&sql, [key], |row| row.get(0))
        .optional()
        .map_err(from_rusqlite)?;

    raw.map(|text| serde_json::from_str(&text).map_err(|e| corrupt_document(table, e)))
        .transpose()
}

fn write_document(
    conn: &rusqlite::Connection,
    table: &str,
    key: &str,
    doc: &Value,
    existing: bool,
) -> Result<()> {
    let sql = if existing {
        format!("UPDATE {} SET doc = ?2 WHERE id = ?1", quote_ident(table))
    } else {
        format!("INSERT INTO {} (id, doc) VALUES (?1, ?2)", quote_ident(table))
    };
    conn.execute(&sql, [key, doc.to_string().as_str()])
        .map_err(from_rusqlite)?;
    Ok(())
}
