//! Executable statements, table references and insert options
//!
//! `Statement` is a closed set: the driver runs nothing else. Statements
//! also have a JSON term form modelled on ReQL's JSON protocol, used when a
//! statement arrives as data rather than as a typed value:
//!
//! - table list: `[62, []]`
//! - insert: `[56, [[15, ["<table>"]], {<document>}], {<optargs>}]`

use crate::errors::{json_type_name, PipelineError, RdbError, Result};
use crate::item::Document;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Term type code for a table reference
pub const TERM_TABLE: u64 = 15;
/// Term type code for an insert
pub const TERM_INSERT: u64 = 56;
/// Term type code for a table listing
pub const TERM_TABLE_LIST: u64 = 62;

/// What to do when an inserted document's primary key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    Error,
    Replace,
    Update,
}

/// Write acknowledgement level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    Hard,
    Soft,
}

/// Options forwarded into every insert built by a pipeline
///
/// Unset options are omitted from the statement so the database applies its
/// own defaults. `upsert` is the legacy spelling of `conflict = "replace"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<Durability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_changes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,
}

impl InsertOptions {
    /// Parse a mapping of recognized options
    ///
    /// # Errors
    ///
    /// Returns `RdbErrorKind::InvalidArgument` if `value` is not an object,
    /// names an unknown option, or holds a value of the wrong type.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PipelineError::InvalidInsertOptions {
                reason: format!("expected a mapping, got <{}>", json_type_name(&value)),
            }
            .into());
        }
        serde_json::from_value(value).map_err(|e| {
            PipelineError::InvalidInsertOptions {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Options as the optargs object of an insert term
    pub fn to_optargs(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Conflict strategy after folding in the legacy `upsert` flag
    pub fn effective_conflict(&self) -> ConflictStrategy {
        match (self.conflict, self.upsert) {
            (Some(strategy), _) => strategy,
            (None, Some(true)) => ConflictStrategy::Replace,
            (None, _) => ConflictStrategy::Error,
        }
    }
}

/// Handle on a named table
///
/// Only `Driver::get_table` hands these out, after confirming the table
/// exists. The handle is never re-validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an insert of `document` into this table
    pub fn insert(&self, document: Document, options: &InsertOptions) -> Statement {
        Statement::Insert {
            table: self.name.clone(),
            document,
            options: options.clone(),
        }
    }
}

/// A statement the driver knows how to execute
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// List the tables of the connection's database
    TableList,
    /// Insert one document
    Insert {
        table: String,
        document: Document,
        options: InsertOptions,
    },
}

impl Statement {
    pub fn table_list() -> Self {
        Statement::TableList
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Statement::TableList => "table_list",
            Statement::Insert { .. } => "insert",
        }
    }

    /// Encode as a JSON term
    pub fn to_term(&self) -> Value {
        match self {
            Statement::TableList => json!([TERM_TABLE_LIST, []]),
            Statement::Insert {
                table,
                document,
                options,
            } => {
                let table_term = json!([TERM_TABLE, [table]]);
                let optargs = options.to_optargs();
                if optargs.is_empty() {
                    json!([TERM_INSERT, [table_term, document]])
                } else {
                    json!([TERM_INSERT, [table_term, document], optargs])
                }
            }
        }
    }

    /// Decode a JSON term
    ///
    /// # Errors
    ///
    /// Returns `RdbErrorKind::InvalidArgument` for anything that is not a
    /// table-list or insert term.
    pub fn from_term(term: &Value) -> Result<Self> {
        let invalid = || -> RdbError {
            PipelineError::InvalidStatement {
                found: describe(term),
            }
            .into()
        };

        let parts = term.as_array().ok_or_else(invalid)?;
        let (code, args, optargs) = match parts.as_slice() {
            [code, Value::Array(args)] => (code, args, None),
            [code, Value::Array(args), Value::Object(optargs)] => (code, args, Some(optargs)),
            _ => return Err(invalid()),
        };

        match code.as_u64() {
            Some(TERM_TABLE_LIST) if args.is_empty() && optargs.map_or(true, Map::is_empty) => {
                Ok(Statement::TableList)
            }
            Some(TERM_INSERT) => {
                let (table, document) = match args.as_slice() {
                    [table_term, Value::Object(document)] => {
                        (table_name_of(table_term).ok_or_else(invalid)?, document)
                    }
                    _ => return Err(invalid()),
                };
                let options = match optargs {
                    Some(map) => InsertOptions::from_value(Value::Object(map.clone()))
                        .map_err(|e| e.with_op("execute"))?,
                    None => InsertOptions::default(),
                };
                Ok(Statement::Insert {
                    table,
                    document: document.clone(),
                    options,
                })
            }
            _ => Err(invalid()),
        }
    }
}

fn table_name_of(term: &Value) -> Option<String> {
    match term.as_array()?.as_slice() {
        [code, Value::Array(args)] if code.as_u64() == Some(TERM_TABLE) => match args.as_slice() {
            [Value::String(name)] => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn describe(term: &Value) -> String {
    match term {
        Value::String(s) => format!("string {:?}", s),
        other => json_type_name(other).to_string(),
    }
}
