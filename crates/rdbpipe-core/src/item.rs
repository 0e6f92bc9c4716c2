//! Scraped values as they reach the pipeline
//!
//! Upstream stages emit arbitrary values. Only `Scraped::Item` exposes a
//! value mapping and is persisted; everything else passes through.

use rdbpipe_core_types::RequestId;
use serde_json::{Map, Value};

/// Plain key/value mapping sent to the database
pub type Document = Map<String, Value>;

/// A structured record produced by an ingestion stage
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    kind: String,
    values: Document,
}

impl Item {
    /// Empty item of the given kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            values: Document::new(),
        }
    }

    /// Item of the given kind with pre-populated values
    pub fn with_values(kind: impl Into<String>, values: Document) -> Self {
        Self {
            kind: kind.into(),
            values,
        }
    }

    /// Builder-style field setter
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// The item's underlying value mapping
    pub fn values(&self) -> &Document {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Document {
        &mut self.values
    }

    pub fn into_values(self) -> Document {
        self.values
    }
}

/// A value handed to the pipeline by the ingestion stage
#[derive(Debug, Clone, PartialEq)]
pub enum Scraped {
    /// A record exposing a value mapping
    Item(Item),
    /// Anything else; skipped with a warning
    Other(Value),
}

impl Scraped {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Scraped::Item(item) => Some(item),
            Scraped::Other(_) => None,
        }
    }

    pub fn into_item(self) -> Option<Item> {
        match self {
            Scraped::Item(item) => Some(item),
            Scraped::Other(_) => None,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Scraped::Item(_))
    }

    /// JSON form, used when echoing values downstream
    pub fn to_value(&self) -> Value {
        match self {
            Scraped::Item(item) => Value::Object(item.values().clone()),
            Scraped::Other(value) => value.clone(),
        }
    }
}

impl From<Item> for Scraped {
    fn from(item: Item) -> Self {
        Scraped::Item(item)
    }
}

impl From<Value> for Scraped {
    fn from(value: Value) -> Self {
        Scraped::Other(value)
    }
}

/// Caller context for one `process_item` call
#[derive(Debug, Clone)]
pub struct CrawlContext {
    /// Name of the producing stage (spider, feed, file)
    pub source: String,
    pub request_id: RequestId,
}

impl CrawlContext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            request_id: RequestId::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}
