//! Extension points around each insert
//!
//! A pipeline owns one `InsertHooks` value. Customizing behaviour means
//! supplying a different value: implement the trait on your own type, or
//! plug closures into `HookFns`.

use crate::errors::Result;
use crate::item::{Document, Item};
use serde_json::Value;

/// Hooks invoked by `InsertPipeline::process_item`
///
/// Every method has a default, so implementors override only what they need.
/// Errors returned from a hook abort the item and propagate to the caller.
pub trait InsertHooks: Send + Sync {
    /// Runs before the document is extracted. May mutate the item.
    ///
    /// # Errors
    ///
    /// Any error aborts processing of this item.
    fn before_insert(&self, _item: &mut Item) -> Result<()> {
        Ok(())
    }

    /// Projects the item into the document to insert.
    ///
    /// # Errors
    ///
    /// Any error aborts processing of this item.
    fn get_document(&self, item: &Item) -> Result<Document> {
        Ok(item.values().clone())
    }

    /// Runs with the raw insert result. May mutate the item.
    ///
    /// # Errors
    ///
    /// Any error aborts processing of this item; the insert already happened.
    fn after_insert(&self, _item: &mut Item, _insert_result: &Value) -> Result<()> {
        Ok(())
    }
}

/// No-op hooks; inserts the item's values as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl InsertHooks for DefaultHooks {}

type BeforeFn = Box<dyn Fn(&mut Item) -> Result<()> + Send + Sync>;
type DocumentFn = Box<dyn Fn(&Item) -> Result<Document> + Send + Sync>;
type AfterFn = Box<dyn Fn(&mut Item, &Value) -> Result<()> + Send + Sync>;

/// Hooks assembled from closures; unset hooks use the defaults
///
/// ```
/// use rdbpipe_core::HookFns;
///
/// let hooks = HookFns::new().with_before_insert(|item| {
///     item.set("source", "catalog");
///     Ok(())
/// });
/// # let _ = hooks;
/// ```
#[derive(Default)]
pub struct HookFns {
    before: Option<BeforeFn>,
    document: Option<DocumentFn>,
    after: Option<AfterFn>,
}

impl HookFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_insert<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Item) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn with_get_document<F>(mut self, f: F) -> Self
    where
        F: Fn(&Item) -> Result<Document> + Send + Sync + 'static,
    {
        self.document = Some(Box::new(f));
        self
    }

    pub fn with_after_insert<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Item, &Value) -> Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for HookFns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookFns")
            .field("before_insert", &self.before.is_some())
            .field("get_document", &self.document.is_some())
            .field("after_insert", &self.after.is_some())
            .finish()
    }
}

impl InsertHooks for HookFns {
    fn before_insert(&self, item: &mut Item) -> Result<()> {
        match &self.before {
            Some(f) => f(item),
            None => DefaultHooks.before_insert(item),
        }
    }

    fn get_document(&self, item: &Item) -> Result<Document> {
        match &self.document {
            Some(f) => f(item),
            None => DefaultHooks.get_document(item),
        }
    }

    fn after_insert(&self, item: &mut Item, insert_result: &Value) -> Result<()> {
        match &self.after {
            Some(f) => f(item, insert_result),
            None => DefaultHooks.after_insert(item, insert_result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RdbError, RdbErrorKind};
    use serde_json::json;

    #[test]
    fn test_default_document_is_item_values() {
        let item = Item::new("product").field("id", 1).field("name", "x");
        let document = DefaultHooks.get_document(&item).unwrap();
        assert_eq!(&document, item.values());
    }

    #[test]
    fn test_hook_fns_fall_back_to_defaults() {
        let hooks = HookFns::new();
        let mut item = Item::new("product").field("id", 1);

        hooks.before_insert(&mut item).unwrap();
        hooks.after_insert(&mut item, &json!({"inserted": 1})).unwrap();
        assert_eq!(hooks.get_document(&item).unwrap(), *item.values());
    }

    #[test]
    fn test_hook_fns_override_document() {
        let hooks = HookFns::new().with_get_document(|item| {
            let mut doc = item.values().clone();
            doc.insert("kind".to_string(), json!(item.kind()));
            Ok(doc)
        });
        let item = Item::new("product").field("id", 1);

        let document = hooks.get_document(&item).unwrap();
        assert_eq!(Value::Object(document), json!({"id": 1, "kind": "product"}));
    }

    #[test]
    fn test_hook_fns_propagate_errors() {
        let hooks = HookFns::new().with_before_insert(|_| {
            Err(RdbError::new(RdbErrorKind::Internal).with_message("drop item"))
        });
        let err = hooks.before_insert(&mut Item::new("product")).unwrap_err();
        assert_eq!(err.message(), "drop item");
        assert!(format!("{:?}", hooks).contains("before_insert: true"));
    }
}
