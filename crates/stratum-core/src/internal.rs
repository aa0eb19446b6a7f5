//! Per-request internal storage shared between middlewares.
//!
//! [`Internal`] holds three kinds of entries:
//!
//! - ready JSON values, keyed by name
//! - pending values, typically a fetch started once outside the invocation
//!   path and awaited by whichever middleware needs it first
//! - typed extensions (clients, caches) keyed by their type
//!
//! Every entry is cheap to clone, so an engine can seed each invocation with
//! a copy of its configured initial store.

use crate::error::Error;
use crate::handler::BoxFuture;
use futures_util::future::{FutureExt, Shared};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A value that may still be in flight.
pub type PendingValue = Shared<BoxFuture<'static, Result<Value, String>>>;

/// One named entry of an [`Internal`] store.
#[derive(Clone)]
pub enum InternalValue {
    /// Already available.
    Ready(Value),
    /// Resolves once awaited; every clone shares the same result.
    Pending(PendingValue),
}

impl fmt::Debug for InternalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Free-form storage scoped to one request.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stratum_core::Internal;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut internal = Internal::new();
/// internal.insert("region", json!("eu-west-1"));
/// internal.insert_pending("secret", async { Ok::<_, String>(json!({"password": "hunter2"})) });
///
/// assert_eq!(internal.resolve("region").await.unwrap(), Some(json!("eu-west-1")));
/// assert_eq!(
///     internal.resolve("secret").await.unwrap(),
///     Some(json!({"password": "hunter2"}))
/// );
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Internal {
    values: HashMap<String, InternalValue>,
    extensions: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Internal {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a ready value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), InternalValue::Ready(value));
    }

    /// Stores a value that resolves later.
    ///
    /// The future is polled only when some middleware awaits the entry.
    pub fn insert_pending<F, E>(&mut self, key: impl Into<String>, future: F)
    where
        F: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        let future: BoxFuture<'static, Result<Value, String>> =
            Box::pin(async move { future.await.map_err(|e| e.to_string()) });
        self.values
            .insert(key.into(), InternalValue::Pending(future.shared()));
    }

    /// Returns the raw entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&InternalValue> {
        self.values.get(key)
    }

    /// Returns the value for `key` if it is already available.
    #[must_use]
    pub fn get_ready(&self, key: &str) -> Option<&Value> {
        match self.values.get(key)? {
            InternalValue::Ready(value) => Some(value),
            InternalValue::Pending(pending) => pending.peek().and_then(|r| r.as_ref().ok()),
        }
    }

    /// Resolves the value for `key`, awaiting it if it is still pending.
    ///
    /// A pending value that failed surfaces as a handler error.
    pub async fn resolve(&self, key: &str) -> Result<Option<Value>, Error> {
        match self.values.get(key) {
            None => Ok(None),
            Some(InternalValue::Ready(value)) => Ok(Some(value.clone())),
            Some(InternalValue::Pending(pending)) => pending
                .clone()
                .await
                .map(Some)
                .map_err(|message| Error::handler(format!("internal value '{key}': {message}"))),
        }
    }

    /// Removes and returns the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<InternalValue> {
        self.values.remove(key)
    }

    /// Returns `true` if an entry exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over the stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of named entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no named entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stores a typed extension, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Retrieves a typed extension.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Retrieves a shared handle to a typed extension.
    #[must_use]
    pub fn extension_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.extensions
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|v| v.downcast().ok())
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Internal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Internal")
            .field("values", &self.values)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_insert_and_get_ready() {
        let mut internal = Internal::new();
        assert!(internal.is_empty());

        internal.insert("a", json!(1));
        assert_eq!(internal.get_ready("a"), Some(&json!(1)));
        assert!(internal.contains_key("a"));
        assert_eq!(internal.len(), 1);
    }

    #[tokio::test]
    async fn test_pending_value_is_polled_once() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();

        let mut internal = Internal::new();
        internal.insert_pending("client", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(json!("ready"))
        });
        let copy = internal.clone();

        assert!(internal.get_ready("client").is_none());
        assert_eq!(internal.resolve("client").await.unwrap(), Some(json!("ready")));
        assert_eq!(copy.resolve("client").await.unwrap(), Some(json!("ready")));
        assert_eq!(internal.get_ready("client"), Some(&json!("ready")));
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_pending_value() {
        let mut internal = Internal::new();
        internal.insert_pending("secret", async { Err::<Value, _>("access denied") });

        let err = internal.resolve("secret").await.unwrap_err();
        assert!(err.to_string().contains("access denied"));
    }

    #[tokio::test]
    async fn test_resolve_missing_key() {
        let internal = Internal::new();
        assert_eq!(internal.resolve("missing").await.unwrap(), None);
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Client {
            endpoint: &'static str,
        }

        let mut internal = Internal::new();
        assert!(!internal.has_extension::<Client>());

        internal.set_extension(Client { endpoint: "https://example.com" });
        assert!(internal.has_extension::<Client>());
        assert_eq!(internal.get_extension::<Client>().unwrap().endpoint, "https://example.com");

        let shared = internal.clone();
        let a = internal.extension_arc::<Client>().unwrap();
        let b = shared.extension_arc::<Client>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
