//! Fetch cache with an injected clock.
//!
//! Middlewares that fetch remote values (parameters, secrets) keep them
//! across warm invocations through a [`Cache`]. The cache is an ordinary
//! owned value: construct one next to the middleware that uses it, share it
//! with an `Arc` if several need it, and drive time from a [`Clock`] so tests
//! never sleep.
//!
//! Expiry semantics, per [`CacheOptions::cache_expiry`]:
//!
//! | value | behavior |
//! |-------|----------|
//! | `0`   | caching disabled, every call fetches |
//! | `< 0` | cached forever once fetched |
//! | `> 0` | cached for that many milliseconds |

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current time in milliseconds.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `start` milliseconds.
    #[must_use]
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute reading.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// How one fetch should be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Key the fetched value is stored under.
    pub cache_key: String,
    /// Expiry in milliseconds; see the module docs.
    pub cache_expiry: i64,
}

impl CacheOptions {
    /// Creates options for `cache_key` with the given expiry.
    #[must_use]
    pub fn new(cache_key: impl Into<String>, cache_expiry: i64) -> Self {
        Self {
            cache_key: cache_key.into(),
            cache_expiry,
        }
    }
}

/// A cached value and the time it stops being fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,
    /// Expiry, in the clock's milliseconds.
    pub expiry: i64,
}

/// Keyed cache of fetched values.
///
/// `V` is usually a [`PendingValue`](stratum_core::PendingValue), so the
/// in-flight fetch itself is cached and concurrent callers share it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stratum_util::{Cache, CacheOptions, ManualClock};
///
/// let clock = Arc::new(ManualClock::new(0));
/// let cache = Cache::with_clock(clock.clone());
/// let options = CacheOptions::new("config", 1_000);
///
/// assert_eq!(cache.process(&options, || 1), 1);
/// assert_eq!(cache.process(&options, || 2), 1);
///
/// clock.advance(1_001);
/// assert_eq!(cache.process(&options, || 3), 3);
/// ```
pub struct Cache<V, C = SystemClock> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    clock: C,
}

impl<V: Clone> Cache<V, SystemClock> {
    /// Creates an empty cache on the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<V: Clone> Default for Cache<V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, C: Clock> Cache<V, C> {
    /// Creates an empty cache on the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the cached value if still fresh, otherwise calls `fetch`
    /// and caches its result.
    ///
    /// The lock is not held while `fetch` runs.
    pub fn process<F>(&self, options: &CacheOptions, fetch: F) -> V
    where
        F: FnOnce() -> V,
    {
        if options.cache_expiry == 0 {
            return fetch();
        }

        let now = self.clock.now_millis();
        if let Some(entry) = self.entries.lock().get(&options.cache_key) {
            if options.cache_expiry < 0 || entry.expiry >= now {
                tracing::trace!(cache_key = %options.cache_key, "cache hit");
                return entry.value.clone();
            }
        }

        tracing::trace!(cache_key = %options.cache_key, "cache miss");
        let value = fetch();
        self.entries.lock().insert(
            options.cache_key.clone(),
            CacheEntry {
                value: value.clone(),
                expiry: now.saturating_add(options.cache_expiry),
            },
        );
        value
    }

    /// Returns the entry for `key`, fresh or not.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.lock().get(key).cloned()
    }

    /// Removes the given keys.
    pub fn clear<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(key.as_ref());
        }
    }

    /// Removes every entry.
    pub fn clear_all(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V, C> std::fmt::Debug for Cache<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("entries", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}
