//! # Cache Trait Hierarchy
//!
//! Single-threaded cache cores implement a small trait stack so that helpers
//! and tests can be written against behaviour rather than a concrete type.
//!
//! ```text
//!   ┌─────────────────────────────────────────┐
//!   │            CoreCache<K, V>              │
//!   │  insert / get / contains / len          │
//!   │  is_empty / capacity / clear            │
//!   └──────────────────┬──────────────────────┘
//!                      ▼
//!   ┌─────────────────────────────────────────┐
//!   │           MutableCache<K, V>            │
//!   │  remove / remove_batch                  │
//!   └──────────────────┬──────────────────────┘
//!                      ▼
//!   ┌─────────────────────────────────────────┐
//!   │           LruCacheTrait<K, V>           │
//!   │  pop_lru / peek_lru / touch             │
//!   │  recency_rank                           │
//!   └─────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! Implementations of these traits are **not** synchronized. Shared access
//! goes through [`ConcurrentLruCache`](crate::policy::lru::ConcurrentLruCache),
//! which wraps a core in a `parking_lot::RwLock` and is tagged with
//! [`ConcurrentCache`].

/// Operations every cache core supports.
///
/// # Example
///
/// ```
/// use lrue::policy::lru::LruCore;
/// use lrue::traits::CoreCache;
///
/// fn warm_cache<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let mut cache: LruCore<u64, String, u16> = LruCore::new(100);
/// warm_cache(&mut cache, &[(1, "one".to_string()), (2, "two".to_string())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts a key-value pair, returning the previous value if it existed.
    ///
    /// If the cache is at capacity, the eviction policy frees room first.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Gets a reference to a value by key, updating recency.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Checks if a key exists without updating recency.
    fn contains(&self, key: &K) -> bool;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    fn capacity(&self) -> usize;

    /// Removes all entries.
    fn clear(&mut self);
}

/// Caches that support arbitrary key-based removal.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    /// Removes a key, returning its value if it was present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes several keys; results line up with the input order.
    ///
    /// ```
    /// use lrue::policy::lru::LruCore;
    /// use lrue::traits::{CoreCache, MutableCache};
    ///
    /// let mut cache: LruCore<u64, &str, u8> = LruCore::new(10);
    /// cache.insert(1, "one");
    /// cache.insert(2, "two");
    /// cache.insert(3, "three");
    ///
    /// let removed = cache.remove_batch(&[1, 99, 3]);
    /// assert_eq!(removed, vec![Some("one"), None, Some("three")]);
    /// assert_eq!(cache.len(), 1);
    /// ```
    fn remove_batch(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|k| self.remove(k)).collect()
    }
}

/// Recency-ordered operations.
pub trait LruCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the least recently used entry.
    fn pop_lru(&mut self) -> Option<(K, V)>;

    /// Peeks at the least recently used entry without reordering.
    fn peek_lru(&self) -> Option<(&K, &V)>;

    /// Marks an entry as most recently used. Returns `false` if absent.
    ///
    /// ```
    /// use lrue::policy::lru::LruCore;
    /// use lrue::traits::{CoreCache, LruCacheTrait};
    ///
    /// let mut cache: LruCore<u64, &str, u16> = LruCore::new(10);
    /// cache.insert(1, "first");
    /// cache.insert(2, "second");
    ///
    /// assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(1));
    /// assert!(cache.touch(&1));
    /// assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(2));
    /// assert!(!cache.touch(&99));
    /// ```
    fn touch(&mut self, key: &K) -> bool;

    /// Position in recency order, 0 being the most recently used.
    fn recency_rank(&self, key: &K) -> Option<usize>;
}

/// Marker for cache types that may be shared across threads.
pub trait ConcurrentCache: Send + Sync {}
