//! # Arena-backed Least Recently Used (LRU) Cache
//!
//! Fixed-capacity LRU cache whose entries live in a preallocated slot arena.
//! After construction no operation allocates a node: new entries take a slot
//! from the free list, or reuse the slot of the entry they evict.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                   ConcurrentLruCache<K, V, I>                    │
//!   │   title: String                                                  │
//!   │   ┌──────────────────────────────────────────────────────────┐   │
//!   │   │                 RwLock<LruCore<K, V, I>>                 │   │
//!   │   └──────────────────────────────────────────────────────────┘   │
//!   └───────────────────────────────┬──────────────────────────────────┘
//!                                   ▼
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                        LruCore<K, V, I>                          │
//!   │                                                                  │
//!   │   index: FxHashMap<K, I>          list: IntrusiveList<K, V, I>   │
//!   │   ┌───────┬─────┐                                                │
//!   │   │ key_a │  3  │──────────►  head ─► [3] ◄─► [0] ◄─► [5] ◄─ tail│
//!   │   │ key_b │  0  │──────────►         MRU               LRU      │
//!   │   │ key_c │  5  │──────────►                                     │
//!   │   └───────┴─────┘             free list: [1, 2, 4]               │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Method              | Lock (concurrent) | Description                          |
//! |---------------------|-------------------|--------------------------------------|
//! | `put(k, v)`         | Write             | Insert or update, evicting the LRU   |
//! | `get(&k)`           | Write             | Read value and promote to MRU        |
//! | `peek(&k)`          | Read              | Read value without reordering        |
//! | `eject(&k)`         | Write             | Remove entry, slot goes to free list |
//! | `clear()`           | Write             | Reset every slot                     |
//! | `len()`             | Read              | Occupied slot count                  |
//! | `snapshot(dir)`     | Read              | Entries in recency order             |
//!
//! Every operation except `snapshot`, `recency_rank`, and `clear` is O(1).
//!
//! ## Example Usage
//!
//! ```
//! use lrue::policy::lru::LruCore;
//! use lrue::traits::CoreCache;
//!
//! let mut cache: LruCore<u64, &str, u8> = LruCore::new(2);
//! cache.insert(1, "one");
//! cache.insert(2, "two");
//! cache.get(&1);
//!
//! // Key 2 is now least recently used and makes room for key 3.
//! cache.insert(3, "three");
//! assert!(!cache.contains(&2));
//! assert!(cache.contains(&1));
//! ```

use std::fmt;
use std::hash::Hash;
use std::mem;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ds::{Direction, IntrusiveList, SlotIndex};
use crate::error::InvariantError;
use crate::traits::{ConcurrentCache, CoreCache, LruCacheTrait, MutableCache};

/// Single-threaded LRU core: recency list plus key index.
pub struct LruCore<K, V, I = u32>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    list: IntrusiveList<K, V, I>,
    index: FxHashMap<K, I>,
}

impl<K, V, I> LruCore<K, V, I>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    /// Creates a core with `capacity` preallocated slots.
    ///
    /// Capacities at or above `I::NONE` are clamped to `I::NONE - 1`. A
    /// capacity of 0 yields a cache that stores nothing.
    ///
    /// ```
    /// use lrue::policy::lru::LruCore;
    /// use lrue::traits::CoreCache;
    ///
    /// let cache: LruCore<u64, Vec<u8>, u8> = LruCore::new(255);
    /// assert_eq!(cache.capacity(), 254);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let list = IntrusiveList::with_capacity(capacity);
        let index = FxHashMap::with_capacity_and_hasher(list.capacity(), Default::default());
        Self { list, index }
    }

    /// Obtains a slot for a new entry, evicting the LRU entry when full.
    ///
    /// Returns `None` only for a zero-capacity cache.
    fn acquire_slot(&mut self, key: K, value: V) -> Option<I> {
        let idx = match self.list.acquire_free() {
            Some(idx) => idx,
            None => self.list.evict_tail()?,
        };
        if let Some((evicted, _)) = self.list.fill(idx, key, value) {
            self.index.remove(&evicted);
        }
        Some(idx)
    }

    /// Reads a value without updating recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.list.get(idx).map(|(_, value)| value)
    }

    /// Iterates entries in the requested recency order.
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = (&K, &V)> {
        self.list.iter(direction).map(|(_, key, value)| (key, value))
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        mem::size_of::<Self>()
            + self.list.arena().approx_bytes()
            + self.index.capacity() * mem::size_of::<(K, I)>()
    }

    /// Verifies that list, free list, and key index agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_invariants()?;
        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but {} slots are linked",
                self.index.len(),
                self.list.len()
            )));
        }
        for (key, &idx) in &self.index {
            match self.list.get(idx) {
                Some((stored, _)) if stored == key => {},
                _ => {
                    return Err(InvariantError::new(format!(
                        "index points at slot {idx} which holds a different key"
                    )));
                },
            }
            if !self.list.is_linked(idx) {
                return Err(InvariantError::new(format!(
                    "indexed slot {idx} is not linked"
                )));
            }
        }
        Ok(())
    }
}

impl<K, V, I> CoreCache<K, V> for LruCore<K, V, I>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            let old = self.list.get_mut(idx).map(|slot| mem::replace(slot, value));
            self.list.link_as_head(idx);
            return old;
        }

        if let Some(idx) = self.acquire_slot(key, value) {
            self.index.insert(key, idx);
            self.list.link_as_head(idx);
        }
        None
    }

    #[inline]
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.list.link_as_head(idx);
        self.list.get(idx).map(|(_, value)| value)
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.list.capacity()
    }

    fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }
}

impl<K, V, I> MutableCache<K, V> for LruCore<K, V, I>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.list.release(idx).map(|(_, value)| value)
    }
}

impl<K, V, I> LruCacheTrait<K, V> for LruCore<K, V, I>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    fn pop_lru(&mut self) -> Option<(K, V)> {
        let idx = self.list.back_id()?;
        let entry = self.list.release(idx)?;
        self.index.remove(&entry.0);
        Some(entry)
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back_id().and_then(|idx| self.list.get(idx))
    }

    fn touch(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&idx) => {
                self.list.link_as_head(idx);
                true
            },
            None => false,
        }
    }

    fn recency_rank(&self, key: &K) -> Option<usize> {
        let idx = *self.index.get(key)?;
        self.list
            .iter(Direction::MostRecentFirst)
            .position(|(slot, _, _)| slot == idx)
    }
}

impl<K, V, I> fmt::Debug for LruCore<K, V, I>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Named, thread-safe LRU cache instance.
///
/// Mutating operations and `get` (which reorders) take the write lock;
/// `len`, `peek`, and `snapshot` take the read lock. The lock is held only
/// for the structural work, never across I/O.
pub struct ConcurrentLruCache<K, V, I = u32>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    title: String,
    inner: RwLock<LruCore<K, V, I>>,
}

impl<K, V, I> ConcurrentLruCache<K, V, I>
where
    K: Copy + Eq + Hash + Send + Sync,
    V: Send + Sync,
    I: SlotIndex,
{
    /// Creates a named cache with the given capacity.
    ///
    /// ```
    /// use lrue::policy::lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u64, String, u16> = ConcurrentLruCache::new("users", 100);
    /// assert_eq!(cache.title(), "users");
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(title: impl Into<String>, capacity: usize) -> Self {
        Self {
            title: title.into(),
            inner: RwLock::new(LruCore::new(capacity)),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Inserts or updates `key`, returning the previous value.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut cache = self.inner.write();
        cache.insert(key, value)
    }

    /// Returns a clone of the value and promotes the entry.
    ///
    /// ```
    /// use lrue::policy::lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u64, String, u16> = ConcurrentLruCache::new("demo", 2);
    /// cache.put(1, "a".to_string());
    /// cache.put(2, "b".to_string());
    /// assert_eq!(cache.get(&1).as_deref(), Some("a"));
    ///
    /// cache.put(3, "c".to_string());
    /// assert!(cache.get(&2).is_none());
    /// ```
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let mut cache = self.inner.write();
        cache.get(key).cloned()
    }

    /// Returns a clone of the value without reordering.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let cache = self.inner.read();
        cache.peek(key).cloned()
    }

    /// Removes `key`; absent keys are a no-op.
    pub fn eject(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.write();
        cache.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        let cache = self.inner.read();
        cache.contains(key)
    }

    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear();
    }

    pub fn len(&self) -> usize {
        let cache = self.inner.read();
        cache.len()
    }

    pub fn is_empty(&self) -> bool {
        let cache = self.inner.read();
        cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        let cache = self.inner.read();
        cache.capacity()
    }

    /// Copies out every entry in the requested recency order.
    ///
    /// The snapshot is taken under the read lock; a later call walks the list
    /// again.
    pub fn snapshot(&self, direction: Direction) -> Vec<(K, V)>
    where
        V: Clone,
    {
        let cache = self.inner.read();
        cache
            .iter(direction)
            .map(|(key, value)| (*key, value.clone()))
            .collect()
    }

    /// Formats every entry as `Key: <key>, Value: <value>`, most recent
    /// first. Values are rendered as UTF-8, lossily.
    ///
    /// ```
    /// use lrue::policy::lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u64, &[u8], u8> = ConcurrentLruCache::new("demo", 4);
    /// cache.put(7, b"seven");
    /// assert_eq!(cache.dump(), vec!["Key: 7, Value: seven".to_string()]);
    /// ```
    pub fn dump(&self) -> Vec<String>
    where
        K: fmt::Display,
        V: AsRef<[u8]>,
    {
        let cache = self.inner.read();
        cache
            .iter(Direction::MostRecentFirst)
            .map(|(key, value)| {
                format!(
                    "Key: {key}, Value: {}",
                    String::from_utf8_lossy(value.as_ref())
                )
            })
            .collect()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let cache = self.inner.read();
        cache.check_invariants()
    }
}

impl<K, V, I> ConcurrentCache for ConcurrentLruCache<K, V, I>
where
    K: Copy + Eq + Hash + Send + Sync,
    V: Send + Sync,
    I: SlotIndex,
{
}

impl<K, V, I> fmt::Debug for ConcurrentLruCache<K, V, I>
where
    K: Copy + Eq + Hash,
    I: SlotIndex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.read();
        f.debug_struct("ConcurrentLruCache")
            .field("title", &self.title)
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lru_core {
        use super::*;

        fn cache(capacity: usize) -> LruCore<u64, &'static str, u8> {
            LruCore::new(capacity)
        }

        #[test]
        fn test_new_cache_creation() {
            let cache = cache(4);
            assert_eq!(cache.len(), 0);
            assert_eq!(cache.capacity(), 4);
            assert!(cache.is_empty());
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_insert_and_get() {
            let mut cache = cache(3);
            assert_eq!(cache.insert(1, "one"), None);
            assert_eq!(cache.insert(2, "two"), None);
            assert_eq!(cache.get(&1), Some(&"one"));
            assert_eq!(cache.get(&2), Some(&"two"));
            assert_eq!(cache.get(&3), None);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_insert_duplicate_key_updates_in_place() {
            let mut cache = cache(2);
            cache.insert(1, "one");
            assert_eq!(cache.insert(1, "uno"), Some("one"));
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.get(&1), Some(&"uno"));
        }

        #[test]
        fn test_update_promotes_entry() {
            let mut cache = cache(2);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(1, "uno");
            cache.insert(3, "three");
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn test_lru_eviction_basic() {
            let mut cache = cache(2);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(3, "three");
            assert!(!cache.contains(&1));
            assert_eq!(cache.len(), 2);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_access_updates_lru_order() {
            let mut cache = cache(2);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.get(&1);
            cache.insert(3, "three");
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn test_peek_does_not_update_lru() {
            let mut cache = cache(2);
            cache.insert(1, "one");
            cache.insert(2, "two");
            assert_eq!(cache.peek(&1), Some(&"one"));
            cache.insert(3, "three");
            assert!(!cache.contains(&1));
        }

        #[test]
        fn test_remove_frees_slot_for_reuse() {
            let mut cache = cache(2);
            cache.insert(1, "one");
            cache.insert(2, "two");
            assert_eq!(cache.remove(&1), Some("one"));
            assert_eq!(cache.remove(&1), None);
            assert_eq!(cache.len(), 1);

            // The freed slot absorbs the next insert; nothing is evicted.
            cache.insert(3, "three");
            assert!(cache.contains(&2));
            assert!(cache.contains(&3));
            assert_eq!(cache.approx_bytes(), LruCore::<u64, &str, u8>::new(2).approx_bytes());
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_remove_head_and_tail_items() {
            let mut cache = cache(3);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(3, "three");

            cache.remove(&3);
            cache.check_invariants().unwrap();
            cache.remove(&1);
            cache.check_invariants().unwrap();
            assert_eq!(cache.peek_lru(), Some((&2, &"two")));
        }

        #[test]
        fn test_pop_lru_until_empty() {
            let mut cache = cache(3);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(3, "three");
            assert_eq!(cache.pop_lru(), Some((1, "one")));
            assert_eq!(cache.pop_lru(), Some((2, "two")));
            assert_eq!(cache.pop_lru(), Some((3, "three")));
            assert_eq!(cache.pop_lru(), None);
            assert!(cache.is_empty());
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_touch_updates_lru_order() {
            let mut cache = cache(3);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(3, "three");
            assert!(cache.touch(&1));
            assert!(!cache.touch(&42));
            cache.insert(4, "four");
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn test_recency_rank_after_operations() {
            let mut cache = cache(3);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(3, "three");
            assert_eq!(cache.recency_rank(&3), Some(0));
            assert_eq!(cache.recency_rank(&1), Some(2));
            cache.get(&1);
            assert_eq!(cache.recency_rank(&1), Some(0));
            assert_eq!(cache.recency_rank(&2), Some(2));
            assert_eq!(cache.recency_rank(&99), None);
        }

        #[test]
        fn test_iter_both_directions() {
            let mut cache = cache(3);
            cache.insert(1, "one");
            cache.insert(2, "two");
            cache.insert(3, "three");
            cache.get(&2);

            let mru: Vec<_> = cache.iter(Direction::MostRecentFirst).map(|(k, _)| *k).collect();
            let lru: Vec<_> = cache.iter(Direction::LeastRecentFirst).map(|(k, _)| *k).collect();
            assert_eq!(mru, vec![2, 3, 1]);
            assert_eq!(lru, vec![1, 3, 2]);
        }

        #[test]
        fn test_clear_then_eviction_point_matches_fresh_cache() {
            let mut used = cache(3);
            for key in 0..10 {
                used.insert(key, "x");
            }
            used.clear();
            assert!(used.is_empty());
            used.check_invariants().unwrap();

            let mut fresh = cache(3);
            for key in 100..104 {
                used.insert(key, "y");
                fresh.insert(key, "y");
            }
            assert!(!used.contains(&100));
            assert!(!fresh.contains(&100));
            let a: Vec<_> = used.iter(Direction::MostRecentFirst).map(|(k, _)| *k).collect();
            let b: Vec<_> = fresh.iter(Direction::MostRecentFirst).map(|(k, _)| *k).collect();
            assert_eq!(a, b);
        }

        #[test]
        fn test_zero_capacity_cache() {
            let mut cache = cache(0);
            assert_eq!(cache.insert(1, "one"), None);
            assert!(cache.is_empty());
            assert_eq!(cache.get(&1), None);
            assert_eq!(cache.pop_lru(), None);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_single_item_cache() {
            let mut cache = cache(1);
            cache.insert(1, "one");
            cache.insert(2, "two");
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.peek_lru(), Some((&2, &"two")));
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_capacity_clamped_below_sentinel() {
            let mut cache = cache(usize::MAX);
            assert_eq!(cache.capacity(), 254);
            for key in 0..300 {
                cache.insert(key, "v");
            }
            assert_eq!(cache.len(), 254);
            assert!(!cache.contains(&45));
            assert!(cache.contains(&46));
            cache.check_invariants().unwrap();
        }
    }

    mod concurrent {
        use super::*;

        #[test]
        fn test_concurrent_cache_basic() {
            let cache: ConcurrentLruCache<u64, String, u16> = ConcurrentLruCache::new("demo", 2);
            assert_eq!(cache.put(1, "one".into()), None);
            assert_eq!(cache.put(1, "uno".into()).as_deref(), Some("one"));
            assert_eq!(cache.get(&1).as_deref(), Some("uno"));
            assert_eq!(cache.peek(&1).as_deref(), Some("uno"));
            assert!(cache.contains(&1));
            assert_eq!(cache.len(), 1);

            cache.eject(&1);
            cache.eject(&1);
            assert!(cache.get(&1).is_none());
            assert!(cache.is_empty());
        }

        #[test]
        fn test_snapshot_orders() {
            let cache: ConcurrentLruCache<u64, u64, u16> = ConcurrentLruCache::new("demo", 4);
            for key in 1..=3 {
                cache.put(key, key * 10);
            }
            assert_eq!(
                cache.snapshot(Direction::MostRecentFirst),
                vec![(3, 30), (2, 20), (1, 10)]
            );
            assert_eq!(
                cache.snapshot(Direction::LeastRecentFirst),
                vec![(1, 10), (2, 20), (3, 30)]
            );
        }

        #[test]
        fn test_clear_and_debug() {
            let cache: ConcurrentLruCache<u64, u64, u8> = ConcurrentLruCache::new("demo", 4);
            cache.put(1, 1);
            cache.clear();
            assert!(cache.is_empty());
            cache.check_invariants().unwrap();
            let dbg = format!("{cache:?}");
            assert!(dbg.contains("demo"));
        }

        #[test]
        fn test_dump_renders_recency_order() {
            let cache: ConcurrentLruCache<u64, Vec<u8>, u16> = ConcurrentLruCache::new("demo", 4);
            cache.put(1, b"one".to_vec());
            cache.put(2, vec![0xff, b'x']);
            assert_eq!(
                cache.dump(),
                vec![
                    "Key: 2, Value: \u{fffd}x".to_string(),
                    "Key: 1, Value: one".to_string(),
                ]
            );
        }

        #[test]
        fn test_is_concurrent_cache() {
            fn assert_concurrent<C: ConcurrentCache>() {}
            assert_concurrent::<ConcurrentLruCache<u64, Vec<u8>, u16>>();
        }
    }
}
