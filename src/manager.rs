//! Registry of named cache instances.
//!
//! ## Architecture
//!
//! ```text
//!   CacheManager
//!   ┌───────────────────────────────────────────────────────────┐
//!   │ RwLock<FxHashMap<CacheId, Arc<EngineCache>>>              │
//!   │                                                           │
//!   │   hash("users")  ──►  Arc<ConcurrentLruCache "users">     │
//!   │   hash("carts")  ──►  Arc<ConcurrentLruCache "carts">     │
//!   └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry lock is held only for the map lookup, insert, or removal.
//! Callers receive an `Arc` to the instance and take the instance lock after
//! the registry lock is gone, so the two locks never nest.
//!
//! Identifiers are hashes of cache names. Two names that hash to the same
//! identifier address the same slot in the registry; collisions are not
//! detected.
//!
//! ## Example Usage
//!
//! ```
//! use bytes::Bytes;
//! use lrue::manager::CacheManager;
//!
//! let manager: CacheManager = CacheManager::new();
//! let cache = manager.create_cache("users", 1, 100);
//! cache.put(42, Bytes::from_static(b"alice"));
//!
//! assert_eq!(manager.get_cache(1).unwrap().get(&42).unwrap(), "alice");
//! assert!(manager.destroy_cache(1));
//! assert!(manager.get_cache(1).is_none());
//! ```

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ds::SlotIndex;
use crate::policy::lru::ConcurrentLruCache;

/// Hashed cache name.
pub type CacheId = u64;

/// Hashed entry key.
pub type EntryKey = u64;

/// Slot index width used by the engine; caps an instance at 65 534 entries.
pub type EngineIndex = u16;

/// Cache instance as stored in the registry.
pub type EngineCache<I = EngineIndex> = ConcurrentLruCache<EntryKey, Bytes, I>;

/// Owner of every cache instance.
#[derive(Debug)]
pub struct CacheManager<I: SlotIndex = EngineIndex> {
    caches: RwLock<FxHashMap<CacheId, Arc<EngineCache<I>>>>,
}

impl<I: SlotIndex> Default for CacheManager<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: SlotIndex> CacheManager<I> {
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(FxHashMap::default()),
        }
    }

    /// Builds an instance and registers it under `id`.
    ///
    /// An instance already registered under `id` is replaced.
    pub fn create_cache(
        &self,
        title: impl Into<String>,
        id: CacheId,
        capacity: usize,
    ) -> Arc<EngineCache<I>> {
        let cache = Arc::new(EngineCache::<I>::new(title, capacity));
        debug!(id, title = cache.title(), capacity = cache.capacity(), "cache created");
        let replaced = self.caches.write().insert(id, Arc::clone(&cache));
        if let Some(old) = replaced {
            debug!(id, title = old.title(), "cache replaced");
        }
        cache
    }

    pub fn get_cache(&self, id: CacheId) -> Option<Arc<EngineCache<I>>> {
        self.caches.read().get(&id).cloned()
    }

    /// Clears and removes the instance; returns `false` if it was absent.
    pub fn destroy_cache(&self, id: CacheId) -> bool {
        let removed = self.caches.write().remove(&id);
        match removed {
            Some(cache) => {
                cache.clear();
                debug!(id, title = cache.title(), "cache destroyed");
                true
            },
            None => false,
        }
    }

    /// Destroys every registered instance.
    pub fn clear_all_caches(&self) {
        let drained: Vec<_> = {
            let mut caches = self.caches.write();
            caches.drain().map(|(_, cache)| cache).collect()
        };
        for cache in &drained {
            cache.clear();
        }
        debug!(count = drained.len(), "all caches destroyed");
    }

    /// Renders every instance as its title followed by its entries, most
    /// recent first. Instances are ordered by title.
    ///
    /// ```
    /// use bytes::Bytes;
    /// use lrue::manager::CacheManager;
    ///
    /// let manager: CacheManager = CacheManager::new();
    /// manager.create_cache("b", 2, 4).put(1, Bytes::from_static(b"x"));
    /// manager.create_cache("a", 1, 4);
    ///
    /// assert_eq!(manager.list_caches(), vec!["a", "b", "Key: 1, Value: x"]);
    /// ```
    pub fn list_caches(&self) -> Vec<String> {
        let mut caches: Vec<_> = self.caches.read().values().cloned().collect();
        caches.sort_by(|a, b| a.title().cmp(b.title()));

        let mut lines = Vec::new();
        for cache in caches {
            lines.push(cache.title().to_string());
            lines.extend(cache.dump());
        }
        lines
    }

    pub fn contains(&self, id: CacheId) -> bool {
        self.caches.read().contains_key(&id)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }
}
