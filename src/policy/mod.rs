//! Eviction policies.
//!
//! The engine ships a single policy: least recently used, backed by the
//! slot arena in [`crate::ds`].

pub mod lru;

pub use lru::{ConcurrentLruCache, LruCore};
