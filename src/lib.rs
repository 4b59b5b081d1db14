//! lrue: a multi-tenant, fixed-capacity LRU cache engine.
//!
//! ## Layers
//!
//! ```text
//!   server::{tcp, console}     front ends, one task per session
//!          │
//!   protocol                   parse ─► Command ─► execute
//!          │
//!   manager::CacheManager      registry: CacheId ─► Arc<ConcurrentLruCache>
//!          │
//!   policy::lru                LruCore + RwLock wrapper
//!          │
//!   ds                         SlotArena, IntrusiveList, SlotIndex
//! ```

pub mod config;
pub mod ds;
pub mod error;
pub mod manager;
pub mod policy;
pub mod protocol;
pub mod report;
pub mod server;
pub mod traits;
