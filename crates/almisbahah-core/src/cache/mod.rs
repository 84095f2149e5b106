//! Cache storage for offline asset access.
//!
//! A cache storage holds named cache generations. Each generation maps a
//! request key (method + URL) to a stored response. The agent writes one
//! generation per deployed version and deletes the rest on activation.
//!
//! Implementations:
//! - `MemoryCacheStorage`: in-process maps, for tests and embedding hosts
//! - `DiskCacheStorage`: one JSON file per generation under the cache dir

pub mod disk;
pub mod memory;
pub mod storage;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;
pub use storage::{CacheError, CacheStorage, CachedData};
