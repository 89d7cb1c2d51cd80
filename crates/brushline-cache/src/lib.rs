//! # brushline-cache
//!
//! Multi-tier caching for calculation results plus batch scheduling.
//!
//! Keys are content hashes of canonicalized inputs, so caching is safe
//! by construction: a result can only be served for the exact input
//! that produced it. Lookup walks a bounded in-memory LRU tier, then an
//! optional SQLite-backed persisted tier, then computes; concurrent
//! misses on the same key coalesce into one computation.

pub mod error;
pub mod inflight;
pub mod key;
pub mod memory;
pub mod persist;
pub mod scheduler;
pub mod service;

pub use error::{CacheError, CacheResult};
pub use key::CacheKey;
pub use memory::MemoryTier;
pub use persist::SqliteTier;
pub use scheduler::BatchScheduler;
pub use service::{CacheConfig, CacheStats, CalculationCache};
