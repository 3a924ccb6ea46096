//! Cache Module
//!
//! Provides a thread-safe in-memory TTL cache with JSON snapshots on disk, and
//! a stateless file-level cache keyed by modification time.

pub mod clock;
mod engine;
mod entry;
mod file_cache;
mod lock;
pub mod persist;
mod stats;


// Re-export public types
pub use clock::Timestamp;
pub use engine::{CacheEngine, CacheGuard};
pub use entry::{
    record_expiry, record_stamped_at, stamp_record, CacheEntry, Record, EXPIRY_FIELD,
    STAMPED_FIELD,
};
pub use file_cache::FileCache;
pub use lock::{new_lock, CacheLock, ReentrantGuard, ReentrantLock};
pub use stats::CacheStats;
