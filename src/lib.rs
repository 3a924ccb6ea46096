//! TTL Cache - A thread-safe time-to-live cache
//!
//! Provides an in-memory TTL cache persisted as a JSON snapshot, a file-level
//! cache keyed by modification time, and a small HTTP surface over the former.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEngine, FileCache, Record};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
