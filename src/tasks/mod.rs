//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Prunes expired entries and optionally saves the snapshot

mod cleanup;

pub use cleanup::spawn_cleanup_task;
