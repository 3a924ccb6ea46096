//! TTL Cleanup Task
//!
//! Background task that periodically prunes expired cache entries and
//! persists the snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;

/// Spawns a background task that periodically prunes expired cache entries.
///
/// Pruning takes the engine lock briefly on the async worker. When `autosave`
/// is set, the snapshot is written on the blocking pool after each prune.
///
/// # Arguments
/// * `cache` - Shared cache engine
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
/// * `autosave` - Persist the snapshot after each prune
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheEngine::open("cache/cache.json", 300)?);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 60, true);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<CacheEngine>,
    cleanup_interval_secs: u64,
    autosave: bool,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds (autosave={})",
            cleanup_interval_secs, autosave
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.prune();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }

            if autosave {
                let cache = Arc::clone(&cache);
                match tokio::task::spawn_blocking(move || cache.save(false)).await {
                    Ok(Ok(_)) => debug!("TTL cleanup: snapshot saved"),
                    Ok(Err(e)) => warn!("TTL cleanup: failed to save snapshot: {}", e),
                    Err(e) => warn!("TTL cleanup: save task failed: {}", e),
                }
            }
        }
    })
}
