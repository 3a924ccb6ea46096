//! File-Level Cache
//!
//! Treats whole files, or the records inside a single file, as cache units.
//! Whole-file freshness comes from the filesystem mtime; per-record freshness
//! comes from the `cache_time`/`cache_expiry` stamps written into each record.
//! The two checks are independent and can disagree.
//!
//! Every operation holds one shared lock, so all file-cache traffic in the
//! process is serialized, unrelated paths included.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::cache::clock::{self, Timestamp};
use crate::cache::entry::{record_expiry, record_stamped_at, stamp_record, Record};
use crate::cache::{new_lock, persist, CacheLock, ReentrantGuard};
use crate::error::{CacheError, Result};

// == File Cache ==
/// Stateless file cache guarded by an injected process-wide lock.
#[derive(Debug, Clone)]
pub struct FileCache {
    lock: CacheLock,
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new(new_lock())
    }
}

impl FileCache {
    // == Constructor ==
    /// Creates a file cache serialized by `lock`. Share the same lock between
    /// every `FileCache` that may touch the same files.
    pub fn new(lock: CacheLock) -> Self {
        Self { lock }
    }

    fn guard(&self) -> ReentrantGuard<'_> {
        self.lock.acquire()
    }

    // == Whole Files ==

    /// True iff `path` is a regular file modified less than `max_age_seconds` ago.
    pub fn has_fresh(&self, path: &Path, max_age_seconds: i64) -> Result<bool> {
        let cutoff = clock::expired_before(max_age_seconds)?;
        let _guard = self.guard();
        Ok(matches!(mtime(path)?, Some(modified) if modified > cutoff))
    }

    /// Deletes `path` if it is stale. Returns whether a file was removed.
    pub fn prune_file(&self, path: &Path, max_age_seconds: i64) -> Result<bool> {
        let cutoff = clock::expired_before(max_age_seconds)?;
        let _guard = self.guard();
        prune_if_stale(path, cutoff)
    }

    /// Deletes every stale regular file directly inside `dir` (not recursive).
    /// Returns how many files were removed; a missing directory removes nothing.
    pub fn prune_directory(&self, dir: &Path, max_age_seconds: i64) -> Result<usize> {
        let cutoff = clock::expired_before(max_age_seconds)?;
        let _guard = self.guard();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::io(dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(dir, e))?;
            if prune_if_stale(&entry.path(), cutoff)? {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Pruned {} stale files from {}", removed, dir.display());
        }
        Ok(removed)
    }

    // == List of Records ==

    /// Loads the record list at `path`, keeping records that are before their
    /// own `cache_expiry` and were stored less than `max_age_seconds` ago.
    /// A missing stamp does not count against a record.
    pub fn load_fresh_records(&self, path: &Path, max_age_seconds: i64) -> Result<Vec<Record>> {
        let cutoff = clock::expired_before(max_age_seconds)?;
        let _guard = self.guard();
        load_records(path, cutoff)
    }

    /// Appends one record stamped to expire in `ttl_seconds`, dropping records
    /// already past their expiry. Returns whether the file now exists.
    pub fn append_record(&self, path: &Path, record: Record, ttl_seconds: i64) -> Result<bool> {
        self.append_records(path, vec![record], ttl_seconds)
    }

    /// Appends a batch; every record gets the same expiry.
    pub fn append_records(
        &self,
        path: &Path,
        records: Vec<Record>,
        ttl_seconds: i64,
    ) -> Result<bool> {
        let expiry = clock::expiry_at(ttl_seconds)?;
        let stamped_at = clock::now();
        let _guard = self.guard();

        let mut cached = load_records(path, Timestamp::MIN)?;
        let added = records.len();
        cached.extend(records.into_iter().map(|mut record| {
            stamp_record(&mut record, stamped_at, expiry);
            record
        }));
        persist::save_sequence(path, &cached)?;

        debug!(
            "Appended {} records to {} ({} total)",
            added,
            path.display(),
            cached.len()
        );
        Ok(path.is_file())
    }

    // == Mapping of Records ==

    /// Keyed counterpart of [`FileCache::load_fresh_records`].
    pub fn load_fresh_mapping(
        &self,
        path: &Path,
        max_age_seconds: i64,
    ) -> Result<HashMap<String, Record>> {
        let cutoff = clock::expired_before(max_age_seconds)?;
        let _guard = self.guard();
        load_mapping(path, cutoff)
    }

    /// Inserts or replaces one keyed record stamped to expire in `ttl_seconds`.
    /// Returns whether the file now exists.
    pub fn upsert_mapping_entry(
        &self,
        path: &Path,
        key: impl Into<String>,
        record: Record,
        ttl_seconds: i64,
    ) -> Result<bool> {
        let mut batch = HashMap::with_capacity(1);
        batch.insert(key.into(), record);
        self.upsert_mapping_entries(path, batch, ttl_seconds)
    }

    /// Inserts or replaces a batch of keyed records with a shared expiry.
    pub fn upsert_mapping_entries(
        &self,
        path: &Path,
        records: HashMap<String, Record>,
        ttl_seconds: i64,
    ) -> Result<bool> {
        let expiry = clock::expiry_at(ttl_seconds)?;
        let stamped_at = clock::now();
        let _guard = self.guard();

        let mut cached = load_mapping(path, Timestamp::MIN)?;
        let added = records.len();
        for (key, mut record) in records {
            stamp_record(&mut record, stamped_at, expiry);
            cached.insert(key, record);
        }
        persist::save_mapping(path, &cached)?;

        debug!(
            "Upserted {} records into {} ({} total)",
            added,
            path.display(),
            cached.len()
        );
        Ok(path.is_file())
    }
}

fn mtime(path: &Path) -> Result<Option<Timestamp>> {
    clock::modified_at(path).map_err(|e| CacheError::io(path, e))
}

fn prune_if_stale(path: &Path, cutoff: Timestamp) -> Result<bool> {
    match mtime(path)? {
        Some(modified) if modified <= cutoff => {
            let removed = persist::remove(path)?;
            debug!("Removed stale cache file {}", path.display());
            Ok(removed)
        }
        _ => Ok(false),
    }
}

/// Live records stamped after `cutoff`; `Timestamp::MIN` checks expiry only.
fn is_fresh(record: &Record, now: Timestamp, cutoff: Timestamp) -> bool {
    let live = record_expiry(record).map_or(true, |expiry| expiry > now);
    let recent = record_stamped_at(record).map_or(true, |stamped| stamped > cutoff);
    live && recent
}

fn load_records(path: &Path, cutoff: Timestamp) -> Result<Vec<Record>> {
    let records: Vec<Record> = persist::load_sequence(path)?.unwrap_or_default();
    let now = clock::now();
    Ok(records
        .into_iter()
        .filter(|record| is_fresh(record, now, cutoff))
        .collect())
}

fn load_mapping(path: &Path, cutoff: Timestamp) -> Result<HashMap<String, Record>> {
    let mapping: HashMap<String, Record> = persist::load_mapping(path)?.unwrap_or_default();
    let now = clock::now();
    Ok(mapping
        .into_iter()
        .filter(|(_, record)| is_fresh(record, now, cutoff))
        .collect())
}
