//! Cache Engine Module
//!
//! In-memory TTL cache backed by an optional JSON snapshot on disk.
//!
//! Every entry follows `absent -> live -> expired -> absent`. Expiry is checked
//! lazily on read (an expired entry found by `get` is removed on the spot) and
//! eagerly by `prune`. All entries share the TTL the engine was opened with.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::cache::clock::{self, Timestamp};
use crate::cache::entry::{CacheEntry, Record};
use crate::cache::{new_lock, persist, CacheLock, CacheStats, ReentrantGuard};
use crate::error::Result;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

// == Cache Engine ==
/// Thread-safe TTL cache with whole-file persistence.
///
/// Share it across threads behind an `Arc`. Each public method takes the
/// engine lock for its whole duration; use [`CacheEngine::lock`] to run several
/// operations in one critical section.
#[derive(Debug)]
pub struct CacheEngine {
    /// Backing snapshot file
    path: PathBuf,
    /// TTL applied to every entry
    ttl_seconds: i64,
    /// Gate serializing operations, possibly shared with other engines
    lock: CacheLock,
    state: Mutex<CacheState>,
    /// Orders snapshot writes; always taken after the gate
    save_lock: Mutex<()>,
}

impl CacheEngine {
    // == Constructors ==
    /// Opens an engine backed by `path`, hydrating from it when it exists and
    /// pruning whatever expired while it was on disk.
    ///
    /// # Errors
    /// * `InvalidArgument` if `ttl_seconds` is negative or too large for a timestamp
    /// * `Format` if the backing file is not a valid snapshot
    /// * `Io` if the backing file cannot be read
    pub fn open(path: impl Into<PathBuf>, ttl_seconds: i64) -> Result<Self> {
        Self::open_with_lock(path, ttl_seconds, new_lock())
    }

    /// Same as [`CacheEngine::open`], serialized by an externally supplied lock
    /// so several engines can be coordinated.
    pub fn open_with_lock(
        path: impl Into<PathBuf>,
        ttl_seconds: i64,
        lock: CacheLock,
    ) -> Result<Self> {
        clock::expiry_at(ttl_seconds)?;

        let engine = Self {
            path: path.into(),
            ttl_seconds,
            lock,
            state: Mutex::new(CacheState::default()),
            save_lock: Mutex::new(()),
        };
        engine.load(true)?;

        info!(
            "Cache opened at {} with ttl={}s ({} live entries)",
            engine.path.display(),
            engine.ttl_seconds,
            engine.len()
        );
        Ok(engine)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    // == Lock ==
    /// Acquires the engine lock and returns a guard exposing every operation.
    ///
    /// Operations called on the guard never re-acquire the lock, so any
    /// sequence of them is atomic with respect to other threads. The gate is
    /// reentrant: while the guard is alive this thread may still operate on
    /// other engines sharing the same [`CacheLock`], but not on this one
    /// except through the guard.
    pub fn lock(&self) -> CacheGuard<'_> {
        let gate = self.lock.acquire();
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        CacheGuard {
            state,
            _gate: gate,
            engine: self,
        }
    }

    // == Delegating Operations ==

    /// Returns the record for `key` if present and unexpired.
    pub fn get(&self, key: &str) -> Option<Record> {
        self.lock().get(key)
    }

    /// Like [`CacheEngine::get`], but returns the entry with its expiry.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get_entry(key)
    }

    pub fn set(&self, key: impl Into<String>, value: Record) {
        self.lock().set(key, value)
    }

    pub fn set_many<K: Into<String>>(&self, items: impl IntoIterator<Item = (K, Record)>) {
        self.lock().set_many(items)
    }

    pub fn add(&self, key: impl Into<String>, value: Record, force: bool) -> bool {
        self.lock().add(key, value, force)
    }

    pub fn add_many<K: Into<String>>(
        &self,
        items: impl IntoIterator<Item = (K, Record)>,
        force: bool,
    ) -> usize {
        self.lock().add_many(items, force)
    }

    pub fn delete(&self, key: &str) -> usize {
        self.lock().delete(key)
    }

    pub fn delete_many<K: AsRef<str>>(&self, keys: impl IntoIterator<Item = K>) -> usize {
        self.lock().delete_many(keys)
    }

    pub fn has(&self, key: &str) -> bool {
        self.lock().has(key)
    }

    pub fn size(&self, prune: bool) -> usize {
        self.lock().size(prune)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn prune(&self) -> usize {
        self.lock().prune()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }

    pub fn values(&self) -> Vec<Record> {
        self.lock().values()
    }

    pub fn items(&self) -> Vec<(String, Record)> {
        self.lock().items()
    }

    pub fn snapshot(&self) -> HashMap<String, CacheEntry> {
        self.lock().snapshot()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    /// Same contract as [`CacheGuard::save`], but the file is written after
    /// the engine lock is released, from a copy taken under it.
    pub fn save(&self, prune: bool) -> Result<bool> {
        let (entries, _writing) = {
            let mut guard = self.lock();
            if prune {
                guard.prune();
            }
            let writing = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
            (guard.snapshot(), writing)
        };
        write_snapshot(&self.path, &entries)
    }

    pub fn load(&self, prune: bool) -> Result<bool> {
        self.lock().load(prune)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }
}

// == Cache Guard ==
/// Exclusive access to a [`CacheEngine`] for the lifetime of the guard.
pub struct CacheGuard<'a> {
    // Released before the gate: fields drop in declaration order.
    state: MutexGuard<'a, CacheState>,
    _gate: ReentrantGuard<'a>,
    engine: &'a CacheEngine,
}

impl CacheGuard<'_> {
    fn expiry(&self) -> Timestamp {
        // ttl was range-checked at open; saturate if the clock has since moved past it
        clock::expiry_at(self.engine.ttl_seconds).unwrap_or(Timestamp::MAX)
    }

    // == Get ==
    /// Returns a copy of the record if present and unexpired.
    ///
    /// An expired entry is removed as a side effect. Absent, expired and
    /// deleted keys all read as `None`.
    pub fn get(&mut self, key: &str) -> Option<Record> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Returns a copy of the live entry, expiry included.
    pub fn get_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let state = &mut *self.state;
        let expired = match state.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                state.stats.record_hit();
                return Some(entry.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.remove(key);
            state.stats.record_expirations(1);
            debug!("Lazily evicted expired key {}", key);
        }
        state.stats.record_miss();
        None
    }

    // == Set ==
    /// Inserts or overwrites `key`, expiring `ttl_seconds` from now.
    pub fn set(&mut self, key: impl Into<String>, value: Record) {
        let entry = CacheEntry::new(value, Some(self.expiry()));
        self.state.entries.insert(key.into(), entry);
    }

    pub fn set_many<K: Into<String>>(&mut self, items: impl IntoIterator<Item = (K, Record)>) {
        for (key, value) in items {
            self.set(key, value);
        }
    }

    // == Add ==
    /// Sets `key` only if it is absent (or expired), unless `force` is true.
    /// Returns whether the value was stored.
    pub fn add(&mut self, key: impl Into<String>, value: Record, force: bool) -> bool {
        let key = key.into();
        if !force && self.has(&key) {
            return false;
        }
        self.set(key, value);
        true
    }

    /// Per-pair [`CacheGuard::add`]; returns how many values were stored.
    pub fn add_many<K: Into<String>>(
        &mut self,
        items: impl IntoIterator<Item = (K, Record)>,
        force: bool,
    ) -> usize {
        items
            .into_iter()
            .map(|(key, value)| self.add(key, value, force) as usize)
            .sum()
    }

    // == Delete ==
    /// Removes `key`; returns 1 if it was present, 0 otherwise.
    pub fn delete(&mut self, key: &str) -> usize {
        self.state.entries.remove(key).map_or(0, |_| 1)
    }

    pub fn delete_many<K: AsRef<str>>(&mut self, keys: impl IntoIterator<Item = K>) -> usize {
        keys.into_iter().map(|key| self.delete(key.as_ref())).sum()
    }

    // == Has ==
    /// True if `key` is present and unexpired; evicts it when expired.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Size ==
    /// Entry count, optionally pruning expired entries first.
    pub fn size(&mut self, prune: bool) -> usize {
        if prune {
            self.prune();
        }
        self.len()
    }

    /// Raw entry count, expired-but-unpruned entries included.
    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    // == Prune ==
    /// Removes every expired entry; returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let state = &mut *self.state;
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - state.entries.len();
        state.stats.record_expirations(removed);
        removed
    }

    // == Views ==
    // Copies taken now; later mutation does not affect them. Expired entries
    // that have not been pruned yet are included.

    pub fn keys(&self) -> Vec<String> {
        self.state.entries.keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Record> {
        self.state
            .entries
            .values()
            .map(|entry| entry.value.clone())
            .collect()
    }

    pub fn items(&self) -> Vec<(String, Record)> {
        self.state
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    pub fn snapshot(&self) -> HashMap<String, CacheEntry> {
        self.state.entries.clone()
    }

    pub fn clear(&mut self) {
        self.state.entries.clear();
    }

    // == Save ==
    /// Writes the snapshot to the backing file, or deletes the file when the
    /// cache is empty. Returns whether the disk now matches: file present for
    /// a non-empty cache, absent for an empty one.
    pub fn save(&mut self, prune: bool) -> Result<bool> {
        if prune {
            self.prune();
        }
        let engine = self.engine;
        let _writing = engine
            .save_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        write_snapshot(&engine.path, &self.state.entries)
    }

    // == Load ==
    /// Replaces the in-memory state with the backing file's snapshot (empty if
    /// the file is missing). Returns whether the cache holds any entries.
    pub fn load(&mut self, prune: bool) -> Result<bool> {
        let entries: HashMap<String, CacheEntry> =
            persist::load_mapping(&self.engine.path)?.unwrap_or_default();
        debug!(
            "Loaded {} entries from {}",
            entries.len(),
            self.engine.path.display()
        );
        self.state.entries = entries;

        if prune {
            self.prune();
        }
        Ok(!self.state.entries.is_empty())
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.state.stats.clone();
        stats.set_total_entries(self.state.entries.len());
        stats
    }
}

fn write_snapshot(path: &Path, entries: &HashMap<String, CacheEntry>) -> Result<bool> {
    if entries.is_empty() {
        persist::remove(path)?;
        debug!("Cache empty, removed {}", path.display());
        Ok(!path.exists())
    } else {
        persist::save_mapping(path, entries)?;
        debug!("Saved {} entries to {}", entries.len(), path.display());
        Ok(path.is_file())
    }
}
