//! Persistent Store Adapter
//!
//! Whole-file JSON load/save for keyed mappings and ordered sequences.
//! A missing file loads as `None`; saves replace the file atomically.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

// == Load Mapping ==
/// Loads a string-keyed mapping from `path`.
///
/// # Returns
/// * `Ok(None)` if the file does not exist
/// * `Ok(Some(map))` with the deserialized mapping
/// * `Err(CacheError::Format)` if the content is not a JSON object of `T`
pub fn load_mapping<T: DeserializeOwned>(path: &Path) -> Result<Option<HashMap<String, T>>> {
    load_json(path)
}

// == Save Mapping ==
/// Serializes the full mapping and atomically replaces `path` with it.
pub fn save_mapping<T: Serialize>(path: &Path, mapping: &HashMap<String, T>) -> Result<()> {
    save_json(path, mapping)
}

// == Load Sequence ==
/// Loads an ordered list of records from `path`; same contract as [`load_mapping`].
pub fn load_sequence<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    load_json(path)
}

// == Save Sequence ==
/// Serializes the full list and atomically replaces `path` with it.
pub fn save_sequence<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    save_json(path, records)
}

// == Remove ==
/// Deletes `path`. Returns whether a file was removed; a missing file is not an error.
pub fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(path, e)),
    };

    let data = serde_json::from_str(&content).map_err(|e| CacheError::format(path, e))?;
    debug!("Loaded cache file {}", path.display());
    Ok(Some(data))
}

/// Writes to a temp file beside `path`, then renames it over `path`, so a
/// concurrent reader sees either the old or the new snapshot.
fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

    let json = serde_json::to_vec_pretty(data).map_err(|e| CacheError::format(path, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
    tmp.write_all(&json)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CacheError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| CacheError::io(path, e.error))?;

    debug!("Saved cache file {} ({} bytes)", path.display(), json.len());
    Ok(())
}
