//! Integration Tests for the File-Level Cache
//!
//! Freshness by modification time versus freshness by stored record expiry.

use std::collections::HashMap;
use std::fs;
use std::thread::sleep;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use ttl_cache::cache::new_lock;
use ttl_cache::{FileCache, Record};

fn record(v: serde_json::Value) -> Record {
    v.as_object().cloned().unwrap()
}

#[test]
fn test_file_freshness_follows_mtime() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.html");
    let cache = FileCache::default();

    assert!(!cache.has_fresh(&path, 5).unwrap());

    fs::write(&path, "hello").unwrap();
    assert!(cache.has_fresh(&path, 5).unwrap());

    // still fresh, nothing to prune
    assert!(!cache.prune_file(&path, 5).unwrap());
    assert!(path.exists());

    sleep(Duration::from_secs(6));
    assert!(!cache.has_fresh(&path, 5).unwrap());
    assert!(cache.prune_file(&path, 5).unwrap());
    assert!(!path.exists());
}

#[test]
fn test_prune_directory_after_expiry() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(new_lock());
    fs::write(dir.path().join("a.bin"), b"hello").unwrap();

    sleep(Duration::from_secs(3));
    fs::write(dir.path().join("b.bin"), b"hello").unwrap();

    assert_eq!(cache.prune_directory(dir.path(), 2).unwrap(), 1);
    assert!(!dir.path().join("a.bin").exists());
    assert!(dir.path().join("b.bin").exists());
}

#[test]
fn test_record_expiry_is_independent_of_mtime() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("list.json");
    let cache = FileCache::default();

    cache.append_record(&path, record(json!({"age": 0})), 2).unwrap();
    cache
        .append_records(&path, (1..5).map(|age| record(json!({ "age": age }))).collect(), 2)
        .unwrap();
    assert_eq!(cache.load_fresh_records(&path, 5).unwrap().len(), 5);

    sleep(Duration::from_secs(4));

    // touching the file makes it look fresh, yet every record inside has expired
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content).unwrap();
    assert!(cache.has_fresh(&path, 5).unwrap());
    assert!(cache.load_fresh_records(&path, 5).unwrap().is_empty());
}

#[test]
fn test_mapping_records_expire() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.json");
    let cache = FileCache::default();

    cache
        .upsert_mapping_entry(&path, "idx_0", record(json!({"idx_0": 0})), 2)
        .unwrap();
    cache
        .upsert_mapping_entries(
            &path,
            (1..5)
                .map(|i| (format!("idx_{}", i), record(json!({ "v": i }))))
                .collect(),
            2,
        )
        .unwrap();
    assert_eq!(cache.load_fresh_mapping(&path, 5).unwrap().len(), 5);

    sleep(Duration::from_secs(4));
    assert!(cache.load_fresh_mapping(&path, 5).unwrap().is_empty());
}

// == Same Window for Writing and Reading ==

const SECONDS: i64 = 5;

#[test]
fn test_records_live_for_their_window() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("list.json");
    let cache = FileCache::default();

    assert!(cache.load_fresh_records(&path, SECONDS).unwrap().is_empty());
    cache
        .append_record(&path, record(json!({"age": 0})), SECONDS)
        .unwrap();
    cache
        .append_records(
            &path,
            (1..5).map(|age| record(json!({ "age": age }))).collect(),
            SECONDS,
        )
        .unwrap();
    assert_eq!(cache.load_fresh_records(&path, SECONDS).unwrap().len(), 5);

    sleep(Duration::from_millis(2500));
    assert_eq!(cache.load_fresh_records(&path, SECONDS).unwrap().len(), 5);

    sleep(Duration::from_millis(3500));
    assert!(cache.load_fresh_records(&path, SECONDS).unwrap().is_empty());
}

#[test]
fn test_mapping_entries_live_for_their_window() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.json");
    let cache = FileCache::default();

    assert!(cache.load_fresh_mapping(&path, SECONDS).unwrap().is_empty());
    cache
        .upsert_mapping_entry(&path, "idx_0", record(json!({"idx_0": 0})), SECONDS)
        .unwrap();
    let batch: HashMap<String, Record> = (1..5)
        .map(|i| (format!("idx_{}", i), record(json!({ "v": i }))))
        .collect();
    cache.upsert_mapping_entries(&path, batch, SECONDS).unwrap();
    assert_eq!(cache.load_fresh_mapping(&path, SECONDS).unwrap().len(), 5);

    sleep(Duration::from_millis(2500));
    assert_eq!(cache.load_fresh_mapping(&path, SECONDS).unwrap().len(), 5);

    sleep(Duration::from_millis(3500));
    assert!(cache.load_fresh_mapping(&path, SECONDS).unwrap().is_empty());
}

#[test]
fn test_short_ttl_is_not_extended_by_a_longer_read_window() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("list.json");
    let cache = FileCache::default();

    cache
        .append_records(&path, (0..5).map(|i| record(json!({ "i": i }))).collect(), 3)
        .unwrap();
    sleep(Duration::from_secs(4));

    assert!(cache.load_fresh_records(&path, 3).unwrap().is_empty());
    assert!(cache.load_fresh_records(&path, 60).unwrap().is_empty());
}
