//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::clock::{self, Timestamp};

/// Opaque structured record stored by the caches: a JSON object.
pub type Record = Map<String, Value>;

/// Key injected into every persisted record to carry its absolute expiry.
pub const EXPIRY_FIELD: &str = "cache_expiry";

/// Key the file cache writes alongside the expiry: when the record was stored.
pub const STAMPED_FIELD: &str = "cache_time";

// == Cache Entry ==
/// Represents a single cache entry with value and expiry.
///
/// On disk the entry is the caller's record with one extra `cache_expiry` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored record
    #[serde(flatten)]
    pub value: Record,
    /// Expiration timestamp (Unix seconds), None = no expiry recorded
    #[serde(rename = "cache_expiry", default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry expiring at the given absolute timestamp.
    pub fn new(mut value: Record, expiry: Option<Timestamp>) -> Self {
        // A stale stamp from a previous round-trip must not shadow the real expiry.
        value.remove(EXPIRY_FIELD);
        Self { value, expiry }
    }

    // == Is Expired ==
    /// Checks if the entry has expired (`now >= expiry`).
    pub fn is_expired(&self) -> bool {
        clock::is_expired(self.expiry)
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, or None if no expiry is recorded.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining)` if the entry hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<i64> {
        self.expiry.map(|expiry| (expiry - clock::now()).max(0))
    }
}

// == Record Stamps ==
/// Reads the `cache_expiry` stamp of a record, if any.
pub fn record_expiry(record: &Record) -> Option<Timestamp> {
    record.get(EXPIRY_FIELD).and_then(Value::as_i64)
}

/// Reads the `cache_time` stamp of a record, if any.
pub fn record_stamped_at(record: &Record) -> Option<Timestamp> {
    record.get(STAMPED_FIELD).and_then(Value::as_i64)
}

/// Writes the `cache_time` and `cache_expiry` stamps into a record.
pub fn stamp_record(record: &mut Record, stamped_at: Timestamp, expiry: Timestamp) {
    record.insert(STAMPED_FIELD.to_string(), Value::from(stamped_at));
    record.insert(EXPIRY_FIELD.to_string(), Value::from(expiry));
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_entry_creation_no_expiry() {
        let entry = CacheEntry::new(record(json!({"name": "a"})), None);

        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_entry_creation_with_expiry() {
        let entry = CacheEntry::new(record(json!({"name": "a"})), Some(clock::now() + 10));

        assert!(!entry.is_expired());
        let remaining = entry.ttl_remaining().unwrap();
        assert!((9..=10).contains(&remaining));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(Record::new(), Some(clock::now()));

        assert!(entry.is_expired(), "Entry should be expired at boundary");
        assert_eq!(entry.ttl_remaining(), Some(0));
    }

    #[test]
    fn test_serialized_shape_injects_expiry() {
        let entry = CacheEntry::new(record(json!({"url": "https://x", "n": 1})), Some(42));
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value, json!({"url": "https://x", "n": 1, "cache_expiry": 42}));
    }

    #[test]
    fn test_deserialize_strips_expiry_from_value() {
        let entry: CacheEntry =
            serde_json::from_value(json!({"url": "https://x", "cache_expiry": 7})).unwrap();

        assert_eq!(entry.expiry, Some(7));
        assert_eq!(entry.value, record(json!({"url": "https://x"})));
    }

    #[test]
    fn test_deserialize_without_expiry() {
        let entry: CacheEntry = serde_json::from_value(json!({"url": "https://x"})).unwrap();
        assert_eq!(entry.expiry, None);
    }

    #[test]
    fn test_new_drops_stale_stamp() {
        let entry = CacheEntry::new(record(json!({"a": 1, "cache_expiry": 1})), Some(99));
        assert!(!entry.value.contains_key(EXPIRY_FIELD));
        assert_eq!(entry.expiry, Some(99));
    }

    #[test]
    fn test_record_stamps() {
        let mut rec = record(json!({"a": 1}));
        assert_eq!(record_expiry(&rec), None);
        assert_eq!(record_stamped_at(&rec), None);

        stamp_record(&mut rec, 1000, 1234);
        assert_eq!(record_stamped_at(&rec), Some(1000));
        assert_eq!(record_expiry(&rec), Some(1234));
        assert_eq!(rec["a"], json!(1));
    }
}
