//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats, Record};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored record
    pub value: Record,
    /// Seconds until the entry expires, omitted when it never does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_remaining: Option<i64>,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, entry: CacheEntry) -> Self {
        Self {
            key: key.into(),
            ttl_remaining: entry.ttl_remaining(),
            value: entry.value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the ADD operation (POST /add)
#[derive(Debug, Clone, Serialize)]
pub struct AddResponse {
    pub key: String,
    /// False when a live entry was kept
    pub stored: bool,
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was deleted
    pub key: String,
    /// Number of entries removed (0 or 1)
    pub deleted: usize,
}

/// Response body for GET /keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

/// Response body for POST /prune
#[derive(Debug, Clone, Serialize)]
pub struct PruneResponse {
    /// Number of expired entries removed
    pub removed: usize,
}

/// Response body for POST /save
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    /// Whether the file on disk matches the cache (present if non-empty, absent if empty)
    pub persisted: bool,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries removed by TTL expiry
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let value = json!({"status": 200}).as_object().cloned().unwrap();
        let resp = GetResponse::new("test_key", CacheEntry::new(value.clone(), None));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"key": "test_key", "value": {"status": 200}}));

        let expiry = crate::cache::clock::now() + 30;
        let resp = GetResponse::new("test_key", CacheEntry::new(value, Some(expiry)));
        let remaining = serde_json::to_value(&resp).unwrap()["ttl_remaining"]
            .as_i64()
            .unwrap();
        assert!((29..=30).contains(&remaining));
    }

    #[test]
    fn test_set_response_names_key() {
        let json = serde_json::to_value(SetResponse::new("https://example.com")).unwrap();
        assert_eq!(
            json["message"],
            json!("Key 'https://example.com' set successfully")
        );
    }

    #[test]
    fn test_add_prune_save_shapes() {
        let add = AddResponse {
            key: "k".to_string(),
            stored: false,
        };
        assert_eq!(
            serde_json::to_value(&add).unwrap(),
            json!({"key": "k", "stored": false})
        );
        assert_eq!(
            serde_json::to_value(PruneResponse { removed: 3 }).unwrap(),
            json!({"removed": 3})
        );
        assert_eq!(
            serde_json::to_value(SaveResponse { persisted: true }).unwrap(),
            json!({"persisted": true})
        );
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse {
            key: "gone".to_string(),
            deleted: 0,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"key": "gone", "deleted": 0}));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            expirations: 5,
            total_entries: 100,
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.expirations, 5);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::new());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_and_error_fields() {
        let health = serde_json::to_value(HealthResponse::healthy()).unwrap();
        assert_eq!(health["status"], json!("healthy"));
        assert!(health["timestamp"].is_string());

        let error = serde_json::to_value(ErrorResponse::new("Key 'k' not found")).unwrap();
        assert_eq!(error, json!({"error": "Key 'k' not found"}));
    }
}
