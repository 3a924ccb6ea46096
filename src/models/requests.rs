//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::Record;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key, typically a request fingerprint such as a URL
/// - `value`: The JSON object to store
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The record to store
    pub value: Record,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for the ADD operation (POST /add)
#[derive(Debug, Clone, Deserialize)]
pub struct AddRequest {
    pub key: String,
    pub value: Record,
    /// Overwrite a live entry instead of keeping it
    #[serde(default)]
    pub force: bool,
}

impl AddRequest {
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
