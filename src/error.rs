//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache layers and the HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (only surfaced by the HTTP layer)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Negative TTL or age passed to a clock operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persisted content is not the expected JSON structure
    #[error("Malformed cache file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure while reading, writing or deleting a cache file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a serde_json error with the path it happened on.
    pub fn format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CacheError::Format {
            path: path.into(),
            source,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidArgument(_) | CacheError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Format { .. } | CacheError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
