//! API Handlers
//!
//! HTTP request handlers exposing the cache engine to collaborators that
//! key responses by request fingerprint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::CacheEngine;
use crate::error::{CacheError, Result};
use crate::models::{
    AddRequest, AddResponse, DeleteResponse, GetResponse, HealthResponse, KeysResponse,
    PruneResponse, SaveResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The engine does its own locking, so a plain `Arc` is enough.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache engine
    pub cache: Arc<CacheEngine>,
}

impl AppState {
    /// Creates a new AppState around an opened engine.
    pub fn new(cache: CacheEngine) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Opens the engine described by the configuration.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let cache = CacheEngine::open(config.cache_path(), config.default_ttl)?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a record under a key, overwriting any existing entry.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key.clone(), req.value);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for POST /add
///
/// Stores a record only if the key is absent or expired, unless `force` is set.
pub async fn add_handler(
    State(state): State<AppState>,
    Json(req): Json<AddRequest>,
) -> Result<Json<AddResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let stored = state.cache.add(req.key.clone(), req.value, req.force);

    Ok(Json(AddResponse {
        key: req.key,
        stored,
    }))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let entry = state
        .cache
        .get_entry(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, entry)))
}

/// Handler for DELETE /del/:key
///
/// Deleting a missing key is not an error; `deleted` is 0.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.cache.delete(&key);

    Json(DeleteResponse { key, deleted })
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let mut keys = state.cache.keys();
    keys.sort();
    Json(KeysResponse { keys })
}

/// Handler for POST /prune
pub async fn prune_handler(State(state): State<AppState>) -> Json<PruneResponse> {
    let removed = state.cache.prune();
    Json(PruneResponse { removed })
}

/// Handler for POST /save
///
/// Runs the file write on the blocking pool.
pub async fn save_handler(State(state): State<AppState>) -> Result<Json<SaveResponse>> {
    let cache = Arc::clone(&state.cache);
    let persisted = tokio::task::spawn_blocking(move || cache.save(true))
        .await
        .map_err(|e| {
            CacheError::io(
                state.cache.path(),
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )
        })??;

    Ok(Json(SaveResponse { persisted }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
