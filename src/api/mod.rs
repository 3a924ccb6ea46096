//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a record
//! - `POST /add` - Store a record unless a live one exists
//! - `GET /get/:key` - Retrieve a record by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /keys` - List keys
//! - `POST /prune` - Remove expired entries
//! - `POST /save` - Persist the snapshot
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
