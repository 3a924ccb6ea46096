//! Configuration Module
//!
//! Handles loading and managing cache server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding cache files
    pub cache_dir: PathBuf,
    /// Snapshot file name inside `cache_dir`
    pub cache_file: String,
    /// TTL in seconds applied to every entry
    pub default_ttl: i64,
    /// HTTP server port
    pub server_port: u16,
    /// Background prune interval in seconds
    pub cleanup_interval: u64,
    /// Whether the background task also saves the snapshot
    pub autosave: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Cache directory (default: ./cache)
    /// - `CACHE_FILE` - Snapshot file name (default: cache.json)
    /// - `DEFAULT_TTL` - TTL in seconds (default: 604800, seven days)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Prune frequency in seconds (default: 60)
    /// - `AUTOSAVE` - Save on every prune tick (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cache_file: env::var("CACHE_FILE").unwrap_or(defaults.cache_file),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            autosave: parse_var("AUTOSAVE").unwrap_or(defaults.autosave),
        }
    }

    /// Full path of the snapshot file.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(&self.cache_file)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            cache_file: "cache.json".to_string(),
            default_ttl: 86400 * 7,
            server_port: 3000,
            cleanup_interval: 60,
            autosave: true,
        }
    }
}
