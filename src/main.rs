//! TTL Cache - A thread-safe time-to-live cache server
//!
//! Serves the in-memory TTL cache over HTTP and keeps its snapshot on disk.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::api::create_router;
use ttl_cache::{spawn_cleanup_task, AppState, CacheEngine, Config};

/// Main entry point for the TTL cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache engine, hydrating from the snapshot file
/// 4. Start background TTL cleanup task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop the cleanup task and save a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TTL Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_path={}, default_ttl={}s, port={}, cleanup_interval={}s, autosave={}",
        config.cache_path().display(),
        config.default_ttl,
        config.server_port,
        config.cleanup_interval,
        config.autosave
    );

    let state = AppState::from_config(&config).with_context(|| {
        format!(
            "failed to open cache at {}",
            config.cache_path().display()
        )
    })?;
    let cache: Arc<CacheEngine> = Arc::clone(&state.cache);

    let cleanup_handle =
        spawn_cleanup_task(cache.clone(), config.cleanup_interval, config.autosave);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    let persisted = tokio::task::spawn_blocking(move || cache.save(true))
        .await
        .context("final save task failed")?
        .context("failed to save cache snapshot")?;
    info!("Final snapshot saved (persisted={})", persisted);

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
