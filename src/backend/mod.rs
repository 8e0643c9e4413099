//! HTTP server exposing the metadata and download relay endpoints
//!
//! Handlers are stateless per request. The only shared pieces are the stream
//! source and the permit pool that caps how many relays run at once.

pub mod error;
pub mod handlers;

use crate::extractor::Extractor;
use crate::utils::config::AppSettings;
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::{ApiError, ErrorFormat};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn Extractor>,
    pub relay_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(extractor: Arc<dyn Extractor>, max_concurrent_relays: usize) -> Self {
        Self {
            extractor,
            relay_permits: Arc::new(Semaphore::new(max_concurrent_relays.max(1))),
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/video-info", get(handlers::video_info))
        .route("/api/download", get(handlers::download))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn serve(settings: &AppSettings, extractor: Arc<dyn Extractor>) -> Result<()> {
    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    let state = AppState::new(extractor, settings.max_concurrent_relays);
    serve_on(listener, state).await
}

/// Serve the API on an already-bound listener
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(
        "Starting server on http://{} (extractor: {})",
        addr,
        state.extractor.id()
    );
    info!("  /api/video-info  - Video metadata (JSON)");
    info!("  /api/download    - Stream relay");
    info!("  /health          - Health check");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
