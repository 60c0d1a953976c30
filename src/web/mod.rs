//! Web server module.

mod handlers;

pub use handlers::*;

use crate::cache::SnapshotCache;
use crate::config::ServerConfig;

use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub cache: Arc<SnapshotCache>,
}

/// Web server for the exporter.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server reading from the given cache.
    pub fn new(config: ServerConfig, cache: Arc<SnapshotCache>) -> Self {
        Self {
            state: AppState { config, cache },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::handle_index))
            .route(&self.state.config.telemetry_path, get(handlers::handle_metrics))
            .route("/healthz", get(handlers::handle_healthz))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.routes();
        let listener = tokio::net::TcpListener::bind(&self.state.config.listen_address).await?;

        tracing::info!("Web server listening on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
