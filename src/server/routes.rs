//! Router construction

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

use super::config::ServerConfig;
use super::handlers;
use crate::relay::Relay;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub config: Arc<ServerConfig>,
    /// Present when `max_connections` is non-zero
    pub connection_limit: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(relay: Arc<Relay>, config: ServerConfig) -> Self {
        let connection_limit = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            relay,
            config: Arc::new(config),
            connection_limit,
        }
    }
}

/// Build the relay router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/stream/:kind", post(handlers::upload))
        .route("/view", get(handlers::view))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
