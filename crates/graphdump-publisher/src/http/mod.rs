//! HTTP server for the publisher.
//!
//! Provides endpoints for:
//! - Delta notifications (`/delta`)
//! - Greeting (`/`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::pipeline::Pipeline;
use crate::state::AppState;

mod handlers;
pub mod responses;

/// Largest accepted delta body.
pub const DELTA_BODY_LIMIT: usize = 500 * 1024 * 1024;

/// State shared by the handlers.
#[derive(Clone)]
pub struct HttpState {
    pub app: Arc<AppState>,
    pub pipeline: Pipeline,
}

impl HttpState {
    pub fn new(app: Arc<AppState>) -> Self {
        let pipeline = Pipeline::new(app.clone());
        Self { app, pipeline }
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::greeting))
        .route(
            "/delta",
            post(handlers::receive_delta).layer(DefaultBodyLimit::max(DELTA_BODY_LIMIT)),
        )
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(HttpState::new(state))
}
