//! Greeting, health and metrics handlers.

use axum::{extract::State, http::header, response::IntoResponse, Json};

use crate::http::HttpState;

/// Root endpoint.
pub async fn greeting() -> &'static str {
    "Hello from graphdump-publisher"
}

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let body = state.app.metrics.render();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
