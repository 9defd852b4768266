//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether the collection store answered.
    pub storage_ok: bool,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_ok = state.repos.ledger.read().await.is_ok();
    Json(HealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage_ok,
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
