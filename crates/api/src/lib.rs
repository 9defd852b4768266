//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Session authentication
//! - Request extractors
//! - Response envelopes and error mapping

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, Uri};
use timebill_core::auth::SessionStore;
use timebill_db::Repositories;
use timebill_shared::Clock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger and user repositories.
    pub repos: Repositories,
    /// Live sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Time source for "today" defaults and session expiry.
    pub clock: Arc<dyn Clock>,
    /// Lifetime of new sessions.
    pub session_ttl: chrono::Duration,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn unknown_route(method: Method, uri: Uri) -> error::ApiError {
    error::ApiError::not_found(format!("{method} {}", uri.path()))
}
