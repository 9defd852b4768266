//! API route definitions.
//!
//! Authentication is enforced per handler through the `CurrentUser`
//! extractor; only `/health` and `/auth/login` are public.

use axum::Router;

use crate::AppState;

pub mod auth;
pub mod categories;
pub mod clients;
pub mod contracts;
pub mod health;
pub mod maintenance;
pub mod payments;
pub mod projects;
pub mod reports;
pub mod time_entries;
pub mod users;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(clients::routes())
        .merge(contracts::routes())
        .merge(projects::routes())
        .merge(payments::routes())
        .merge(categories::routes())
        .merge(time_entries::routes())
        .merge(reports::routes())
        .merge(maintenance::routes())
}

/// Unwraps a field that a create request must carry.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, crate::error::ApiError> {
    value.ok_or_else(|| crate::error::ApiError::validation(format!("{field} is required")))
}
