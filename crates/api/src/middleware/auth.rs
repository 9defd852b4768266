//! Session authentication for protected routes.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use timebill_core::auth::{Role, Session};
use timebill_shared::types::UserId;

use crate::{AppState, error::ApiError};

/// Name of the cookie set by login.
pub const SESSION_COOKIE: &str = "session_token";

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Session token from the Authorization header, falling back to the cookie.
pub fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);
    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// The signed-in user behind a request.
///
/// Use this in handlers that require a live session:
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> impl IntoResponse {
///     user.require_ledger_write()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Session the request presented.
    pub session: Session,
    /// Raw token, kept for logout.
    pub token: String,
}

impl CurrentUser {
    /// Returns the user ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    /// Returns the user's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.session.role
    }

    /// Fails unless the role may create and edit ledger records.
    pub fn require_ledger_write(&self) -> Result<(), ApiError> {
        self.check(self.role().can_write_ledger(), "Read-only account")
    }

    /// Fails unless the role may delete clients, contracts and projects.
    pub fn require_delete(&self) -> Result<(), ApiError> {
        self.check(
            self.role().can_delete_records(),
            "Only administrators can delete this record",
        )
    }

    /// Fails unless the role may manage categories.
    pub fn require_category_admin(&self) -> Result<(), ApiError> {
        self.check(
            self.role().can_manage_categories(),
            "Only administrators can manage categories",
        )
    }

    /// Fails unless the role may manage users.
    pub fn require_user_admin(&self) -> Result<(), ApiError> {
        self.check(
            self.role().can_manage_users(),
            "Only administrators can manage users",
        )
    }

    /// Fails unless the role may run maintenance jobs.
    pub fn require_maintenance(&self) -> Result<(), ApiError> {
        self.check(
            self.role().can_run_maintenance(),
            "Only administrators can run maintenance",
        )
    }

    fn check(&self, allowed: bool, message: &str) -> Result<(), ApiError> {
        if allowed {
            Ok(())
        } else {
            tracing::info!(user_id = %self.user_id(), role = %self.role(), "permission denied");
            Err(ApiError::forbidden(message))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        let session = state
            .sessions
            .get(&token)
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))?;
        Ok(Self { session, token })
    }
}
