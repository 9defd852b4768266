//! Application-wide error types.

use thiserror::Error;

/// Errors raised at the HTTP boundary, before any domain rule runs.
///
/// Domain failures carry their own error types; these cover sessions, roles,
/// malformed requests and unknown routes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or expired session.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role does not allow the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// No such resource or route.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}
