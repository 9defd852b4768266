//! Error responses.
//!
//! Every failure leaves the API as `{success: false, message, code}`. Server
//! errors keep their detail in the log and send a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use timebill_core::auth::{AuthError, PasswordError};
use timebill_core::ledger::{Dependents, LedgerError};
use timebill_db::{RepositoryError, StoreError};
use timebill_shared::AppError;
use tracing::{error, warn};

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Any failure a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Boundary errors: auth, role, malformed request.
    App(AppError),
    /// A ledger rule rejected the request.
    Ledger(LedgerError),
    /// An account rule rejected the request.
    Auth(AuthError),
    /// Storage failed.
    Store(StoreError),
    /// Contract deletion needs `force=true`.
    ConfirmationRequired(Dependents),
}

impl ApiError {
    /// 401 with `message`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::App(AppError::Unauthorized(message.into()))
    }

    /// 403 with `message`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::App(AppError::Forbidden(message.into()))
    }

    /// 404 with `message`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::App(AppError::NotFound(message.into()))
    }

    /// 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::App(e) => e.status_code(),
            Self::Ledger(e) => e.http_status_code(),
            Self::Auth(e) => match e {
                AuthError::NotFound(_) => 404,
                AuthError::InvalidCredentials => 401,
                AuthError::Inactive => 403,
                AuthError::Password(PasswordError::Hash(_) | PasswordError::InvalidHash) => 500,
                AuthError::Validation(_)
                | AuthError::Conflict(_)
                | AuthError::Password(PasswordError::TooShort) => 400,
            },
            Self::Store(_) => 500,
            Self::ConfirmationRequired(_) => 400,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn code(&self) -> &'static str {
        match self {
            Self::App(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Auth(e) => match e {
                AuthError::Validation(_) | AuthError::Password(PasswordError::TooShort) => {
                    "VALIDATION_ERROR"
                }
                AuthError::Conflict(_) => "CONFLICT",
                AuthError::NotFound(_) => "NOT_FOUND",
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::Inactive => "ACCOUNT_INACTIVE",
                AuthError::Password(_) => "INTERNAL_ERROR",
            },
            Self::Store(_) => "STORAGE_ERROR",
            Self::ConfirmationRequired(_) => "CONFIRMATION_REQUIRED",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::App(AppError::Unauthorized(m) | AppError::Forbidden(m)) => m.clone(),
            Self::App(e) => e.to_string(),
            Self::Ledger(e) => e.to_string(),
            Self::Auth(e) => e.to_string(),
            Self::Store(e) => e.to_string(),
            Self::ConfirmationRequired(d) => format!(
                "Contract has {} time entries, {} projects and {} payments; repeat with force=true to delete",
                d.time_entries, d.projects, d.payments
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            error!(error = %self.message(), code, "request failed");
            let body = json!({
                "success": false,
                "message": "An internal error occurred",
                "code": code,
            });
            return (status, Json(body)).into_response();
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!(code, status = status.as_u16(), "request rejected");
        }

        let body = match &self {
            Self::ConfirmationRequired(dependents) => json!({
                "success": false,
                "message": self.message(),
                "code": code,
                "requiresConfirmation": true,
                "dependents": dependents,
            }),
            _ => json!({
                "success": false,
                "message": self.message(),
                "code": code,
            }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Ledger(e) => Self::Ledger(e),
            RepositoryError::Auth(e) => Self::Auth(e),
            RepositoryError::Store(e) => Self::Store(e),
        }
    }
}
