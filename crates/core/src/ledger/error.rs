//! Ledger error types.
//!
//! Every rejection the ledger engine can produce. None of them are fatal:
//! the API layer turns each into a `{success: false, message}` response.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Missing or malformed required field.
    #[error("{0}")]
    Validation(String),

    /// Referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "Contract".
        entity: &'static str,
        /// Requested ID.
        id: i64,
    },

    /// Unique value already taken.
    #[error("{0}")]
    Conflict(String),

    /// Time entry would push a contract past its hour budget.
    #[error("Insufficient hours on contract: requested {requested}, only {remaining} hours remaining")]
    InsufficientHours {
        /// Hours the entry asked for.
        requested: Decimal,
        /// Hours still available on the contract.
        remaining: Decimal,
    },

    /// Delete blocked by referencing records.
    #[error("{0}")]
    HasDependents(String),

    /// Record can never be deleted.
    #[error("{0}")]
    Protected(String),
}

impl LedgerError {
    /// Shorthand for `Validation`.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for `NotFound`.
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InsufficientHours { .. } => "INSUFFICIENT_HOURS",
            Self::HasDependents(_) => "HAS_DEPENDENTS",
            Self::Protected(_) => "PROTECTED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_)
            | Self::Conflict(_)
            | Self::InsufficientHours { .. }
            | Self::HasDependents(_)
            | Self::Protected(_) => 400,
        }
    }
}
