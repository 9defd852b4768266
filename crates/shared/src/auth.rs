//! Session wire types shared by the API and the seeder.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Login request payload.
///
/// `login` is matched against both username and email.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    #[garde(length(min = 1))]
    pub login: String,
    /// Plaintext password.
    #[garde(length(min = 1))]
    pub password: String,
}

/// Opaque session token handed to the client after login.
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    /// Bearer token.
    pub token: String,
    /// When the session stops being accepted.
    pub expires_at: DateTime<Utc>,
}
