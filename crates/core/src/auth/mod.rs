//! Authentication and access control.
//!
//! This module provides:
//! - Password policy and Argon2id hashing
//! - User roles and what each may do
//! - User records and the rules for managing them
//! - Sessions and the `SessionStore` seam

mod password;
mod session;
mod user;

pub use password::{MIN_PASSWORD_LENGTH, PasswordError, check_password, hash_password, verify_password};
pub use session::{Session, SessionStore, new_session_token};
pub use user::{AuthError, NewUser, User, UserDirectory, UserPatch, UserProfile};

use serde::{Deserialize, Serialize};

/// What a signed-in user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access.
    Admin,
    /// Records time and money; cannot delete clients, contracts or projects.
    #[default]
    Collaborator,
    /// Read-only.
    Client,
}

impl Role {
    /// Returns true if this role can create and edit ledger records.
    #[must_use]
    pub const fn can_write_ledger(&self) -> bool {
        matches!(self, Self::Admin | Self::Collaborator)
    }

    /// Returns true if this role can delete clients, contracts and projects.
    #[must_use]
    pub const fn can_delete_records(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can manage users.
    #[must_use]
    pub const fn can_manage_users(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can manage categories.
    #[must_use]
    pub const fn can_manage_categories(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can run maintenance jobs.
    #[must_use]
    pub const fn can_run_maintenance(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Collaborator => write!(f, "collaborator"),
            Self::Client => write!(f, "client"),
        }
    }
}
