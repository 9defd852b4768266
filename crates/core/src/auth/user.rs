//! User accounts.
//!
//! `UserDirectory` applies the account rules to the user collection the same
//! way `LedgerService` does for the ledger: pure functions over a loaded
//! `Vec<User>`, persisted by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use timebill_shared::types::UserId;

use super::Role;
use super::password::{PasswordError, check_password, hash_password, verify_password};
use crate::ledger::validation::{optional_text, require_email, same_name};

/// Errors from account management and login.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed field.
    #[error("{0}")]
    Validation(String),

    /// Username or email taken.
    #[error("{0}")]
    Conflict(String),

    /// Unknown user.
    #[error("User not found: {0}")]
    NotFound(UserId),

    /// Wrong login or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account disabled.
    #[error("Account is inactive")]
    Inactive,

    /// Password policy or hashing failure.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Login name, unique ignoring case.
    pub username: String,
    /// Email, unique ignoring case; also accepted as login.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Access level.
    pub role: Role,
    /// Inactive users cannot log in.
    pub is_active: bool,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Last successful login.
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A user as shown to clients: everything but the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email.
    pub email: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Access level.
    pub role: Role,
    /// Active flag.
    pub is_active: bool,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Access level; collaborator when absent.
    pub role: Option<Role>,
}

/// Partial user update.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    /// New email.
    pub email: Option<String>,
    /// New display name; blank clears.
    pub full_name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New plaintext password.
    pub password: Option<String>,
}

/// Account rules over the user collection.
pub struct UserDirectory;

impl UserDirectory {
    /// Creates a user.
    ///
    /// # Errors
    ///
    /// `Validation`, `Conflict` on a taken username or email, or `Password`.
    pub fn create(
        users: &mut Vec<User>,
        input: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let username = input.username.trim().to_string();
        if username.len() < 3 {
            return Err(AuthError::Validation(
                "username must be at least 3 characters".to_string(),
            ));
        }
        let email = require_email(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        // Login accepts either field, so a username may not collide with
        // anyone's email and vice versa.
        if users
            .iter()
            .any(|u| same_name(&u.username, &username) || same_name(&u.email, &username))
        {
            return Err(AuthError::Conflict(format!("Username already exists: {username}")));
        }
        ensure_unique_email(users, &email, None)?;
        check_password(&input.password)?;

        let user = User {
            id: UserId::next_after(users.iter().map(|u| u.id)),
            username,
            email,
            full_name: optional_text(input.full_name),
            role: input.role.unwrap_or_default(),
            is_active: true,
            password_hash: hash_password(&input.password)?,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    /// Patches a user.
    ///
    /// The last active admin cannot be demoted or deactivated.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation`, `Conflict`, or `Password`.
    pub fn update(
        users: &mut [User],
        id: UserId,
        patch: UserPatch,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let current = users
            .iter()
            .find(|u| u.id == id)
            .ok_or(AuthError::NotFound(id))?
            .clone();

        let email = patch
            .email
            .as_deref()
            .map(require_email)
            .transpose()
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if let Some(email) = &email {
            ensure_unique_email(users, email, Some(id))?;
        }

        let loses_admin = current.role == Role::Admin
            && current.is_active
            && (patch.role.is_some_and(|r| r != Role::Admin) || patch.is_active == Some(false));
        if loses_admin && active_admins(users) <= 1 {
            return Err(AuthError::Validation(
                "At least one active admin is required".to_string(),
            ));
        }

        let password_hash = match patch.password.as_deref() {
            Some(password) => {
                check_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AuthError::NotFound(id))?;
        if let Some(email) = email {
            user.email = email;
        }
        if patch.full_name.is_some() {
            user.full_name = optional_text(patch.full_name);
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        user.updated_at = now;
        Ok(user.clone())
    }

    /// Deletes a user other than `acting` and other than the last active admin.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Validation`.
    pub fn delete(users: &mut Vec<User>, id: UserId, acting: UserId) -> Result<User, AuthError> {
        if id == acting {
            return Err(AuthError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(AuthError::NotFound(id))?;
        let target = &users[index];
        if target.role == Role::Admin && target.is_active && active_admins(users) <= 1 {
            return Err(AuthError::Validation(
                "At least one active admin is required".to_string(),
            ));
        }
        Ok(users.remove(index))
    }

    /// Checks credentials and stamps `last_login_at`.
    ///
    /// `login` matches a username or an email, ignoring case.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown login or wrong password, `Inactive`
    /// for a disabled account.
    pub fn authenticate(
        users: &mut [User],
        login: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let login = login.trim();
        let user = users
            .iter_mut()
            .find(|u| same_name(&u.username, login) || same_name(&u.email, login))
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        user.last_login_at = Some(now);
        Ok(user.clone())
    }
}

fn ensure_unique_email(users: &[User], email: &str, except: Option<UserId>) -> Result<(), AuthError> {
    if users
        .iter()
        .any(|u| {
            Some(u.id) != except && (same_name(&u.email, email) || same_name(&u.username, email))
        })
    {
        return Err(AuthError::Conflict(format!("Email already exists: {email}")));
    }
    Ok(())
}

fn active_admins(users: &[User]) -> usize {
    users
        .iter()
        .filter(|u| u.role == Role::Admin && u.is_active)
        .count()
}
