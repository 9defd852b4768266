//! Login sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use timebill_shared::types::UserId;
use uuid::Uuid;

use super::Role;
use super::user::User;

/// A signed-in user, as remembered between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Who is signed in.
    pub user_id: UserId,
    /// Username at login time.
    pub username: String,
    /// Role at login time.
    pub role: Role,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// End of validity.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for `user` lasting `ttl`, capped at the latest
    /// representable instant.
    #[must_use]
    pub fn open(user: &User, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// True once `now` reaches `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A fresh opaque session token.
#[must_use]
pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Where sessions live between requests.
///
/// Implementations decide expiry against their own clock: `get` never
/// returns an expired session.
pub trait SessionStore: Send + Sync {
    /// Stores `session` under `token`, replacing any previous one.
    fn put(&self, token: &str, session: Session);

    /// Live session for `token`. Expired sessions are evicted and `None` returned.
    fn get(&self, token: &str) -> Option<Session>;

    /// Forgets `token`. Returns whether it existed.
    fn remove(&self, token: &str) -> bool;

    /// Forgets every session of `user_id`. Returns how many were dropped.
    fn revoke_user(&self, user_id: UserId) -> usize;

    /// Drops every expired session. Returns how many were dropped.
    fn expire(&self) -> usize;
}
