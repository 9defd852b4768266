//! In-process session store.

use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use timebill_core::auth::{Session, SessionStore};
use timebill_shared::Clock;
use timebill_shared::types::UserId;

/// Sessions held in a concurrent map, keyed by the SHA-256 of the token.
///
/// Raw tokens are never kept, so a heap dump does not leak usable tokens.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    /// Creates an empty store driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Hashes a session token for use as a map key.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn remove_where(&self, mut pred: impl FnMut(&Session) -> bool) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            if pred(session) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, token: &str, session: Session) {
        self.sessions.insert(Self::hash_token(token), session);
    }

    fn get(&self, token: &str) -> Option<Session> {
        let key = Self::hash_token(token);
        let session = self.sessions.get(&key).map(|entry| entry.value().clone())?;
        if session.is_expired(self.clock.now()) {
            self.sessions.remove(&key);
            return None;
        }
        Some(session)
    }

    fn remove(&self, token: &str) -> bool {
        self.sessions.remove(&Self::hash_token(token)).is_some()
    }

    fn revoke_user(&self, user_id: UserId) -> usize {
        self.remove_where(|s| s.user_id == user_id)
    }

    fn expire(&self) -> usize {
        let now = self.clock.now();
        self.remove_where(|s| s.is_expired(now))
    }
}
