//! User repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use timebill_core::auth::{AuthError, User};
use timebill_core::ledger::Collection;
use timebill_shared::Clock;
use timebill_shared::types::UserId;

use super::{RepositoryError, WriteGate};
use crate::store::CollectionStore;

/// User repository over the `users` collection.
#[derive(Clone)]
pub struct UserRepository {
    store: CollectionStore,
    gate: WriteGate,
    clock: Arc<dyn Clock>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub fn new(store: CollectionStore, gate: WriteGate, clock: Arc<dyn Clock>) -> Self {
        Self { store, gate, clock }
    }

    /// Lists every user, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.store.load(Collection::Users).await?;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// `AuthError::NotFound` for an unknown ID, or a storage error.
    pub async fn find(&self, id: UserId) -> Result<User, RepositoryError> {
        self.list()
            .await?
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(|| AuthError::NotFound(id).into())
    }

    /// Runs `op` against the loaded users and saves them when it succeeds.
    ///
    /// # Errors
    ///
    /// The operation's `AuthError`, or a storage error.
    pub async fn mutate<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Vec<User>, DateTime<Utc>) -> Result<T, AuthError>,
    {
        let _guard = self.gate.lock().await;
        let mut users = self.list().await?;
        let value = op(&mut users, self.clock.now())?;
        self.store.save(Collection::Users, &users).await?;
        Ok(value)
    }
}
