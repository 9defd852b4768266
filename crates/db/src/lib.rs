//! Storage layer: JSON entity collections and repositories.
//!
//! This crate provides:
//! - `CollectionStore`, one JSON document per collection via OpenDAL
//! - Repositories that serialise writes behind a shared gate
//! - The in-process session store
//! - First-run bootstrap

pub mod repositories;
pub mod store;

pub use repositories::{
    InMemorySessionStore, LedgerRepository, RepositoryError, UserRepository, WriteGate,
};
pub use store::{CollectionStore, StoreError};

use std::sync::Arc;

use timebill_core::auth::{NewUser, Role, User, UserDirectory};
use timebill_shared::Clock;
use timebill_shared::config::BootstrapConfig;
use tracing::{info, warn};

/// Both repositories over one store and one write gate.
#[derive(Clone)]
pub struct Repositories {
    /// Ledger collections.
    pub ledger: LedgerRepository,
    /// User accounts.
    pub users: UserRepository,
}

impl Repositories {
    /// Wires the repositories to `store`, sharing a single write gate.
    #[must_use]
    pub fn new(store: CollectionStore, clock: Arc<dyn Clock>) -> Self {
        let gate = WriteGate::new();
        Self {
            ledger: LedgerRepository::new(store.clone(), gate.clone(), Arc::clone(&clock)),
            users: UserRepository::new(store, gate, clock),
        }
    }
}

/// Prepares an empty or existing store for serving.
///
/// Persists the General category if missing and, when no user exists and a
/// password is configured, creates the first admin. Returns that admin.
///
/// # Errors
///
/// Returns an error on storage failure or an invalid admin account.
pub async fn bootstrap(
    repos: &Repositories,
    config: &BootstrapConfig,
) -> Result<Option<User>, RepositoryError> {
    repos.ledger.mutate(|_, _| Ok(())).await?;

    let created = repos
        .users
        .mutate(|users, now| {
            if !users.is_empty() {
                return Ok(None);
            }
            let Some(password) = config.admin_password.clone() else {
                return Ok(None);
            };
            let admin = NewUser {
                username: config.admin_username.clone(),
                email: config.admin_email.clone(),
                password,
                full_name: Some("Administrator".to_string()),
                role: Some(Role::Admin),
            };
            UserDirectory::create(users, admin, now).map(Some)
        })
        .await?;

    match &created {
        Some(admin) => info!(user_id = %admin.id, username = %admin.username, "bootstrap admin created"),
        None => {
            if repos.users.list().await?.is_empty() {
                warn!("no users exist and no bootstrap admin password is configured");
            }
        }
    }
    Ok(created)
}
