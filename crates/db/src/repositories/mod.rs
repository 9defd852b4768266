//! Repository layer for collection access.

mod ledger;
mod session;
mod user;

pub use ledger::LedgerRepository;
pub use session::InMemorySessionStore;
pub use user::UserRepository;

use std::sync::Arc;

use thiserror::Error;
use timebill_core::auth::AuthError;
use timebill_core::ledger::LedgerError;
use tokio::sync::{Mutex, MutexGuard};

use crate::store::StoreError;

/// Errors surfaced by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A ledger rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// An account rule rejected the operation.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Single-writer gate shared by every repository that writes.
///
/// Holding it across load, mutate and save makes each write atomic with
/// respect to other writes in this process.
#[derive(Debug, Clone, Default)]
pub struct WriteGate(Arc<Mutex<()>>);

impl WriteGate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive write access.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}
