//! Ledger repository.
//!
//! Every ledger write runs as load → mutate → save behind the shared write
//! gate, so concurrent requests see each other's effects and IDs handed out
//! as `max + 1` never collide. Reads load fresh without taking the gate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use timebill_core::ledger::{Book, Collection, LedgerError};
use timebill_shared::Clock;
use tracing::debug;

use super::{RepositoryError, WriteGate};
use crate::store::CollectionStore;

/// Ledger repository for loading and mutating the `Book`.
#[derive(Clone)]
pub struct LedgerRepository {
    store: CollectionStore,
    gate: WriteGate,
    clock: Arc<dyn Clock>,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub fn new(store: CollectionStore, gate: WriteGate, clock: Arc<dyn Clock>) -> Self {
        Self { store, gate, clock }
    }

    /// Current time according to the repository's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Loads a snapshot of every ledger collection.
    ///
    /// # Errors
    ///
    /// Returns an error if any collection cannot be read.
    pub async fn read(&self) -> Result<Book, RepositoryError> {
        let (clients, contracts, projects, time_entries, payments, categories) = tokio::try_join!(
            self.store.load(Collection::Clients),
            self.store.load(Collection::Contracts),
            self.store.load(Collection::Projects),
            self.store.load(Collection::TimeEntries),
            self.store.load(Collection::Payments),
            self.store.load(Collection::Categories),
        )?;
        Ok(Book::from_collections(
            clients,
            contracts,
            projects,
            time_entries,
            payments,
            categories,
            self.clock.now(),
        ))
    }

    /// Runs `op` against a freshly loaded book and saves what it touched.
    ///
    /// Nothing is written when `op` fails.
    ///
    /// # Errors
    ///
    /// The operation's `LedgerError`, or a storage error.
    pub async fn mutate<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Book, DateTime<Utc>) -> Result<T, LedgerError>,
    {
        let _guard = self.gate.lock().await;
        let mut book = self.read().await?;
        let value = op(&mut book, self.clock.now())?;
        self.save_dirty(&book).await?;
        Ok(value)
    }

    async fn save_dirty(&self, book: &Book) -> Result<(), RepositoryError> {
        for collection in book.dirty() {
            debug!(%collection, "saving collection");
            match collection {
                Collection::Clients => self.store.save(collection, &book.clients).await?,
                Collection::Contracts => self.store.save(collection, &book.contracts).await?,
                Collection::Projects => self.store.save(collection, &book.projects).await?,
                Collection::TimeEntries => {
                    self.store.save(collection, &book.time_entries).await?;
                }
                Collection::Payments => self.store.save(collection, &book.payments).await?,
                Collection::Categories => self.store.save(collection, &book.categories).await?,
                Collection::Users => {}
            }
        }
        Ok(())
    }
}
