//! The in-memory ledger: every collection the engine reads or writes.
//!
//! A `Book` is loaded whole, mutated by `LedgerService`, and only the
//! collections marked dirty are written back.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timebill_shared::types::{
    CategoryId, ClientId, ContractId, PaymentId, ProjectId, TimeEntryId,
};

use super::error::LedgerError;
use super::types::{Category, Client, Contract, Payment, Project, TimeEntry};

/// Name of a persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Clients.
    Clients,
    /// Contracts.
    Contracts,
    /// Projects.
    Projects,
    /// Time entries.
    TimeEntries,
    /// Payments.
    Payments,
    /// Categories.
    Categories,
    /// Users (owned by the user directory, not the `Book`).
    Users,
}

impl Collection {
    /// Collections held in a `Book`.
    pub const LEDGER: [Self; 6] = [
        Self::Clients,
        Self::Contracts,
        Self::Projects,
        Self::TimeEntries,
        Self::Payments,
        Self::Categories,
    ];

    /// Storage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Contracts => "contracts",
            Self::Projects => "projects",
            Self::TimeEntries => "time_entries",
            Self::Payments => "payments",
            Self::Categories => "categories",
            Self::Users => "users",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// All ledger collections plus the set modified since load.
#[derive(Debug, Clone, Default)]
pub struct Book {
    /// Clients.
    pub clients: Vec<Client>,
    /// Contracts.
    pub contracts: Vec<Contract>,
    /// Projects.
    pub projects: Vec<Project>,
    /// Time entries.
    pub time_entries: Vec<TimeEntry>,
    /// Payments.
    pub payments: Vec<Payment>,
    /// Categories.
    pub categories: Vec<Category>,
    dirty: BTreeSet<Collection>,
}

macro_rules! lookup {
    ($get:ident, $get_mut:ident, $field:ident, $ty:ty, $id:ty, $entity:literal) => {
        /// Finds a record by ID.
        pub fn $get(&self, id: $id) -> Result<&$ty, LedgerError> {
            self.$field
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| LedgerError::not_found($entity, id))
        }

        /// Finds a record by ID for mutation.
        pub fn $get_mut(&mut self, id: $id) -> Result<&mut $ty, LedgerError> {
            self.$field
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| LedgerError::not_found($entity, id))
        }
    };
}

impl Book {
    /// Builds a book from loaded collections.
    ///
    /// The General category is inserted (and the collection marked dirty)
    /// when missing, so it exists before the first write.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_collections(
        clients: Vec<Client>,
        contracts: Vec<Contract>,
        projects: Vec<Project>,
        time_entries: Vec<TimeEntry>,
        payments: Vec<Payment>,
        categories: Vec<Category>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut book = Self {
            clients,
            contracts,
            projects,
            time_entries,
            payments,
            categories,
            dirty: BTreeSet::new(),
        };
        book.ensure_general_category(now);
        book
    }

    /// Inserts the General category when absent.
    pub fn ensure_general_category(&mut self, now: DateTime<Utc>) {
        if !self.categories.iter().any(|c| c.id == CategoryId::GENERAL) {
            self.categories.insert(0, Category::general(now));
            self.touch(Collection::Categories);
        }
    }

    /// Marks a collection as modified.
    pub fn touch(&mut self, collection: Collection) {
        self.dirty.insert(collection);
    }

    /// Collections modified since load.
    pub fn dirty(&self) -> impl Iterator<Item = Collection> + '_ {
        self.dirty.iter().copied()
    }

    /// True when `collection` was modified.
    #[must_use]
    pub fn is_dirty(&self, collection: Collection) -> bool {
        self.dirty.contains(&collection)
    }

    /// Forgets modifications, after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty.clear();
    }

    lookup!(client, client_mut, clients, Client, ClientId, "Client");
    lookup!(contract, contract_mut, contracts, Contract, ContractId, "Contract");
    lookup!(project, project_mut, projects, Project, ProjectId, "Project");
    lookup!(time_entry, time_entry_mut, time_entries, TimeEntry, TimeEntryId, "Time entry");
    lookup!(payment, payment_mut, payments, Payment, PaymentId, "Payment");
    lookup!(category, category_mut, categories, Category, CategoryId, "Category");

    /// Next client ID.
    #[must_use]
    pub fn next_client_id(&self) -> ClientId {
        ClientId::next_after(self.clients.iter().map(|r| r.id))
    }

    /// Next contract ID.
    #[must_use]
    pub fn next_contract_id(&self) -> ContractId {
        ContractId::next_after(self.contracts.iter().map(|r| r.id))
    }

    /// Next project ID.
    #[must_use]
    pub fn next_project_id(&self) -> ProjectId {
        ProjectId::next_after(self.projects.iter().map(|r| r.id))
    }

    /// Next time entry ID.
    #[must_use]
    pub fn next_time_entry_id(&self) -> TimeEntryId {
        TimeEntryId::next_after(self.time_entries.iter().map(|r| r.id))
    }

    /// Next payment ID.
    #[must_use]
    pub fn next_payment_id(&self) -> PaymentId {
        PaymentId::next_after(self.payments.iter().map(|r| r.id))
    }

    /// Next category ID.
    #[must_use]
    pub fn next_category_id(&self) -> CategoryId {
        CategoryId::next_after(self.categories.iter().map(|r| r.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_category_seeded_and_dirty() {
        let book = Book::from_collections(
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            Utc::now(),
        );
        assert_eq!(book.categories.len(), 1);
        assert_eq!(book.categories[0].id, CategoryId::GENERAL);
        assert!(book.is_dirty(Collection::Categories));
        assert_eq!(book.dirty().count(), 1);
    }

    #[test]
    fn test_existing_general_not_duplicated() {
        let now = Utc::now();
        let book = Book::from_collections(
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![Category::general(now)],
            now,
        );
        assert_eq!(book.categories.len(), 1);
        assert!(!book.is_dirty(Collection::Categories));
    }

    #[test]
    fn test_lookup_not_found() {
        let book = Book::default();
        let err = book.contract(ContractId(9)).unwrap_err();
        assert_eq!(err, LedgerError::not_found("Contract", 9));
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::TimeEntries.name(), "time_entries");
        assert_eq!(Collection::Users.to_string(), "users");
        assert!(!Collection::LEDGER.contains(&Collection::Users));
    }
}
