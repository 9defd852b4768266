//! Billing ledger.
//!
//! This module implements the reconciliation model:
//! - Records and inputs (`types`)
//! - The in-memory `Book` of every collection
//! - Running totals and hour aggregation (`balance`)
//! - Field guards (`validation`)
//! - `LedgerService`, split by record kind
//! - Error types for ledger operations

pub mod balance;
pub mod book;
pub mod error;
pub mod types;
pub mod validation;

mod contracts;
mod payments;
mod projects;
mod service;
mod time_entries;

#[cfg(test)]
mod service_props;

pub use book::{Book, Collection};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    BalanceCorrection, Category, CategoryInput, Client, ClientInput, Contract, ContractDeletion,
    ContractPatch, ContractStatus, DEFAULT_CATEGORY_COLOR, Dependents, NewContract, NewPayment,
    Payment, PaymentPatch, PaymentType, Project, ProjectInput, ProjectStatus, Target, TimeEntry,
    TimeEntryInput,
};
