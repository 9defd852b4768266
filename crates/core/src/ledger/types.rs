//! Ledger domain types.
//!
//! Persisted records for every ledger collection, plus the input types the
//! service accepts. Derived values (used/remaining hours, remaining amount)
//! are never stored; see `balance` and the `reports` module.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use timebill_shared::types::{
    CategoryId, ClientId, ContractId, PaymentId, ProjectId, TimeEntryId,
};

/// A billed customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Client ID.
    pub id: ClientId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Company name.
    #[serde(default)]
    pub company: Option<String>,
    /// Contact person.
    #[serde(default)]
    pub contact_person: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Tax identifier.
    #[serde(default)]
    pub tax_id: Option<String>,
    /// Whether the client is active.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Contract lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Hours may be logged and payments received.
    #[default]
    Active,
    /// Fully delivered.
    Completed,
    /// Terminated early.
    Cancelled,
}

/// A fixed hour budget sold to a client at a fixed rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Contract ID.
    pub id: ContractId,
    /// Owning client.
    pub client_id: ClientId,
    /// Unique human-facing number.
    pub contract_number: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Purchased hours.
    pub total_hours: Decimal,
    /// Price per hour.
    pub hourly_rate: Decimal,
    /// Lifecycle status.
    pub status: ContractStatus,
    /// Running total of payments received.
    pub billed_amount: Decimal,
    /// Date of the most recent payment.
    #[serde(default)]
    pub last_payment_date: Option<NaiveDate>,
    /// Contract start.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Contract end.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// `total_hours × hourly_rate`, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        self.total_hours.saturating_mul(self.hourly_rate)
    }

    /// `max(0, total_value − billed_amount)`.
    #[must_use]
    pub fn remaining_amount(&self) -> Decimal {
        (self.total_value() - self.billed_amount).max(Decimal::ZERO)
    }
}

/// Project lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// In progress.
    #[default]
    Active,
    /// Delivered.
    Completed,
    /// Abandoned, or detached from a deleted contract.
    Cancelled,
}

/// A unit of work, either under a contract or billed independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Parent contract; always `None` for independent projects.
    #[serde(default)]
    pub contract_id: Option<ContractId>,
    /// Owning client, when known.
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Billed by hours × its own rate instead of through a contract.
    pub is_independent: bool,
    /// Own rate; required (and positive) for independent projects.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    /// Free-text client name for independent projects.
    #[serde(default)]
    pub client_name: Option<String>,
    /// Planned hours.
    pub estimated_hours: Decimal,
    /// Running total of money received (payments plus independent billing).
    pub paid_amount: Decimal,
    /// `estimated_hours × applicable rate` at last write.
    pub total_amount: Decimal,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Date of the most recent payment.
    #[serde(default)]
    pub last_payment_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Hours worked on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Entry ID.
    pub id: TimeEntryId,
    /// Contract the hours count against.
    #[serde(default)]
    pub contract_id: Option<ContractId>,
    /// Project the hours count against.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Category; defaults to General.
    pub category_id: CategoryId,
    /// What was done.
    pub description: String,
    /// Hours worked, always positive.
    pub hours_used: Decimal,
    /// Day the work happened.
    pub entry_date: NaiveDate,
    /// `YYYY-MM` of `entry_date`.
    pub month_year: String,
    /// `hours_used × applicable rate` at write time.
    pub amount: Decimal,
    /// Whether `amount` was added to an independent project's `paid_amount`.
    #[serde(default)]
    pub bills_project: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// How a payment relates to the agreed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Settles the whole amount.
    Full,
    /// Part of the amount.
    #[default]
    Partial,
    /// Paid before work is delivered.
    Advance,
    /// A percentage of the target's total value.
    Percentage,
}

/// Money received against a contract or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Paid contract.
    #[serde(default)]
    pub contract_id: Option<ContractId>,
    /// Paid project.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Amount received, always positive.
    pub amount: Decimal,
    /// Day the money arrived.
    pub payment_date: NaiveDate,
    /// Payment kind.
    pub payment_type: PaymentType,
    /// Percentage of the total, when relevant.
    #[serde(default)]
    pub percentage: Option<Decimal>,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Time entry classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Name, unique ignoring case.
    pub name: String,
    /// `#RRGGBB` colour.
    pub color: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the category can be picked for new entries.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Colour used when none is given.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

impl Category {
    /// The built-in "General" category.
    #[must_use]
    pub fn general(now: DateTime<Utc>) -> Self {
        Self {
            id: CategoryId::GENERAL,
            name: "General".to_string(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            description: Some("Default category".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What a payment or time entry is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Target {
    /// A contract.
    Contract(ContractId),
    /// A project.
    Project(ProjectId),
}

// ============================================================================
// Inputs
// ============================================================================

/// Client fields. On create `name` and `email` are required; on update
/// `None` keeps the current value and a blank string clears an optional one.
#[derive(Debug, Clone, Default)]
pub struct ClientInput {
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Contact person.
    pub contact_person: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Fields for creating a contract.
#[derive(Debug, Clone)]
pub struct NewContract {
    /// Owning client.
    pub client_id: ClientId,
    /// Unique number.
    pub contract_number: String,
    /// Optional description.
    pub description: Option<String>,
    /// Purchased hours.
    pub total_hours: Decimal,
    /// Price per hour.
    pub hourly_rate: Decimal,
    /// Initial status; defaults to active.
    pub status: Option<ContractStatus>,
    /// Contract start.
    pub start_date: Option<NaiveDate>,
    /// Contract end.
    pub end_date: Option<NaiveDate>,
}

/// Partial contract update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ContractPatch {
    /// New owning client.
    pub client_id: Option<ClientId>,
    /// New number.
    pub contract_number: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New hour budget.
    pub total_hours: Option<Decimal>,
    /// New rate.
    pub hourly_rate: Option<Decimal>,
    /// New status.
    pub status: Option<ContractStatus>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
}

/// Project fields. `None` keeps the current value (or the default on create).
#[derive(Debug, Clone, Default)]
pub struct ProjectInput {
    /// Project name; required on create.
    pub name: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Parent contract (non-independent projects).
    pub contract_id: Option<ContractId>,
    /// Owning client.
    pub client_id: Option<ClientId>,
    /// Billed on its own.
    pub is_independent: Option<bool>,
    /// Own rate (independent projects).
    pub hourly_rate: Option<Decimal>,
    /// Client name (independent projects).
    pub client_name: Option<String>,
    /// Planned hours.
    pub estimated_hours: Option<Decimal>,
    /// Status.
    pub status: Option<ProjectStatus>,
}

/// Fields for recording or fully replacing a time entry.
#[derive(Debug, Clone)]
pub struct TimeEntryInput {
    /// Contract to book against.
    pub contract_id: Option<ContractId>,
    /// Project to book against.
    pub project_id: Option<ProjectId>,
    /// Category; `None` means General.
    pub category_id: Option<CategoryId>,
    /// What was done.
    pub description: String,
    /// Hours worked.
    pub hours_used: Decimal,
    /// Day the work happened.
    pub entry_date: NaiveDate,
}

/// Fields for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// What is being paid.
    pub target: Target,
    /// Amount; derived from `percentage` when absent.
    pub amount: Option<Decimal>,
    /// Payment date; today when absent.
    pub payment_date: Option<NaiveDate>,
    /// Payment kind.
    pub payment_type: Option<PaymentType>,
    /// Percentage of the target's total value.
    pub percentage: Option<Decimal>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Partial payment update. The target cannot change.
#[derive(Debug, Clone, Default)]
pub struct PaymentPatch {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New date.
    pub payment_date: Option<NaiveDate>,
    /// New kind.
    pub payment_type: Option<PaymentType>,
    /// New percentage.
    pub percentage: Option<Decimal>,
    /// New notes.
    pub notes: Option<String>,
}

/// Fields for creating a category or patching one.
#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    /// Name.
    pub name: Option<String>,
    /// `#RRGGBB` colour.
    pub color: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Records that block an unconfirmed contract deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dependents {
    /// Time entries booked on the contract.
    pub time_entries: usize,
    /// Projects under the contract.
    pub projects: usize,
    /// Payments received on the contract.
    pub payments: usize,
}

impl Dependents {
    /// True when nothing references the contract.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.time_entries == 0 && self.projects == 0 && self.payments == 0
    }
}

/// Outcome of `LedgerService::delete_contract`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractDeletion {
    /// The contract is gone.
    Deleted {
        /// Time entries removed with it.
        removed_time_entries: usize,
        /// Payments removed with it.
        removed_payments: usize,
        /// Projects turned independent and cancelled.
        detached_projects: Vec<ProjectId>,
    },
    /// Nothing changed; the caller must retry with `force`.
    ConfirmationRequired(Dependents),
}

/// A running total that `resync_balances` had to correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceCorrection {
    /// Corrected aggregate.
    pub target: Target,
    /// Value before the resync.
    pub previous: Decimal,
    /// Value recomputed from leaf records.
    pub recomputed: Decimal,
}
