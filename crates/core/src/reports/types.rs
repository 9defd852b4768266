//! Read model types.
//!
//! Every view embeds the stored record (flattened) plus values recomputed
//! from the book at request time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use timebill_shared::types::{CategoryId, ClientId, ContractId, ProjectId};

use crate::ledger::types::{Client, Contract, Project, TimeEntry};

/// Contract plus its consumption.
#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    /// Stored contract.
    #[serde(flatten)]
    pub contract: Contract,
    /// Owning client's name.
    pub client_name: Option<String>,
    /// Hours booked so far.
    pub used_hours: Decimal,
    /// Hours left.
    pub remaining_hours: Decimal,
    /// `total_hours × hourly_rate`.
    pub total_value: Decimal,
    /// `total_value − billed_amount`, floored at zero.
    pub remaining_amount: Decimal,
    /// Time entries booked on the contract.
    pub entries_count: usize,
}

/// Project plus its consumption.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    /// Stored project.
    #[serde(flatten)]
    pub project: Project,
    /// Hours booked so far.
    pub used_hours: Decimal,
    /// `estimated_hours − used_hours`, floored at zero.
    pub remaining_hours: Decimal,
    /// Rate the project bills at.
    pub effective_rate: Decimal,
    /// `used_hours × effective_rate`.
    pub current_cost: Decimal,
    /// Client name, from the client record or the project itself.
    pub client_name: Option<String>,
    /// Parent contract's number.
    pub contract_number: Option<String>,
}

/// Time entry plus the names of what it references.
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryView {
    /// Stored entry.
    #[serde(flatten)]
    pub entry: TimeEntry,
    /// Contract number.
    pub contract_number: Option<String>,
    /// Project name.
    pub project_name: Option<String>,
    /// Client name.
    pub client_name: Option<String>,
    /// Category name.
    pub category_name: Option<String>,
    /// Category colour.
    pub category_color: Option<String>,
}

/// Filters for time entry listings. All conditions must hold.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeEntryFilter {
    /// Only this contract.
    pub contract_id: Option<ContractId>,
    /// Only this project.
    pub project_id: Option<ProjectId>,
    /// Only this category.
    pub category_id: Option<CategoryId>,
    /// Only this `YYYY-MM`.
    pub month: Option<String>,
    /// On or after this date.
    pub start_date: Option<NaiveDate>,
    /// On or before this date.
    pub end_date: Option<NaiveDate>,
}

/// Per-client totals.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    /// The client.
    pub client: Client,
    /// All contracts.
    pub contracts_count: usize,
    /// Active contracts.
    pub active_contracts: usize,
    /// Projects owned by the client.
    pub projects_count: usize,
    /// Purchased hours across contracts.
    pub total_hours: Decimal,
    /// Booked hours across contracts.
    pub used_hours: Decimal,
    /// `total_hours − used_hours`, floored at zero.
    pub remaining_hours: Decimal,
    /// Contract value.
    pub total_value: Decimal,
    /// Payments received on contracts.
    pub billed_amount: Decimal,
    /// `total_value − billed_amount`, floored at zero.
    pub remaining_amount: Decimal,
    /// Money received on the client's projects.
    pub projects_paid: Decimal,
}

/// One (client, contract) group of a monthly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRow {
    /// Client.
    pub client_id: ClientId,
    /// Client name.
    pub client_name: String,
    /// Contract.
    pub contract_id: ContractId,
    /// Contract number.
    pub contract_number: String,
    /// Contract rate.
    pub hourly_rate: Decimal,
    /// Hours booked in the month.
    pub hours: Decimal,
    /// `hours × hourly_rate`.
    pub amount: Decimal,
    /// Entries in the group.
    pub entries_count: usize,
}

/// Contract hours booked in one month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    /// `YYYY-MM`.
    pub month: String,
    /// Groups, ordered by client then contract number.
    pub rows: Vec<MonthlyRow>,
    /// Sum of row hours.
    pub total_hours: Decimal,
    /// Sum of row amounts.
    pub total_amount: Decimal,
}

/// Progress of one active contract.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveContractRow {
    /// Contract.
    pub contract_id: ContractId,
    /// Contract number.
    pub contract_number: String,
    /// Client name.
    pub client_name: Option<String>,
    /// Purchased hours.
    pub total_hours: Decimal,
    /// Booked hours.
    pub used_hours: Decimal,
    /// Hours left.
    pub remaining_hours: Decimal,
    /// `min(100, used / total × 100)`, two decimals.
    pub progress_percentage: Decimal,
    /// Latest entry date.
    pub last_activity: Option<NaiveDate>,
}

/// Dashboard totals.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    /// All clients.
    pub total_clients: usize,
    /// Active clients.
    pub active_clients: usize,
    /// All contracts.
    pub total_contracts: usize,
    /// Active contracts.
    pub active_contracts: usize,
    /// All projects.
    pub total_projects: usize,
    /// Active projects.
    pub active_projects: usize,
    /// Value of every contract.
    pub total_contract_value: Decimal,
    /// Payments received on contracts.
    pub total_billed: Decimal,
    /// Contract value still unpaid.
    pub total_pending: Decimal,
    /// Money received on projects.
    pub projects_paid: Decimal,
    /// Hours booked overall.
    pub total_hours_used: Decimal,
    /// Current `YYYY-MM`.
    pub month: String,
    /// Hours booked this month.
    pub month_hours: Decimal,
    /// Amount booked this month.
    pub month_amount: Decimal,
}

/// Totals for one category in a time entry report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Category.
    pub category_id: CategoryId,
    /// Category name.
    pub category_name: Option<String>,
    /// Category colour.
    pub color: Option<String>,
    /// Hours.
    pub hours: Decimal,
    /// Amount.
    pub amount: Decimal,
    /// Entries.
    pub entries_count: usize,
}

/// Filtered entries with totals.
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryReport {
    /// Matching entries, newest first.
    pub entries: Vec<TimeEntryView>,
    /// Sum of hours.
    pub total_hours: Decimal,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Breakdown by category, ordered by hours descending.
    pub by_category: Vec<CategoryTotal>,
}
