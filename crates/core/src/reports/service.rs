//! Report generation service.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use timebill_shared::types::{CategoryId, ClientId, ContractId, ProjectId, TimeEntryId};

use super::types::{
    ActiveContractRow, CategoryTotal, ClientSummary, ContractView, MonthlyReport, MonthlyRow,
    Overview, ProjectView, TimeEntryFilter, TimeEntryReport, TimeEntryView,
};
use crate::ledger::balance::{contract_hours_used, project_hours_used, remaining};
use crate::ledger::book::Book;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{Contract, ContractStatus, Project, ProjectStatus, TimeEntry};
use crate::ledger::validation::{month_year, parse_month};

/// Service for building read models from a `Book`.
pub struct ReportService;

impl ReportService {
    /// Every contract with its consumption, newest first.
    #[must_use]
    pub fn contract_views(book: &Book) -> Vec<ContractView> {
        let mut views: Vec<_> = book
            .contracts
            .iter()
            .map(|c| Self::build_contract_view(book, c))
            .collect();
        views.sort_by(|a, b| b.contract.id.cmp(&a.contract.id));
        views
    }

    /// One contract with its consumption.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown contract.
    pub fn contract_view(book: &Book, id: ContractId) -> Result<ContractView, LedgerError> {
        Ok(Self::build_contract_view(book, book.contract(id)?))
    }

    fn build_contract_view(book: &Book, contract: &Contract) -> ContractView {
        let used_hours = contract_hours_used(&book.time_entries, contract.id);
        ContractView {
            client_name: book.client(contract.client_id).ok().map(|c| c.name.clone()),
            used_hours,
            remaining_hours: remaining(contract.total_hours, used_hours),
            total_value: contract.total_value(),
            remaining_amount: contract.remaining_amount(),
            entries_count: book
                .time_entries
                .iter()
                .filter(|e| e.contract_id == Some(contract.id))
                .count(),
            contract: contract.clone(),
        }
    }

    /// Every project with its consumption, newest first.
    #[must_use]
    pub fn project_views(book: &Book) -> Vec<ProjectView> {
        let mut views: Vec<_> = book
            .projects
            .iter()
            .map(|p| Self::build_project_view(book, p))
            .collect();
        views.sort_by(|a, b| b.project.id.cmp(&a.project.id));
        views
    }

    /// One project with its consumption.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project.
    pub fn project_view(book: &Book, id: ProjectId) -> Result<ProjectView, LedgerError> {
        Ok(Self::build_project_view(book, book.project(id)?))
    }

    /// Rate a project bills at: its own when independent, else its contract's.
    #[must_use]
    pub fn effective_rate(book: &Book, project: &Project) -> Decimal {
        if project.is_independent {
            return project.hourly_rate.unwrap_or_default();
        }
        project
            .contract_id
            .and_then(|id| book.contract(id).ok())
            .map_or(Decimal::ZERO, |c| c.hourly_rate)
    }

    fn build_project_view(book: &Book, project: &Project) -> ProjectView {
        let used_hours = project_hours_used(&book.time_entries, project.id);
        let effective_rate = Self::effective_rate(book, project);
        let contract = project.contract_id.and_then(|id| book.contract(id).ok());
        let client_name = project
            .client_id
            .and_then(|id| book.client(id).ok())
            .map(|c| c.name.clone())
            .or_else(|| project.client_name.clone());

        ProjectView {
            used_hours,
            remaining_hours: remaining(project.estimated_hours, used_hours),
            effective_rate,
            current_cost: used_hours.saturating_mul(effective_rate),
            client_name,
            contract_number: contract.map(|c| c.contract_number.clone()),
            project: project.clone(),
        }
    }

    /// Entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed month filter.
    pub fn time_entry_views(
        book: &Book,
        filter: &TimeEntryFilter,
    ) -> Result<Vec<TimeEntryView>, LedgerError> {
        let month = match filter.month.as_deref() {
            Some(value) => {
                let (year, month) = parse_month(value)?;
                Some(format!("{year:04}-{month:02}"))
            }
            None => None,
        };

        let mut entries: Vec<&TimeEntry> = book
            .time_entries
            .iter()
            .filter(|e| filter.contract_id.is_none_or(|id| e.contract_id == Some(id)))
            .filter(|e| filter.project_id.is_none_or(|id| e.project_id == Some(id)))
            .filter(|e| filter.category_id.is_none_or(|id| e.category_id == id))
            .filter(|e| month.as_deref().is_none_or(|m| e.month_year == m))
            .filter(|e| filter.start_date.is_none_or(|d| e.entry_date >= d))
            .filter(|e| filter.end_date.is_none_or(|d| e.entry_date <= d))
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date).then(b.id.cmp(&a.id)));

        Ok(entries
            .into_iter()
            .map(|e| Self::build_entry_view(book, e))
            .collect())
    }

    /// One entry with its references resolved.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown entry.
    pub fn time_entry_view(
        book: &Book,
        id: TimeEntryId,
    ) -> Result<TimeEntryView, LedgerError> {
        Ok(Self::build_entry_view(book, book.time_entry(id)?))
    }

    fn build_entry_view(book: &Book, entry: &TimeEntry) -> TimeEntryView {
        let contract = entry.contract_id.and_then(|id| book.contract(id).ok());
        let project = entry.project_id.and_then(|id| book.project(id).ok());
        let category = book.category(entry.category_id).ok();

        let client_id = contract
            .map(|c| c.client_id)
            .or_else(|| project.and_then(|p| p.client_id));
        let client_name = client_id
            .and_then(|id| book.client(id).ok())
            .map(|c| c.name.clone())
            .or_else(|| project.and_then(|p| p.client_name.clone()));

        TimeEntryView {
            contract_number: contract.map(|c| c.contract_number.clone()),
            project_name: project.map(|p| p.name.clone()),
            client_name,
            category_name: category.map(|c| c.name.clone()),
            category_color: category.map(|c| c.color.clone()),
            entry: entry.clone(),
        }
    }

    /// Totals for one client.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown client.
    pub fn client_summary(book: &Book, id: ClientId) -> Result<ClientSummary, LedgerError> {
        let client = book.client(id)?;
        let contracts: Vec<&Contract> = book.contracts.iter().filter(|c| c.client_id == id).collect();
        let projects: Vec<&Project> = book
            .projects
            .iter()
            .filter(|p| p.client_id == Some(id))
            .collect();

        let total_hours: Decimal = contracts.iter().map(|c| c.total_hours).sum();
        let used_hours: Decimal = contracts
            .iter()
            .map(|c| contract_hours_used(&book.time_entries, c.id))
            .sum();
        let total_value: Decimal = contracts.iter().map(|c| c.total_value()).sum();
        let billed_amount: Decimal = contracts.iter().map(|c| c.billed_amount).sum();

        Ok(ClientSummary {
            client: client.clone(),
            contracts_count: contracts.len(),
            active_contracts: contracts
                .iter()
                .filter(|c| c.status == ContractStatus::Active)
                .count(),
            projects_count: projects.len(),
            total_hours,
            used_hours,
            remaining_hours: remaining(total_hours, used_hours),
            total_value,
            billed_amount,
            remaining_amount: remaining(total_value, billed_amount),
            projects_paid: projects.iter().map(|p| p.paid_amount).sum(),
        })
    }

    /// Contract hours booked in `month` (`YYYY-MM`), grouped by client and contract.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed month.
    pub fn monthly_report(book: &Book, month: &str) -> Result<MonthlyReport, LedgerError> {
        let (year, month_number) = parse_month(month)?;
        let month = format!("{year:04}-{month_number:02}");

        let mut groups: BTreeMap<(ClientId, ContractId), MonthlyRow> = BTreeMap::new();
        for entry in book.time_entries.iter().filter(|e| e.month_year == month) {
            let Some(contract) = entry.contract_id.and_then(|id| book.contract(id).ok()) else {
                continue;
            };
            let row = groups
                .entry((contract.client_id, contract.id))
                .or_insert_with(|| MonthlyRow {
                    client_id: contract.client_id,
                    client_name: book
                        .client(contract.client_id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    contract_id: contract.id,
                    contract_number: contract.contract_number.clone(),
                    hourly_rate: contract.hourly_rate,
                    hours: Decimal::ZERO,
                    amount: Decimal::ZERO,
                    entries_count: 0,
                });
            row.hours += entry.hours_used;
            row.amount += entry.hours_used.saturating_mul(contract.hourly_rate);
            row.entries_count += 1;
        }

        let mut rows: Vec<MonthlyRow> = groups.into_values().collect();
        rows.sort_by(|a, b| {
            a.client_name
                .cmp(&b.client_name)
                .then_with(|| a.contract_number.cmp(&b.contract_number))
        });

        Ok(MonthlyReport {
            total_hours: rows.iter().map(|r| r.hours).sum(),
            total_amount: rows.iter().map(|r| r.amount).sum(),
            month,
            rows,
        })
    }

    /// Progress of every active contract, most consumed first.
    #[must_use]
    pub fn active_contracts(book: &Book) -> Vec<ActiveContractRow> {
        let mut rows: Vec<_> = book
            .contracts
            .iter()
            .filter(|c| c.status == ContractStatus::Active)
            .map(|contract| {
                let used_hours = contract_hours_used(&book.time_entries, contract.id);
                ActiveContractRow {
                    contract_id: contract.id,
                    contract_number: contract.contract_number.clone(),
                    client_name: book.client(contract.client_id).ok().map(|c| c.name.clone()),
                    total_hours: contract.total_hours,
                    used_hours,
                    remaining_hours: remaining(contract.total_hours, used_hours),
                    progress_percentage: progress(used_hours, contract.total_hours),
                    last_activity: book
                        .time_entries
                        .iter()
                        .filter(|e| e.contract_id == Some(contract.id))
                        .map(|e| e.entry_date)
                        .max(),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.progress_percentage
                .cmp(&a.progress_percentage)
                .then(a.contract_id.cmp(&b.contract_id))
        });
        rows
    }

    /// Dashboard totals as of `today`.
    #[must_use]
    pub fn overview(book: &Book, today: NaiveDate) -> Overview {
        let month = month_year(today);
        let total_contract_value: Decimal = book.contracts.iter().map(Contract::total_value).sum();
        let total_billed: Decimal = book.contracts.iter().map(|c| c.billed_amount).sum();
        let month_entries = || book.time_entries.iter().filter(|e| e.month_year == month);

        Overview {
            total_clients: book.clients.len(),
            active_clients: book.clients.iter().filter(|c| c.is_active).count(),
            total_contracts: book.contracts.len(),
            active_contracts: book
                .contracts
                .iter()
                .filter(|c| c.status == ContractStatus::Active)
                .count(),
            total_projects: book.projects.len(),
            active_projects: book
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active)
                .count(),
            total_contract_value,
            total_billed,
            total_pending: book.contracts.iter().map(Contract::remaining_amount).sum(),
            projects_paid: book.projects.iter().map(|p| p.paid_amount).sum(),
            total_hours_used: book.time_entries.iter().map(|e| e.hours_used).sum(),
            month_hours: month_entries().map(|e| e.hours_used).sum(),
            month_amount: month_entries().map(|e| e.amount).sum(),
            month,
        }
    }

    /// Filtered entries with totals and a per-category breakdown.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed month filter.
    pub fn time_entry_report(
        book: &Book,
        filter: &TimeEntryFilter,
    ) -> Result<TimeEntryReport, LedgerError> {
        let entries = Self::time_entry_views(book, filter)?;

        let mut by_category: BTreeMap<CategoryId, CategoryTotal> = BTreeMap::new();
        for view in &entries {
            let total = by_category
                .entry(view.entry.category_id)
                .or_insert_with(|| CategoryTotal {
                    category_id: view.entry.category_id,
                    category_name: view.category_name.clone(),
                    color: view.category_color.clone(),
                    hours: Decimal::ZERO,
                    amount: Decimal::ZERO,
                    entries_count: 0,
                });
            total.hours += view.entry.hours_used;
            total.amount += view.entry.amount;
            total.entries_count += 1;
        }
        let mut by_category: Vec<_> = by_category.into_values().collect();
        by_category.sort_by(|a, b| b.hours.cmp(&a.hours).then(a.category_id.cmp(&b.category_id)));

        Ok(TimeEntryReport {
            total_hours: entries.iter().map(|v| v.entry.hours_used).sum(),
            total_amount: entries.iter().map(|v| v.entry.amount).sum(),
            entries,
            by_category,
        })
    }
}

/// `min(100, used / total × 100)` rounded to cents; zero for an empty budget.
fn progress(used: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    (used / total * Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED)
        .round_dp(2)
}
