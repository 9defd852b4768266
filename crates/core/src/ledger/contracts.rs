//! Contract operations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use timebill_shared::types::ContractId;

use super::balance::contract_hours_used;
use super::book::{Book, Collection};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{
    Contract, ContractDeletion, ContractPatch, Dependents, NewContract, ProjectStatus,
};
use super::validation::{optional_text, product, require_positive, require_text};

impl LedgerService {
    /// Creates a contract for an existing client.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown client, `Conflict` for a duplicate number,
    /// `Validation` for non-positive hours or rate or inverted dates.
    pub fn create_contract(
        book: &mut Book,
        input: NewContract,
        now: DateTime<Utc>,
    ) -> Result<Contract, LedgerError> {
        book.client(input.client_id)?;
        let contract_number = require_text(&input.contract_number, "contract_number")?;
        ensure_unique_number(book, &contract_number, None)?;
        let total_hours = require_positive(input.total_hours, "total_hours")?;
        let hourly_rate = require_positive(input.hourly_rate, "hourly_rate")?;
        check_dates(input.start_date, input.end_date)?;

        let contract = Contract {
            id: book.next_contract_id(),
            client_id: input.client_id,
            contract_number,
            description: optional_text(input.description),
            total_hours,
            hourly_rate,
            status: input.status.unwrap_or_default(),
            billed_amount: Decimal::ZERO,
            last_payment_date: None,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        };

        book.contracts.push(contract.clone());
        book.touch(Collection::Contracts);
        Ok(contract)
    }

    /// Patches a contract.
    ///
    /// The hour budget cannot drop below the hours already booked. A rate
    /// change reprices the `total_amount` of the contract's projects.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Conflict` for a duplicate number, `Validation` otherwise.
    pub fn update_contract(
        book: &mut Book,
        id: ContractId,
        patch: ContractPatch,
        now: DateTime<Utc>,
    ) -> Result<Contract, LedgerError> {
        let mut contract = book.contract(id)?.clone();

        if let Some(client_id) = patch.client_id {
            book.client(client_id)?;
            contract.client_id = client_id;
        }
        if let Some(number) = patch.contract_number {
            let number = require_text(&number, "contract_number")?;
            ensure_unique_number(book, &number, Some(id))?;
            contract.contract_number = number;
        }
        if patch.description.is_some() {
            contract.description = optional_text(patch.description);
        }
        if let Some(total_hours) = patch.total_hours {
            let total_hours = require_positive(total_hours, "total_hours")?;
            let used = contract_hours_used(&book.time_entries, id);
            if total_hours < used {
                return Err(LedgerError::validation(format!(
                    "total_hours cannot be lower than the {used} hours already used"
                )));
            }
            contract.total_hours = total_hours;
        }
        let rate_changed = match patch.hourly_rate {
            Some(rate) => {
                let rate = require_positive(rate, "hourly_rate")?;
                let changed = rate != contract.hourly_rate;
                contract.hourly_rate = rate;
                changed
            }
            None => false,
        };
        if let Some(status) = patch.status {
            contract.status = status;
        }
        if patch.start_date.is_some() {
            contract.start_date = patch.start_date;
        }
        if patch.end_date.is_some() {
            contract.end_date = patch.end_date;
        }
        check_dates(contract.start_date, contract.end_date)?;
        contract.updated_at = now;

        if rate_changed {
            let mut repriced = false;
            for project in book
                .projects
                .iter_mut()
                .filter(|p| p.contract_id == Some(id))
            {
                project.total_amount =
                    product(project.estimated_hours, contract.hourly_rate)?;
                project.updated_at = now;
                repriced = true;
            }
            if repriced {
                book.touch(Collection::Projects);
            }
        }

        *book.contract_mut(id)? = contract.clone();
        book.touch(Collection::Contracts);
        Ok(contract)
    }

    /// Records that reference a contract.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown contract.
    pub fn contract_dependents(book: &Book, id: ContractId) -> Result<Dependents, LedgerError> {
        book.contract(id)?;
        Ok(Dependents {
            time_entries: book
                .time_entries
                .iter()
                .filter(|e| e.contract_id == Some(id))
                .count(),
            projects: book
                .projects
                .iter()
                .filter(|p| p.contract_id == Some(id))
                .count(),
            payments: book
                .payments
                .iter()
                .filter(|p| p.contract_id == Some(id))
                .count(),
        })
    }

    /// Deletes a contract.
    ///
    /// Without `force`, a contract that anything references is left alone and
    /// the dependents are reported back. With `force`, its time entries and
    /// payments are removed and its projects become independent, cancelled
    /// projects billed at the contract's former rate.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown contract.
    pub fn delete_contract(
        book: &mut Book,
        id: ContractId,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<ContractDeletion, LedgerError> {
        let dependents = Self::contract_dependents(book, id)?;
        if !force && !dependents.is_empty() {
            return Ok(ContractDeletion::ConfirmationRequired(dependents));
        }

        let contract = book.contract(id)?.clone();
        let client_name = book
            .client(contract.client_id)
            .ok()
            .map(|c| c.name.clone());

        if dependents.time_entries > 0 {
            book.time_entries.retain(|e| e.contract_id != Some(id));
            book.touch(Collection::TimeEntries);
        }
        if dependents.payments > 0 {
            book.payments.retain(|p| p.contract_id != Some(id));
            book.touch(Collection::Payments);
        }

        let mut detached_projects = Vec::new();
        for project in book
            .projects
            .iter_mut()
            .filter(|p| p.contract_id == Some(id))
        {
            project.contract_id = None;
            project.is_independent = true;
            project.status = ProjectStatus::Cancelled;
            project.hourly_rate = Some(contract.hourly_rate);
            if project.client_name.is_none() {
                project.client_name.clone_from(&client_name);
            }
            project.total_amount = product(project.estimated_hours, contract.hourly_rate)?;
            project.updated_at = now;
            detached_projects.push(project.id);
        }
        if !detached_projects.is_empty() {
            book.touch(Collection::Projects);
        }

        book.contracts.retain(|c| c.id != id);
        book.touch(Collection::Contracts);

        Ok(ContractDeletion::Deleted {
            removed_time_entries: dependents.time_entries,
            removed_payments: dependents.payments,
            detached_projects,
        })
    }
}

fn ensure_unique_number(
    book: &Book,
    number: &str,
    except: Option<ContractId>,
) -> Result<(), LedgerError> {
    if book
        .contracts
        .iter()
        .any(|c| Some(c.id) != except && c.contract_number == number)
    {
        return Err(LedgerError::Conflict(format!(
            "Contract number already exists: {number}"
        )));
    }
    Ok(())
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), LedgerError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(LedgerError::validation(
            "end_date cannot be before start_date",
        ));
    }
    Ok(())
}
