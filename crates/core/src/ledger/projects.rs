//! Project operations.
//!
//! A project either belongs to a contract (and inherits its client and rate)
//! or is independent, with its own rate and a free-text client name.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use timebill_shared::types::ProjectId;

use super::book::{Book, Collection};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{Project, ProjectInput, ProjectStatus};
use super::validation::{
    optional_text, product, require_non_negative, require_positive, require_text,
};

impl LedgerService {
    /// Creates a project.
    ///
    /// # Errors
    ///
    /// `Validation` when the contract/independence rules are broken,
    /// `NotFound` for an unknown contract or client.
    pub fn create_project(
        book: &mut Book,
        input: ProjectInput,
        now: DateTime<Utc>,
    ) -> Result<Project, LedgerError> {
        let mut project = Project {
            id: book.next_project_id(),
            name: String::new(),
            description: None,
            contract_id: None,
            client_id: None,
            is_independent: false,
            hourly_rate: None,
            client_name: None,
            estimated_hours: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            status: ProjectStatus::Active,
            last_payment_date: None,
            created_at: now,
            updated_at: now,
        };
        apply_input(book, &mut project, input)?;

        book.projects.push(project.clone());
        book.touch(Collection::Projects);
        Ok(project)
    }

    /// Updates a project. Absent fields keep their current values.
    ///
    /// # Errors
    ///
    /// Same as [`LedgerService::create_project`], plus `NotFound` for the project.
    pub fn update_project(
        book: &mut Book,
        id: ProjectId,
        input: ProjectInput,
        now: DateTime<Utc>,
    ) -> Result<Project, LedgerError> {
        let mut project = book.project(id)?.clone();
        apply_input(book, &mut project, input)?;
        project.updated_at = now;

        *book.project_mut(id)? = project.clone();
        book.touch(Collection::Projects);
        Ok(project)
    }

    /// Deletes a project nothing is booked against.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `HasDependents` when time entries or payments reference it.
    pub fn delete_project(book: &mut Book, id: ProjectId) -> Result<Project, LedgerError> {
        book.project(id)?;

        let entries = book
            .time_entries
            .iter()
            .filter(|e| e.project_id == Some(id))
            .count();
        if entries > 0 {
            return Err(LedgerError::HasDependents(format!(
                "Cannot delete project with {entries} time entries"
            )));
        }
        let payments = book
            .payments
            .iter()
            .filter(|p| p.project_id == Some(id))
            .count();
        if payments > 0 {
            return Err(LedgerError::HasDependents(format!(
                "Cannot delete project with {payments} payments"
            )));
        }

        let index = book
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LedgerError::not_found("Project", id))?;
        let removed = book.projects.remove(index);
        book.touch(Collection::Projects);
        Ok(removed)
    }
}

/// Merges `input` into `project` and enforces the linkage rules.
fn apply_input(book: &Book, project: &mut Project, input: ProjectInput) -> Result<(), LedgerError> {
    match input.name {
        Some(name) => project.name = require_text(&name, "name")?,
        None if project.name.is_empty() => return Err(LedgerError::validation("name is required")),
        None => {}
    }
    if input.description.is_some() {
        project.description = optional_text(input.description);
    }
    if let Some(hours) = input.estimated_hours {
        project.estimated_hours = require_non_negative(hours, "estimated_hours")?;
    }
    if let Some(status) = input.status {
        project.status = status;
    }

    let is_independent = input.is_independent.unwrap_or(project.is_independent);
    let rate = if is_independent {
        if input.contract_id.is_some() {
            return Err(LedgerError::validation(
                "independent projects cannot reference a contract",
            ));
        }
        let rate = input
            .hourly_rate
            .or(project.hourly_rate)
            .ok_or_else(|| LedgerError::validation("hourly_rate is required for independent projects"))?;
        let rate = require_positive(rate, "hourly_rate")?;

        let client_id = input.client_id.or(project.client_id);
        let linked_name = match client_id {
            Some(id) => Some(book.client(id)?.name.clone()),
            None => None,
        };
        let client_name = match input.client_name {
            Some(name) => optional_text(Some(name)),
            None => project.client_name.clone(),
        }
        .or(linked_name)
        .ok_or_else(|| {
            LedgerError::validation("client_name is required for independent projects")
        })?;

        project.contract_id = None;
        project.client_id = client_id;
        project.hourly_rate = Some(rate);
        project.client_name = Some(client_name);
        rate
    } else {
        let contract_id = input.contract_id.or(project.contract_id).ok_or_else(|| {
            LedgerError::validation("contract_id is required unless the project is independent")
        })?;
        let contract = book.contract(contract_id)?;
        if let Some(client_id) = input.client_id
            && client_id != contract.client_id
        {
            return Err(LedgerError::validation(
                "client_id must match the contract's client",
            ));
        }

        project.contract_id = Some(contract_id);
        project.client_id = Some(contract.client_id);
        project.hourly_rate = None;
        project.client_name = None;
        contract.hourly_rate
    };

    project.is_independent = is_independent;
    project.total_amount = product(project.estimated_hours, rate)?;
    Ok(())
}
