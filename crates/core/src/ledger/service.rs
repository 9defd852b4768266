//! Ledger service: every write the engine performs.
//!
//! `LedgerService` holds no state. Each operation takes the `Book` it works
//! on plus the current time, validates, mutates, and marks the collections it
//! touched. Persisting those collections is the repository's job.
//!
//! The operations are split by record kind across sibling modules
//! (`contracts`, `projects`, `time_entries`, `payments`); clients,
//! categories and the balance resync live here.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use timebill_shared::types::{CategoryId, ClientId};

use super::balance::{apply_delta, recomputed_total};
use super::book::{Book, Collection};
use super::error::LedgerError;
use super::types::{
    BalanceCorrection, Category, CategoryInput, Client, ClientInput, DEFAULT_CATEGORY_COLOR,
    Target,
};
use super::validation::{optional_text, require_color, require_email, require_text, same_name};

/// Ledger service for every mutation of the billing ledger.
///
/// Pure business logic: no I/O, no clock. Callers serialise access to the
/// `Book` (see the repository's write gate).
pub struct LedgerService;

impl LedgerService {
    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    /// Creates a client.
    ///
    /// # Errors
    ///
    /// `Validation` when name or email is missing or malformed.
    pub fn create_client(
        book: &mut Book,
        input: ClientInput,
        now: DateTime<Utc>,
    ) -> Result<Client, LedgerError> {
        let name = require_text(input.name.as_deref().unwrap_or_default(), "name")?;
        let email = require_email(input.email.as_deref().unwrap_or_default())?;

        let client = Client {
            id: book.next_client_id(),
            name,
            email,
            company: optional_text(input.company),
            contact_person: optional_text(input.contact_person),
            phone: optional_text(input.phone),
            address: optional_text(input.address),
            tax_id: optional_text(input.tax_id),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        book.clients.push(client.clone());
        book.touch(Collection::Clients);
        Ok(client)
    }

    /// Updates a client. Absent fields are kept; blank optional fields are cleared.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown client, `Validation` for a blank name or bad email.
    pub fn update_client(
        book: &mut Book,
        id: ClientId,
        input: ClientInput,
        now: DateTime<Utc>,
    ) -> Result<Client, LedgerError> {
        let name = input.name.as_deref().map(|n| require_text(n, "name")).transpose()?;
        let email = input.email.as_deref().map(require_email).transpose()?;

        let client = book.client_mut(id)?;
        if let Some(name) = name {
            client.name = name;
        }
        if let Some(email) = email {
            client.email = email;
        }
        replace_optional(&mut client.company, input.company);
        replace_optional(&mut client.contact_person, input.contact_person);
        replace_optional(&mut client.phone, input.phone);
        replace_optional(&mut client.address, input.address);
        replace_optional(&mut client.tax_id, input.tax_id);
        if let Some(active) = input.is_active {
            client.is_active = active;
        }
        client.updated_at = now;

        let updated = client.clone();
        book.touch(Collection::Clients);
        Ok(updated)
    }

    /// Deletes a client with no contracts and no contract-linked projects.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown client, `HasDependents` when anything still
    /// references it.
    pub fn delete_client(book: &mut Book, id: ClientId) -> Result<Client, LedgerError> {
        book.client(id)?;

        let contracts = book.contracts.iter().filter(|c| c.client_id == id).count();
        let projects = book
            .projects
            .iter()
            .filter(|p| p.client_id == Some(id) && !p.is_independent)
            .count();
        if contracts > 0 || projects > 0 {
            return Err(LedgerError::HasDependents(format!(
                "Cannot delete client with {contracts} contract(s) and {projects} project(s)"
            )));
        }

        let index = book
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| LedgerError::not_found("Client", id))?;
        let removed = book.clients.remove(index);
        book.touch(Collection::Clients);

        // Independent projects keep their free-text client name.
        let mut unlinked = false;
        for project in book
            .projects
            .iter_mut()
            .filter(|p| p.client_id == Some(id))
        {
            project.client_id = None;
            if project.client_name.is_none() {
                project.client_name = Some(removed.name.clone());
            }
            unlinked = true;
        }
        if unlinked {
            book.touch(Collection::Projects);
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing name or bad colour, `Conflict` when the name
    /// is taken (ignoring case).
    pub fn create_category(
        book: &mut Book,
        input: CategoryInput,
        now: DateTime<Utc>,
    ) -> Result<Category, LedgerError> {
        let name = require_text(input.name.as_deref().unwrap_or_default(), "name")?;
        ensure_unique_category(book, &name, None)?;
        let color = require_color(input.color.as_deref().unwrap_or(DEFAULT_CATEGORY_COLOR))?;

        let category = Category {
            id: book.next_category_id(),
            name,
            color,
            description: optional_text(input.description),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        book.categories.push(category.clone());
        book.touch(Collection::Categories);
        Ok(category)
    }

    /// Patches a category.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation`, or `Conflict` on a duplicate name.
    pub fn update_category(
        book: &mut Book,
        id: CategoryId,
        input: CategoryInput,
        now: DateTime<Utc>,
    ) -> Result<Category, LedgerError> {
        book.category(id)?;
        let name = input.name.as_deref().map(|n| require_text(n, "name")).transpose()?;
        if let Some(name) = &name {
            ensure_unique_category(book, name, Some(id))?;
        }
        let color = input.color.as_deref().map(require_color).transpose()?;

        let category = book.category_mut(id)?;
        if let Some(name) = name {
            category.name = name;
        }
        if let Some(color) = color {
            category.color = color;
        }
        replace_optional(&mut category.description, input.description);
        if let Some(active) = input.is_active {
            category.is_active = active;
        }
        category.updated_at = now;

        let updated = category.clone();
        book.touch(Collection::Categories);
        Ok(updated)
    }

    /// Deletes a category, moving its time entries to General.
    ///
    /// Returns how many entries were reassigned.
    ///
    /// # Errors
    ///
    /// `Protected` for General, `NotFound` for an unknown category.
    pub fn delete_category(
        book: &mut Book,
        id: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<usize, LedgerError> {
        if id == CategoryId::GENERAL {
            return Err(LedgerError::Protected(
                "The General category cannot be deleted".to_string(),
            ));
        }
        book.category(id)?;

        let mut reassigned = 0;
        for entry in book.time_entries.iter_mut().filter(|e| e.category_id == id) {
            entry.category_id = CategoryId::GENERAL;
            entry.updated_at = now;
            reassigned += 1;
        }
        if reassigned > 0 {
            book.touch(Collection::TimeEntries);
        }

        book.categories.retain(|c| c.id != id);
        book.touch(Collection::Categories);
        Ok(reassigned)
    }

    // ------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------

    /// Recomputes every running total from payments and billed entries.
    ///
    /// Returns the totals that differed. Records are only touched when a
    /// correction is made.
    pub fn resync_balances(book: &mut Book, now: DateTime<Utc>) -> Vec<BalanceCorrection> {
        let mut corrections = Vec::new();

        let contract_totals: Vec<_> = book
            .contracts
            .iter()
            .map(|c| (c.id, c.billed_amount, recomputed_total(book, Target::Contract(c.id))))
            .collect();
        for (id, previous, recomputed) in contract_totals {
            if previous == recomputed {
                continue;
            }
            if let Ok(contract) = book.contract_mut(id) {
                contract.billed_amount = recomputed;
                contract.updated_at = now;
            }
            book.touch(Collection::Contracts);
            corrections.push(BalanceCorrection {
                target: Target::Contract(id),
                previous,
                recomputed,
            });
        }

        let project_totals: Vec<_> = book
            .projects
            .iter()
            .map(|p| (p.id, p.paid_amount, recomputed_total(book, Target::Project(p.id))))
            .collect();
        for (id, previous, recomputed) in project_totals {
            if previous == recomputed {
                continue;
            }
            if let Ok(project) = book.project_mut(id) {
                project.paid_amount = recomputed;
                project.updated_at = now;
            }
            book.touch(Collection::Projects);
            corrections.push(BalanceCorrection {
                target: Target::Project(id),
                previous,
                recomputed,
            });
        }

        corrections
    }

    /// Moves a target's running total by `delta`, flooring at zero.
    ///
    /// A missing target is skipped: its contributions vanished with it.
    pub(crate) fn adjust_balance(
        book: &mut Book,
        target: Target,
        delta: Decimal,
        now: DateTime<Utc>,
    ) {
        if delta.is_zero() {
            return;
        }
        match target {
            Target::Contract(id) => {
                if let Ok(contract) = book.contract_mut(id) {
                    contract.billed_amount = apply_delta(contract.billed_amount, delta);
                    contract.updated_at = now;
                    book.touch(Collection::Contracts);
                }
            }
            Target::Project(id) => {
                if let Ok(project) = book.project_mut(id) {
                    project.paid_amount = apply_delta(project.paid_amount, delta);
                    project.updated_at = now;
                    book.touch(Collection::Projects);
                }
            }
        }
    }

    /// Records `date` as the target's last payment date.
    ///
    /// With `only_if_newer` the date never moves backwards.
    pub(crate) fn stamp_payment_date(
        book: &mut Book,
        target: Target,
        date: NaiveDate,
        only_if_newer: bool,
    ) {
        let slot = match target {
            Target::Contract(id) => book.contract_mut(id).ok().map(|c| &mut c.last_payment_date),
            Target::Project(id) => book.project_mut(id).ok().map(|p| &mut p.last_payment_date),
        };
        let Some(slot) = slot else {
            return;
        };
        if !only_if_newer || slot.is_none_or(|current| date >= current) {
            *slot = Some(date);
            book.touch(match target {
                Target::Contract(_) => Collection::Contracts,
                Target::Project(_) => Collection::Projects,
            });
        }
    }
}

/// `Some` replaces (blank clears), `None` keeps.
fn replace_optional(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = optional_text(value);
    }
}

fn ensure_unique_category(
    book: &Book,
    name: &str,
    except: Option<CategoryId>,
) -> Result<(), LedgerError> {
    let taken = book
        .categories
        .iter()
        .any(|c| Some(c.id) != except && same_name(&c.name, name));
    if taken {
        return Err(LedgerError::Conflict(format!(
            "Category name already exists: {name}"
        )));
    }
    Ok(())
}
