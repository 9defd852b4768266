//! Time entry operations.
//!
//! Contract hours are guarded: an entry may only consume what the contract
//! still has. Entries on independent projects bill the project directly,
//! adding their amount to its `paid_amount`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use timebill_shared::types::{CategoryId, TimeEntryId};

use super::balance::{contract_hours_used, entry_contribution, remaining};
use super::book::{Book, Collection};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{Target, TimeEntry, TimeEntryInput};
use super::validation::{
    month_year, optional_target, product, require_positive, require_text,
};

/// Validated entry fields, before the record is assembled.
struct ResolvedEntry {
    target: Option<Target>,
    category_id: CategoryId,
    description: String,
    amount: Decimal,
    bills_project: bool,
}

impl LedgerService {
    /// Records hours worked.
    ///
    /// # Errors
    ///
    /// `Validation` for bad fields, `NotFound` for an unknown contract,
    /// project or category, `InsufficientHours` when a contract's budget
    /// would be exceeded.
    pub fn record_time_entry(
        book: &mut Book,
        input: TimeEntryInput,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, LedgerError> {
        let resolved = resolve(book, &input, None)?;
        let entry = build(book.next_time_entry_id(), &input, resolved, now, now);

        if let Some((target, amount)) = entry_contribution(&entry) {
            Self::adjust_balance(book, target, amount, now);
        }
        book.time_entries.push(entry.clone());
        book.touch(Collection::TimeEntries);
        Ok(entry)
    }

    /// Replaces a time entry.
    ///
    /// The hour guard only charges the difference against the entry's old
    /// hours when the contract is unchanged. Independent-project billing is
    /// moved by the amount difference, or reversed and re-applied when the
    /// project changes.
    ///
    /// # Errors
    ///
    /// As [`LedgerService::record_time_entry`], plus `NotFound` for the entry.
    pub fn update_time_entry(
        book: &mut Book,
        id: TimeEntryId,
        input: TimeEntryInput,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, LedgerError> {
        let old = book.time_entry(id)?.clone();
        let resolved = resolve(book, &input, Some(&old))?;
        let entry = build(id, &input, resolved, old.created_at, now);

        match (entry_contribution(&old), entry_contribution(&entry)) {
            (Some((before, old_amount)), Some((after, new_amount))) if before == after => {
                Self::adjust_balance(book, after, new_amount - old_amount, now);
            }
            (before, after) => {
                if let Some((target, amount)) = before {
                    Self::adjust_balance(book, target, -amount, now);
                }
                if let Some((target, amount)) = after {
                    Self::adjust_balance(book, target, amount, now);
                }
            }
        }

        *book.time_entry_mut(id)? = entry.clone();
        book.touch(Collection::TimeEntries);
        Ok(entry)
    }

    /// Deletes a time entry, reversing any project billing it caused.
    ///
    /// Contract hours need no adjustment: they are recomputed on read.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown entry.
    pub fn delete_time_entry(
        book: &mut Book,
        id: TimeEntryId,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, LedgerError> {
        let old = book.time_entry(id)?.clone();
        if let Some((target, amount)) = entry_contribution(&old) {
            Self::adjust_balance(book, target, -amount, now);
        }
        book.time_entries.retain(|e| e.id != id);
        book.touch(Collection::TimeEntries);
        Ok(old)
    }
}

fn resolve(
    book: &Book,
    input: &TimeEntryInput,
    replacing: Option<&TimeEntry>,
) -> Result<ResolvedEntry, LedgerError> {
    let description = require_text(&input.description, "description")?;
    let hours = require_positive(input.hours_used, "hours_used")?;
    let target = optional_target(input.contract_id, input.project_id)?;

    let category_id = input.category_id.unwrap_or(CategoryId::GENERAL);
    let category = book.category(category_id)?;
    let keeps_category = replacing.is_some_and(|e| e.category_id == category_id);
    if !category.is_active && !keeps_category {
        return Err(LedgerError::validation(format!(
            "Category is inactive: {}",
            category.name
        )));
    }

    let (amount, bills_project) = match target {
        Some(Target::Contract(contract_id)) => {
            let contract = book.contract(contract_id)?;
            let used = contract_hours_used(&book.time_entries, contract_id);
            // The replaced entry's hours are already in `used`.
            let previous = replacing
                .filter(|e| e.contract_id == Some(contract_id))
                .map_or(Decimal::ZERO, |e| e.hours_used);
            let hours_difference = hours - previous;
            if used + hours_difference > contract.total_hours {
                return Err(LedgerError::InsufficientHours {
                    requested: hours,
                    remaining: remaining(contract.total_hours, used - previous),
                });
            }
            (product(hours, contract.hourly_rate)?, false)
        }
        Some(Target::Project(project_id)) => {
            let project = book.project(project_id)?;
            let rate = if project.is_independent {
                project.hourly_rate.unwrap_or_default()
            } else {
                project
                    .contract_id
                    .and_then(|id| book.contract(id).ok())
                    .map_or(Decimal::ZERO, |c| c.hourly_rate)
            };
            // An entry kept on the same project keeps its billing mode, even
            // if the project has since been detached from its contract.
            let bills_project = replacing
                .filter(|e| e.project_id == Some(project_id))
                .map_or(project.is_independent, |e| e.bills_project);
            (product(hours, rate)?, bills_project)
        }
        None => (Decimal::ZERO, false),
    };

    Ok(ResolvedEntry {
        target,
        category_id,
        description,
        amount,
        bills_project,
    })
}

fn build(
    id: TimeEntryId,
    input: &TimeEntryInput,
    resolved: ResolvedEntry,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TimeEntry {
    let (contract_id, project_id) = match resolved.target {
        Some(Target::Contract(id)) => (Some(id), None),
        Some(Target::Project(id)) => (None, Some(id)),
        None => (None, None),
    };
    TimeEntry {
        id,
        contract_id,
        project_id,
        category_id: resolved.category_id,
        description: resolved.description,
        hours_used: input.hours_used,
        entry_date: input.entry_date,
        month_year: month_year(input.entry_date),
        amount: resolved.amount,
        bills_project: resolved.bills_project,
        created_at,
        updated_at: now,
    }
}
