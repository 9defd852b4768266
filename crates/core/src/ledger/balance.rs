//! Balance aggregation.
//!
//! Two paths move money totals:
//! - mutations apply a signed delta to a running total (`apply_delta`),
//! - resync and consistency checks fold leaf records from scratch
//!   (`recomputed_total`).
//!
//! Both go through `contributions`, so a record always counts the same way
//! whichever path reads it. Hours are never cached; `hours_used` folds
//! time entries on every call.

use rust_decimal::Decimal;
use timebill_shared::types::{ContractId, ProjectId};

use super::book::Book;
use super::types::{Payment, Target, TimeEntry};

/// Adds a signed delta to a running total, flooring at zero.
#[must_use]
pub fn apply_delta(total: Decimal, delta: Decimal) -> Decimal {
    (total + delta).max(Decimal::ZERO)
}

/// `max(0, total − used)`.
#[must_use]
pub fn remaining(total: Decimal, used: Decimal) -> Decimal {
    (total - used).max(Decimal::ZERO)
}

/// What a payment adds to its target's running total.
#[must_use]
pub fn payment_contribution(payment: &Payment) -> Option<(Target, Decimal)> {
    match (payment.contract_id, payment.project_id) {
        (Some(id), _) => Some((Target::Contract(id), payment.amount)),
        (None, Some(id)) => Some((Target::Project(id), payment.amount)),
        (None, None) => None,
    }
}

/// What a time entry adds to an independent project's `paid_amount`.
#[must_use]
pub fn entry_contribution(entry: &TimeEntry) -> Option<(Target, Decimal)> {
    match entry.project_id {
        Some(id) if entry.bills_project => Some((Target::Project(id), entry.amount)),
        _ => None,
    }
}

/// Every money contribution recorded in the book.
pub fn contributions(book: &Book) -> impl Iterator<Item = (Target, Decimal)> + '_ {
    book.payments
        .iter()
        .filter_map(payment_contribution)
        .chain(book.time_entries.iter().filter_map(entry_contribution))
}

/// Running total recomputed from leaf records.
#[must_use]
pub fn recomputed_total(book: &Book, target: Target) -> Decimal {
    contributions(book)
        .filter(|(t, _)| *t == target)
        .map(|(_, amount)| amount)
        .sum()
}

/// Stored running total of a target, if it exists.
#[must_use]
pub fn stored_total(book: &Book, target: Target) -> Option<Decimal> {
    match target {
        Target::Contract(id) => book.contract(id).ok().map(|c| c.billed_amount),
        Target::Project(id) => book.project(id).ok().map(|p| p.paid_amount),
    }
}

/// Hours booked on a contract.
#[must_use]
pub fn contract_hours_used(entries: &[TimeEntry], contract_id: ContractId) -> Decimal {
    entries
        .iter()
        .filter(|e| e.contract_id == Some(contract_id))
        .map(|e| e.hours_used)
        .sum()
}

/// Hours booked on a project.
#[must_use]
pub fn project_hours_used(entries: &[TimeEntry], project_id: ProjectId) -> Decimal {
    entries
        .iter()
        .filter(|e| e.project_id == Some(project_id))
        .map(|e| e.hours_used)
        .sum()
}
