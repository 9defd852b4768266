//! Field-level guards shared by the ledger operations.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use timebill_shared::types::{ContractId, ProjectId};

use super::error::LedgerError;
use super::types::Target;

/// Trims `value` and rejects it when empty.
pub fn require_text(value: &str, field: &str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional value, mapping blank strings to `None`.
#[must_use]
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Upper bound for any hours, rate or amount input (one billion).
///
/// Keeps every `hours × rate` product and running total well inside
/// `Decimal`'s range.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Rejects zero, negative and out-of-range amounts.
pub fn require_positive(value: Decimal, field: &str) -> Result<Decimal, LedgerError> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "{field} must be greater than zero"
        )));
    }
    require_in_range(value, field)
}

/// Rejects negative and out-of-range amounts.
pub fn require_non_negative(value: Decimal, field: &str) -> Result<Decimal, LedgerError> {
    if value < Decimal::ZERO {
        return Err(LedgerError::validation(format!("{field} cannot be negative")));
    }
    require_in_range(value, field)
}

fn require_in_range(value: Decimal, field: &str) -> Result<Decimal, LedgerError> {
    if value > MAX_QUANTITY {
        return Err(LedgerError::validation(format!(
            "{field} cannot exceed {MAX_QUANTITY}"
        )));
    }
    Ok(value)
}

/// `a × b`, rejecting results `Decimal` cannot hold.
pub fn product(a: Decimal, b: Decimal) -> Result<Decimal, LedgerError> {
    a.checked_mul(b)
        .ok_or_else(|| LedgerError::validation("amount out of range"))
}

/// Accepts percentages in `(0, 100]`.
pub fn require_percentage(value: Decimal) -> Result<Decimal, LedgerError> {
    if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(LedgerError::validation(
            "percentage must be between 0 and 100",
        ));
    }
    Ok(value)
}

/// Minimal shape check: `local@domain.tld`.
pub fn require_email(value: &str) -> Result<String, LedgerError> {
    let email = require_text(value, "email")?;
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if !valid {
        return Err(LedgerError::validation(format!("invalid email: {email}")));
    }
    Ok(email)
}

/// Accepts `#RRGGBB`, normalised to upper case.
pub fn require_color(value: &str) -> Result<String, LedgerError> {
    let color = value.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(LedgerError::validation(format!(
            "color must be a hex value like #1A2B3C, got {color}"
        )));
    }
    Ok(color.to_ascii_uppercase())
}

/// Case-insensitive equality over full Unicode, so `Diseño` matches `DISEÑO`.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// `YYYY-MM` prefix of a date.
#[must_use]
pub fn month_year(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parses a `YYYY-MM` month.
pub fn parse_month(value: &str) -> Result<(i32, u32), LedgerError> {
    let invalid = || LedgerError::validation(format!("month must be YYYY-MM, got {value}"));
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || year < 1 {
        return Err(invalid());
    }
    Ok((year, month))
}

/// At most one of contract/project. `None` means untracked.
pub fn optional_target(
    contract_id: Option<ContractId>,
    project_id: Option<ProjectId>,
) -> Result<Option<Target>, LedgerError> {
    match (contract_id, project_id) {
        (Some(_), Some(_)) => Err(LedgerError::validation(
            "an entry can reference a contract or a project, not both",
        )),
        (Some(id), None) => Ok(Some(Target::Contract(id))),
        (None, Some(id)) => Ok(Some(Target::Project(id))),
        (None, None) => Ok(None),
    }
}

/// Exactly one of contract/project.
pub fn required_target(
    contract_id: Option<ContractId>,
    project_id: Option<ProjectId>,
) -> Result<Target, LedgerError> {
    optional_target(contract_id, project_id)?
        .ok_or_else(|| LedgerError::validation("contract_id or project_id is required"))
}
