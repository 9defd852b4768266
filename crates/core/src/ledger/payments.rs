//! Payment operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use timebill_shared::types::PaymentId;

use super::balance::payment_contribution;
use super::book::{Book, Collection};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{NewPayment, Payment, PaymentPatch, PaymentType, Target};
use super::validation::{optional_text, product, require_percentage, require_positive};

impl LedgerService {
    /// Records a payment and adds it to the target's running total.
    ///
    /// Without an explicit amount, `percentage` of the target's total value
    /// is used (rounded to cents). The payment date defaults to today and
    /// always becomes the target's last payment date.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown target, `Validation` when no positive amount
    /// can be determined.
    pub fn record_payment(
        book: &mut Book,
        input: NewPayment,
        now: DateTime<Utc>,
    ) -> Result<Payment, LedgerError> {
        let total_value = target_total_value(book, input.target)?;
        let percentage = input.percentage.map(require_percentage).transpose()?;

        let derived = input.amount.is_none();
        let amount = match (input.amount, percentage) {
            (Some(amount), _) => amount,
            (None, Some(pct)) => (product(total_value, pct)? / Decimal::ONE_HUNDRED).round_dp(2),
            (None, None) => return Err(LedgerError::validation("amount is required")),
        };
        let amount = require_positive(amount, "amount")?;

        let payment_type = input.payment_type.unwrap_or(if derived {
            PaymentType::Percentage
        } else {
            PaymentType::Partial
        });
        let payment_date = input.payment_date.unwrap_or_else(|| now.date_naive());
        let (contract_id, project_id) = match input.target {
            Target::Contract(id) => (Some(id), None),
            Target::Project(id) => (None, Some(id)),
        };

        let payment = Payment {
            id: book.next_payment_id(),
            contract_id,
            project_id,
            amount,
            payment_date,
            payment_type,
            percentage,
            notes: optional_text(input.notes),
            created_at: now,
            updated_at: now,
        };

        Self::adjust_balance(book, input.target, amount, now);
        Self::stamp_payment_date(book, input.target, payment_date, false);
        book.payments.push(payment.clone());
        book.touch(Collection::Payments);
        Ok(payment)
    }

    /// Patches a payment, moving the target's total by the amount difference.
    ///
    /// The last payment date only moves forward.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Validation` for a non-positive amount or bad percentage.
    pub fn update_payment(
        book: &mut Book,
        id: PaymentId,
        patch: PaymentPatch,
        now: DateTime<Utc>,
    ) -> Result<Payment, LedgerError> {
        let mut payment = book.payment(id)?.clone();
        let (target, old_amount) = payment_contribution(&payment)
            .ok_or_else(|| LedgerError::validation("payment has no contract or project"))?;

        if let Some(amount) = patch.amount {
            payment.amount = require_positive(amount, "amount")?;
        }
        if let Some(pct) = patch.percentage {
            payment.percentage = Some(require_percentage(pct)?);
        }
        if let Some(date) = patch.payment_date {
            payment.payment_date = date;
        }
        if let Some(kind) = patch.payment_type {
            payment.payment_type = kind;
        }
        if patch.notes.is_some() {
            payment.notes = optional_text(patch.notes);
        }
        payment.updated_at = now;

        let amount_difference = payment.amount - old_amount;
        Self::adjust_balance(book, target, amount_difference, now);
        Self::stamp_payment_date(book, target, payment.payment_date, true);

        *book.payment_mut(id)? = payment.clone();
        book.touch(Collection::Payments);
        Ok(payment)
    }

    /// Deletes a payment and subtracts it from the target's total.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown payment.
    pub fn delete_payment(
        book: &mut Book,
        id: PaymentId,
        now: DateTime<Utc>,
    ) -> Result<Payment, LedgerError> {
        let payment = book.payment(id)?.clone();
        if let Some((target, amount)) = payment_contribution(&payment) {
            Self::adjust_balance(book, target, -amount, now);
        }
        book.payments.retain(|p| p.id != id);
        book.touch(Collection::Payments);
        Ok(payment)
    }
}

/// Contract value or project total; also checks the target exists.
fn target_total_value(book: &Book, target: Target) -> Result<Decimal, LedgerError> {
    match target {
        Target::Contract(id) => Ok(book.contract(id)?.total_value()),
        Target::Project(id) => Ok(book.project(id)?.total_amount),
    }
}
