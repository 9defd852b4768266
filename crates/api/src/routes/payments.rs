//! Payment routes.
//!
//! Payments can also be recorded through `/contracts/{id}/payment` and
//! `/projects/{id}/payment`; both share `PaymentRequest` with this module.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::NaiveDate;
use garde::Validate;
use rust_decimal::Decimal;
use serde::Deserialize;
use timebill_core::ledger::validation::required_target;
use timebill_core::ledger::{LedgerService, NewPayment, Payment, PaymentPatch, PaymentType, Target};
use timebill_shared::types::{ContractId, PaymentId, ProjectId};
use tracing::info;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route(
            "/payments/{id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}

/// Query parameters for listing payments.
#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    /// Only payments on this contract.
    pub contract_id: Option<ContractId>,
    /// Only payments on this project.
    pub project_id: Option<ProjectId>,
}

/// Request body for recording or updating a payment.
///
/// `contract_id` / `project_id` are read by `POST /payments` only; the
/// nested routes take the target from the path.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Paid contract.
    #[garde(skip)]
    pub contract_id: Option<ContractId>,
    /// Paid project.
    #[garde(skip)]
    pub project_id: Option<ProjectId>,
    /// Amount; derived from `percentage` when omitted.
    #[garde(skip)]
    pub amount: Option<Decimal>,
    /// Defaults to today.
    #[garde(skip)]
    pub payment_date: Option<NaiveDate>,
    /// Payment kind.
    #[garde(skip)]
    pub payment_type: Option<PaymentType>,
    /// Share of the target's total value, in (0, 100].
    #[garde(skip)]
    pub percentage: Option<Decimal>,
    /// Free text.
    #[garde(length(max = 2000))]
    pub notes: Option<String>,
}

impl PaymentRequest {
    /// Builds the engine input for `target`.
    #[must_use]
    pub fn into_new_payment(self, target: Target) -> NewPayment {
        NewPayment {
            target,
            amount: self.amount,
            payment_date: self.payment_date,
            payment_type: self.payment_type,
            percentage: self.percentage,
            notes: self.notes,
        }
    }
}

/// Records a payment and logs it. Shared by every payment-creating route.
pub(crate) async fn record(
    state: &AppState,
    user: &CurrentUser,
    input: NewPayment,
) -> ApiResult<Envelope<Payment>> {
    user.require_ledger_write()?;
    let target = input.target;
    let payment = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::record_payment(book, input, now))
        .await?;
    info!(
        payment_id = %payment.id,
        ?target,
        amount = %payment.amount,
        by = %user.user_id(),
        "payment recorded"
    );
    Ok(Envelope::created(payment, "Payment recorded"))
}

/// GET /payments - List payments, newest first.
async fn list_payments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListPaymentsQuery>,
) -> ApiResult<Envelope<Vec<Payment>>> {
    let book = state.repos.ledger.read().await?;
    let mut payments: Vec<Payment> = book
        .payments
        .into_iter()
        .filter(|p| query.contract_id.is_none_or(|id| p.contract_id == Some(id)))
        .filter(|p| query.project_id.is_none_or(|id| p.project_id == Some(id)))
        .collect();
    payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id)));
    Ok(Envelope::ok(payments))
}

/// POST /payments - Record a payment against a contract or a project.
async fn create_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<PaymentRequest>,
) -> ApiResult<Envelope<Payment>> {
    let target = required_target(payload.contract_id, payload.project_id)?;
    record(&state, &user, payload.into_new_payment(target)).await
}

/// GET /payments/{id} - Get one payment.
async fn get_payment(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<PaymentId>,
) -> ApiResult<Envelope<Payment>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(book.payment(id)?.clone()))
}

/// PUT /payments/{id} - Update a payment; the target's total moves by the difference.
async fn update_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<PaymentId>,
    ValidJson(payload): ValidJson<PaymentRequest>,
) -> ApiResult<Envelope<Payment>> {
    user.require_ledger_write()?;
    let patch = PaymentPatch {
        amount: payload.amount,
        payment_date: payload.payment_date,
        payment_type: payload.payment_type,
        percentage: payload.percentage,
        notes: payload.notes,
    };
    let payment = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::update_payment(book, id, patch, now))
        .await?;
    info!(payment_id = %id, amount = %payment.amount, by = %user.user_id(), "payment updated");
    Ok(Envelope::with_message(payment, "Payment updated"))
}

/// DELETE /payments/{id} - Delete a payment and reverse its amount.
async fn delete_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<PaymentId>,
) -> ApiResult<Envelope<()>> {
    user.require_ledger_write()?;
    state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::delete_payment(book, id, now))
        .await?;
    info!(payment_id = %id, by = %user.user_id(), "payment deleted");
    Ok(Envelope::message("Payment deleted"))
}
