//! Contract routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use timebill_core::ledger::{
    ContractDeletion, ContractPatch, ContractStatus, LedgerService, NewContract, Payment, Target,
};
use timebill_core::reports::{ContractView, ReportService};
use timebill_shared::types::{ClientId, ContractId, ProjectId};
use tracing::info;

use super::{payments::PaymentRequest, required};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the contract routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contracts", get(list_contracts).post(create_contract))
        .route(
            "/contracts/{id}",
            get(get_contract).put(update_contract).delete(delete_contract),
        )
        .route("/contracts/{id}/payment", post(record_contract_payment))
}

/// Query parameters for listing contracts.
#[derive(Debug, Default, Deserialize)]
pub struct ListContractsQuery {
    /// Only this client's contracts.
    pub client_id: Option<ClientId>,
    /// Only contracts in this status.
    pub status: Option<ContractStatus>,
}

/// Query parameters for deleting a contract.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteContractQuery {
    /// Delete even when entries, projects or payments reference the contract.
    #[serde(default)]
    pub force: bool,
}

/// Request body for creating or updating a contract.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContractRequest {
    /// Owning client; required on create.
    #[garde(skip)]
    pub client_id: Option<ClientId>,
    /// Unique number; required on create.
    #[garde(length(min = 1, max = 100))]
    pub contract_number: Option<String>,
    /// Free text.
    #[garde(skip)]
    pub description: Option<String>,
    /// Hour budget; required on create.
    #[garde(skip)]
    pub total_hours: Option<Decimal>,
    /// Rate per hour; required on create.
    #[garde(skip)]
    pub hourly_rate: Option<Decimal>,
    /// Lifecycle status.
    #[garde(skip)]
    pub status: Option<ContractStatus>,
    /// Start date.
    #[garde(skip)]
    pub start_date: Option<NaiveDate>,
    /// End date.
    #[garde(skip)]
    pub end_date: Option<NaiveDate>,
}

/// Result of a forced or dependency-free contract deletion.
#[derive(Debug, Serialize)]
pub struct ContractDeletionSummary {
    /// Time entries removed with the contract.
    pub removed_time_entries: usize,
    /// Payments removed with the contract.
    pub removed_payments: usize,
    /// Projects turned independent and cancelled.
    pub detached_projects: Vec<ProjectId>,
}

/// GET /contracts - List contracts with their consumption.
async fn list_contracts(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListContractsQuery>,
) -> ApiResult<Envelope<Vec<ContractView>>> {
    let book = state.repos.ledger.read().await?;
    let views = ReportService::contract_views(&book)
        .into_iter()
        .filter(|v| query.client_id.is_none_or(|id| v.contract.client_id == id))
        .filter(|v| query.status.is_none_or(|s| v.contract.status == s))
        .collect();
    Ok(Envelope::ok(views))
}

/// POST /contracts - Create a contract.
async fn create_contract(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<ContractRequest>,
) -> ApiResult<Envelope<ContractView>> {
    user.require_ledger_write()?;
    let input = NewContract {
        client_id: required(payload.client_id, "client_id")?,
        contract_number: required(payload.contract_number, "contract_number")?,
        description: payload.description,
        total_hours: required(payload.total_hours, "total_hours")?,
        hourly_rate: required(payload.hourly_rate, "hourly_rate")?,
        status: payload.status,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };
    let view = state
        .repos
        .ledger
        .mutate(|book, now| {
            let contract = LedgerService::create_contract(book, input, now)?;
            ReportService::contract_view(book, contract.id)
        })
        .await?;
    info!(
        contract_id = %view.contract.id,
        number = %view.contract.contract_number,
        by = %user.user_id(),
        "contract created"
    );
    Ok(Envelope::created(view, "Contract created"))
}

/// GET /contracts/{id} - Get one contract with its consumption.
async fn get_contract(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<ContractId>,
) -> ApiResult<Envelope<ContractView>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(ReportService::contract_view(&book, id)?))
}

/// PUT /contracts/{id} - Update a contract.
async fn update_contract(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ContractId>,
    ValidJson(payload): ValidJson<ContractRequest>,
) -> ApiResult<Envelope<ContractView>> {
    user.require_ledger_write()?;
    let patch = ContractPatch {
        client_id: payload.client_id,
        contract_number: payload.contract_number,
        description: payload.description,
        total_hours: payload.total_hours,
        hourly_rate: payload.hourly_rate,
        status: payload.status,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };
    let view = state
        .repos
        .ledger
        .mutate(|book, now| {
            LedgerService::update_contract(book, id, patch, now)?;
            ReportService::contract_view(book, id)
        })
        .await?;
    info!(contract_id = %id, by = %user.user_id(), "contract updated");
    Ok(Envelope::with_message(view, "Contract updated"))
}

/// DELETE /contracts/{id} - Delete a contract.
///
/// Without `force=true` a contract with dependents is left alone and the
/// response asks for confirmation.
async fn delete_contract(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ContractId>,
    Query(query): Query<DeleteContractQuery>,
) -> ApiResult<Envelope<ContractDeletionSummary>> {
    user.require_delete()?;
    let outcome = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::delete_contract(book, id, query.force, now))
        .await?;

    match outcome {
        ContractDeletion::ConfirmationRequired(dependents) => {
            Err(ApiError::ConfirmationRequired(dependents))
        }
        ContractDeletion::Deleted {
            removed_time_entries,
            removed_payments,
            detached_projects,
        } => {
            info!(
                contract_id = %id,
                removed_time_entries,
                removed_payments,
                detached = detached_projects.len(),
                by = %user.user_id(),
                "contract deleted"
            );
            Ok(Envelope::with_message(
                ContractDeletionSummary {
                    removed_time_entries,
                    removed_payments,
                    detached_projects,
                },
                "Contract deleted",
            ))
        }
    }
}

/// POST /contracts/{id}/payment - Record a payment on a contract.
async fn record_contract_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ContractId>,
    ValidJson(payload): ValidJson<PaymentRequest>,
) -> ApiResult<Envelope<Payment>> {
    super::payments::record(&state, &user, payload.into_new_payment(Target::Contract(id))).await
}
