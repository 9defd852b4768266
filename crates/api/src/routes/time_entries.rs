//! Time entry routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::NaiveDate;
use garde::Validate;
use rust_decimal::Decimal;
use serde::Deserialize;
use timebill_core::ledger::{LedgerService, TimeEntryInput};
use timebill_core::reports::{ReportService, TimeEntryFilter, TimeEntryView};
use timebill_shared::types::{CategoryId, ContractId, ProjectId, TimeEntryId};
use tracing::info;

use super::required;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the time entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/time-entries", get(list_time_entries).post(create_time_entry))
        .route(
            "/time-entries/{id}",
            get(get_time_entry)
                .put(update_time_entry)
                .delete(delete_time_entry),
        )
}

/// Request body for recording or replacing a time entry.
///
/// Setting neither `contract_id` nor `project_id` records untracked time.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TimeEntryRequest {
    /// Contract the hours are drawn from.
    #[garde(skip)]
    pub contract_id: Option<ContractId>,
    /// Project the hours are booked on.
    #[garde(skip)]
    pub project_id: Option<ProjectId>,
    /// Category; General when omitted.
    #[garde(skip)]
    pub category_id: Option<CategoryId>,
    /// What was done.
    #[garde(length(min = 1, max = 2000))]
    pub description: Option<String>,
    /// Hours worked.
    #[garde(skip)]
    pub hours_used: Option<Decimal>,
    /// Day the work was done.
    #[garde(skip)]
    pub entry_date: Option<NaiveDate>,
}

impl TryFrom<TimeEntryRequest> for TimeEntryInput {
    type Error = crate::error::ApiError;

    fn try_from(req: TimeEntryRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            contract_id: req.contract_id,
            project_id: req.project_id,
            category_id: req.category_id,
            description: required(req.description, "description")?,
            hours_used: required(req.hours_used, "hours_used")?,
            entry_date: required(req.entry_date, "entry_date")?,
        })
    }
}

/// GET /time-entries - List entries, newest first.
///
/// Filters: `contract_id`, `project_id`, `category_id`, `month` (`YYYY-MM`),
/// `start_date`, `end_date`.
async fn list_time_entries(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(filter): Query<TimeEntryFilter>,
) -> ApiResult<Envelope<Vec<TimeEntryView>>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(ReportService::time_entry_views(&book, &filter)?))
}

/// POST /time-entries - Record a time entry.
async fn create_time_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<TimeEntryRequest>,
) -> ApiResult<Envelope<TimeEntryView>> {
    user.require_ledger_write()?;
    let input = TimeEntryInput::try_from(payload)?;
    let view = state
        .repos
        .ledger
        .mutate(|book, now| {
            let entry = LedgerService::record_time_entry(book, input, now)?;
            ReportService::time_entry_view(book, entry.id)
        })
        .await?;
    info!(
        time_entry_id = %view.entry.id,
        hours = %view.entry.hours_used,
        contract_id = ?view.entry.contract_id,
        project_id = ?view.entry.project_id,
        by = %user.user_id(),
        "time entry recorded"
    );
    Ok(Envelope::created(view, "Time entry recorded"))
}

/// GET /time-entries/{id} - Get one entry.
async fn get_time_entry(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<TimeEntryId>,
) -> ApiResult<Envelope<TimeEntryView>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(ReportService::time_entry_view(&book, id)?))
}

/// PUT /time-entries/{id} - Replace an entry.
async fn update_time_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<TimeEntryId>,
    ValidJson(payload): ValidJson<TimeEntryRequest>,
) -> ApiResult<Envelope<TimeEntryView>> {
    user.require_ledger_write()?;
    let input = TimeEntryInput::try_from(payload)?;
    let view = state
        .repos
        .ledger
        .mutate(|book, now| {
            LedgerService::update_time_entry(book, id, input, now)?;
            ReportService::time_entry_view(book, id)
        })
        .await?;
    info!(time_entry_id = %id, hours = %view.entry.hours_used, by = %user.user_id(), "time entry updated");
    Ok(Envelope::with_message(view, "Time entry updated"))
}

/// DELETE /time-entries/{id} - Delete an entry.
async fn delete_time_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<TimeEntryId>,
) -> ApiResult<Envelope<()>> {
    user.require_ledger_write()?;
    state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::delete_time_entry(book, id, now))
        .await?;
    info!(time_entry_id = %id, by = %user.user_id(), "time entry deleted");
    Ok(Envelope::message("Time entry deleted"))
}
