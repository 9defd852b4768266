//! Report routes.
//!
//! One endpoint, `GET /reports?action=…`, dispatching to the read models.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use timebill_core::reports::{ReportService, TimeEntryFilter};
use timebill_shared::types::{CategoryId, ContractId, ProjectId};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::Envelope,
    middleware::CurrentUser,
};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports", get(get_report))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for `/reports`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// `overview`, `monthly`, `active_contracts` or `time-entries`.
    pub action: Option<String>,
    /// `YYYY-MM`. Defaults to the current month for `monthly`.
    pub month: Option<String>,
    /// Time entries report: contract filter.
    pub contract_id: Option<ContractId>,
    /// Time entries report: project filter.
    pub project_id: Option<ProjectId>,
    /// Time entries report: category filter.
    pub category_id: Option<CategoryId>,
    /// Time entries report: first day, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Time entries report: last day, inclusive.
    pub end_date: Option<NaiveDate>,
}

impl ReportQuery {
    fn entry_filter(&self) -> TimeEntryFilter {
        TimeEntryFilter {
            contract_id: self.contract_id,
            project_id: self.project_id,
            category_id: self.category_id,
            month: self.month.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /reports - Dispatch on `action`.
async fn get_report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let book = state.repos.ledger.read().await?;
    let today = state.clock.today();

    let response = match query.action.as_deref().unwrap_or("overview") {
        "overview" => Envelope::ok(ReportService::overview(&book, today)).into_response(),
        "monthly" => {
            let month = query
                .month
                .clone()
                .unwrap_or_else(|| today.format("%Y-%m").to_string());
            Envelope::ok(ReportService::monthly_report(&book, &month)?).into_response()
        }
        "active_contracts" => Envelope::ok(ReportService::active_contracts(&book)).into_response(),
        "time-entries" | "time_entries" => {
            Envelope::ok(ReportService::time_entry_report(&book, &query.entry_filter())?)
                .into_response()
        }
        other => {
            return Err(ApiError::validation(format!(
                "Unknown report action: {other}"
            )));
        }
    };
    Ok(response)
}
