//! Project routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use garde::Validate;
use rust_decimal::Decimal;
use serde::Deserialize;
use timebill_core::ledger::{LedgerService, Payment, ProjectInput, ProjectStatus, Target};
use timebill_core::reports::{ProjectView, ReportService};
use timebill_shared::types::{ClientId, ContractId, ProjectId};
use tracing::info;

use super::payments::PaymentRequest;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/{id}/payment", post(record_project_payment))
}

/// Query parameters for listing projects.
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    /// Only projects under this contract.
    pub contract_id: Option<ContractId>,
    /// Only this client's projects.
    pub client_id: Option<ClientId>,
    /// Only independent (or only linked) projects.
    pub independent: Option<bool>,
    /// Only projects in this status.
    pub status: Option<ProjectStatus>,
}

/// Request body for creating or updating a project.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProjectRequest {
    /// Project name; required on create.
    #[garde(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// Free text.
    #[garde(skip)]
    pub description: Option<String>,
    /// Parent contract for a linked project.
    #[garde(skip)]
    pub contract_id: Option<ContractId>,
    /// Client of an independent project.
    #[garde(skip)]
    pub client_id: Option<ClientId>,
    /// Independent projects carry their own rate and client name.
    #[garde(skip)]
    pub is_independent: Option<bool>,
    /// Rate of an independent project.
    #[garde(skip)]
    pub hourly_rate: Option<Decimal>,
    /// Client name of an independent project.
    #[garde(skip)]
    pub client_name: Option<String>,
    /// Estimated hours.
    #[garde(skip)]
    pub estimated_hours: Option<Decimal>,
    /// Lifecycle status.
    #[garde(skip)]
    pub status: Option<ProjectStatus>,
}

impl From<ProjectRequest> for ProjectInput {
    fn from(req: ProjectRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            contract_id: req.contract_id,
            client_id: req.client_id,
            is_independent: req.is_independent,
            hourly_rate: req.hourly_rate,
            client_name: req.client_name,
            estimated_hours: req.estimated_hours,
            status: req.status,
        }
    }
}

/// GET /projects - List projects with their consumption.
async fn list_projects(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Envelope<Vec<ProjectView>>> {
    let book = state.repos.ledger.read().await?;
    let views = ReportService::project_views(&book)
        .into_iter()
        .filter(|v| query.contract_id.is_none_or(|id| v.project.contract_id == Some(id)))
        .filter(|v| query.client_id.is_none_or(|id| v.project.client_id == Some(id)))
        .filter(|v| query.independent.is_none_or(|i| v.project.is_independent == i))
        .filter(|v| query.status.is_none_or(|s| v.project.status == s))
        .collect();
    Ok(Envelope::ok(views))
}

/// POST /projects - Create a project.
async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<ProjectRequest>,
) -> ApiResult<Envelope<ProjectView>> {
    user.require_ledger_write()?;
    let input = ProjectInput::from(payload);
    let view = state
        .repos
        .ledger
        .mutate(|book, now| {
            let project = LedgerService::create_project(book, input, now)?;
            ReportService::project_view(book, project.id)
        })
        .await?;
    info!(
        project_id = %view.project.id,
        independent = view.project.is_independent,
        by = %user.user_id(),
        "project created"
    );
    Ok(Envelope::created(view, "Project created"))
}

/// GET /projects/{id} - Get one project with its consumption.
async fn get_project(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<ProjectId>,
) -> ApiResult<Envelope<ProjectView>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(ReportService::project_view(&book, id)?))
}

/// PUT /projects/{id} - Update a project.
async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ProjectId>,
    ValidJson(payload): ValidJson<ProjectRequest>,
) -> ApiResult<Envelope<ProjectView>> {
    user.require_ledger_write()?;
    let input = ProjectInput::from(payload);
    let view = state
        .repos
        .ledger
        .mutate(|book, now| {
            LedgerService::update_project(book, id, input, now)?;
            ReportService::project_view(book, id)
        })
        .await?;
    info!(project_id = %id, by = %user.user_id(), "project updated");
    Ok(Envelope::with_message(view, "Project updated"))
}

/// DELETE /projects/{id} - Delete a project nothing is booked against.
async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ProjectId>,
) -> ApiResult<Envelope<()>> {
    user.require_delete()?;
    state
        .repos
        .ledger
        .mutate(|book, _| LedgerService::delete_project(book, id))
        .await?;
    info!(project_id = %id, by = %user.user_id(), "project deleted");
    Ok(Envelope::message("Project deleted"))
}

/// POST /projects/{id}/payment - Record a payment on a project.
async fn record_project_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ProjectId>,
    ValidJson(payload): ValidJson<PaymentRequest>,
) -> ApiResult<Envelope<Payment>> {
    super::payments::record(&state, &user, payload.into_new_payment(Target::Project(id))).await
}
