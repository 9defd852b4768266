//! Client routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use garde::Validate;
use serde::Deserialize;
use timebill_core::ledger::{Client, ClientInput, LedgerService};
use timebill_core::reports::{ClientSummary, ReportService};
use timebill_shared::types::ClientId;
use tracing::info;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the client routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/clients/{id}/summary", get(client_summary))
}

/// Query parameters for listing clients.
#[derive(Debug, Default, Deserialize)]
pub struct ListClientsQuery {
    /// Filter by active flag.
    pub active: Option<bool>,
    /// Case-insensitive match on name, company or email.
    pub search: Option<String>,
}

/// Request body for creating or updating a client.
///
/// On update, omitted fields keep their value and blank strings clear
/// optional ones.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ClientRequest {
    /// Display name.
    #[garde(length(min = 1))]
    pub name: Option<String>,
    /// Contact email.
    #[garde(email)]
    pub email: Option<String>,
    /// Company name.
    #[garde(skip)]
    pub company: Option<String>,
    /// Contact person.
    #[garde(skip)]
    pub contact_person: Option<String>,
    /// Phone number.
    #[garde(skip)]
    pub phone: Option<String>,
    /// Postal address.
    #[garde(skip)]
    pub address: Option<String>,
    /// Tax identifier.
    #[garde(skip)]
    pub tax_id: Option<String>,
    /// Active flag.
    #[garde(skip)]
    pub is_active: Option<bool>,
}

impl From<ClientRequest> for ClientInput {
    fn from(req: ClientRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            company: req.company,
            contact_person: req.contact_person,
            phone: req.phone,
            address: req.address,
            tax_id: req.tax_id,
            is_active: req.is_active,
        }
    }
}

/// GET /clients - List clients ordered by name.
async fn list_clients(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListClientsQuery>,
) -> ApiResult<Envelope<Vec<Client>>> {
    let book = state.repos.ledger.read().await?;
    let needle = query.search.as_deref().map(str::to_lowercase);
    let mut clients: Vec<Client> = book
        .clients
        .into_iter()
        .filter(|c| query.active.is_none_or(|active| c.is_active == active))
        .filter(|c| {
            needle.as_deref().is_none_or(|n| {
                c.name.to_lowercase().contains(n)
                    || c.email.to_lowercase().contains(n)
                    || c.company.as_deref().is_some_and(|co| co.to_lowercase().contains(n))
            })
        })
        .collect();
    clients.sort_by_key(|c| c.name.to_lowercase());
    Ok(Envelope::ok(clients))
}

/// POST /clients - Create a client.
async fn create_client(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<ClientRequest>,
) -> ApiResult<Envelope<Client>> {
    user.require_ledger_write()?;
    let input = ClientInput::from(payload);
    let client = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::create_client(book, input, now))
        .await?;
    info!(client_id = %client.id, by = %user.user_id(), "client created");
    Ok(Envelope::created(client, "Client created"))
}

/// GET /clients/{id} - Get one client.
async fn get_client(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<ClientId>,
) -> ApiResult<Envelope<Client>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(book.client(id)?.clone()))
}

/// PUT /clients/{id} - Update a client.
async fn update_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ClientId>,
    ValidJson(payload): ValidJson<ClientRequest>,
) -> ApiResult<Envelope<Client>> {
    user.require_ledger_write()?;
    let input = ClientInput::from(payload);
    let client = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::update_client(book, id, input, now))
        .await?;
    info!(client_id = %id, by = %user.user_id(), "client updated");
    Ok(Envelope::with_message(client, "Client updated"))
}

/// DELETE /clients/{id} - Delete a client without contracts or linked projects.
async fn delete_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ClientId>,
) -> ApiResult<Envelope<()>> {
    user.require_delete()?;
    state
        .repos
        .ledger
        .mutate(|book, _| LedgerService::delete_client(book, id))
        .await?;
    info!(client_id = %id, by = %user.user_id(), "client deleted");
    Ok(Envelope::message("Client deleted"))
}

/// GET /clients/{id}/summary - Contract, hour and money totals for a client.
async fn client_summary(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<ClientId>,
) -> ApiResult<Envelope<ClientSummary>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(ReportService::client_summary(&book, id)?))
}
