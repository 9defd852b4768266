//! Category routes.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use timebill_core::ledger::{Category, CategoryInput, LedgerService};
use timebill_shared::types::CategoryId;
use tracing::info;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

/// Query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    /// Only active (or only inactive) categories.
    pub active: Option<bool>,
}

/// Request body for creating or updating a category.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CategoryRequest {
    /// Unique name; required on create.
    #[garde(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// `#RRGGBB`.
    #[garde(skip)]
    pub color: Option<String>,
    /// Free text.
    #[garde(skip)]
    pub description: Option<String>,
    /// Inactive categories cannot be picked for new entries.
    #[garde(skip)]
    pub is_active: Option<bool>,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(req: CategoryRequest) -> Self {
        Self {
            name: req.name,
            color: req.color,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

/// Result of deleting a category.
#[derive(Debug, Serialize)]
pub struct CategoryDeletion {
    /// Time entries moved to General.
    pub reassigned_time_entries: usize,
}

/// GET /categories - List categories, General first.
async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Envelope<Vec<Category>>> {
    let book = state.repos.ledger.read().await?;
    let mut categories: Vec<Category> = book
        .categories
        .into_iter()
        .filter(|c| query.active.is_none_or(|active| c.is_active == active))
        .collect();
    categories.sort_by_key(|c| c.id);
    Ok(Envelope::ok(categories))
}

/// POST /categories - Create a category.
async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<CategoryRequest>,
) -> ApiResult<Envelope<Category>> {
    user.require_category_admin()?;
    let input = CategoryInput::from(payload);
    let category = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::create_category(book, input, now))
        .await?;
    info!(category_id = %category.id, name = %category.name, "category created");
    Ok(Envelope::created(category, "Category created"))
}

/// GET /categories/{id} - Get one category.
async fn get_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<CategoryId>,
) -> ApiResult<Envelope<Category>> {
    let book = state.repos.ledger.read().await?;
    Ok(Envelope::ok(book.category(id)?.clone()))
}

/// PUT /categories/{id} - Update a category.
async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CategoryId>,
    ValidJson(payload): ValidJson<CategoryRequest>,
) -> ApiResult<Envelope<Category>> {
    user.require_category_admin()?;
    let input = CategoryInput::from(payload);
    let category = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::update_category(book, id, input, now))
        .await?;
    info!(category_id = %id, "category updated");
    Ok(Envelope::with_message(category, "Category updated"))
}

/// DELETE /categories/{id} - Delete a category; its entries move to General.
async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CategoryId>,
) -> ApiResult<Envelope<CategoryDeletion>> {
    user.require_category_admin()?;
    let reassigned_time_entries = state
        .repos
        .ledger
        .mutate(|book, now| LedgerService::delete_category(book, id, now))
        .await?;
    info!(category_id = %id, reassigned_time_entries, "category deleted");
    Ok(Envelope::with_message(
        CategoryDeletion {
            reassigned_time_entries,
        },
        "Category deleted",
    ))
}
