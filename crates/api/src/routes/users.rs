//! User management routes (administrators only).

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use garde::Validate;
use serde::Deserialize;
use timebill_core::auth::{NewUser, Role, UserDirectory, UserPatch, UserProfile};
use timebill_shared::types::UserId;
use tracing::info;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::CurrentUser,
};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Login name.
    #[garde(length(min = 3))]
    pub username: String,
    /// Email address.
    #[garde(email)]
    pub email: String,
    /// Initial password.
    #[garde(length(min = 8))]
    pub password: String,
    /// Display name.
    #[garde(skip)]
    pub full_name: Option<String>,
    /// Access level; collaborator when omitted.
    #[garde(skip)]
    pub role: Option<Role>,
}

/// Request body for updating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New email.
    #[garde(email)]
    pub email: Option<String>,
    /// New display name; blank clears.
    #[garde(skip)]
    pub full_name: Option<String>,
    /// New role.
    #[garde(skip)]
    pub role: Option<Role>,
    /// Activate or deactivate.
    #[garde(skip)]
    pub is_active: Option<bool>,
    /// New password.
    #[garde(length(min = 8))]
    pub password: Option<String>,
}

/// GET /users - List all users.
async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Envelope<Vec<UserProfile>>> {
    user.require_user_admin()?;
    let users = state.repos.users.list().await?;
    Ok(Envelope::ok(users.iter().map(UserProfile::from).collect()))
}

/// POST /users - Create a user.
async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> ApiResult<Envelope<UserProfile>> {
    user.require_user_admin()?;
    let input = NewUser {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        full_name: payload.full_name,
        role: payload.role,
    };
    let created = state
        .repos
        .users
        .mutate(|users, now| UserDirectory::create(users, input, now))
        .await?;
    info!(user_id = %created.id, role = %created.role, by = %user.user_id(), "user created");
    Ok(Envelope::created(UserProfile::from(&created), "User created"))
}

/// GET /users/{id} - Get one user.
async fn get_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
) -> ApiResult<Envelope<UserProfile>> {
    user.require_user_admin()?;
    let found = state.repos.users.find(id).await?;
    Ok(Envelope::ok(UserProfile::from(&found)))
}

/// PUT /users/{id} - Update a user.
///
/// Changing the role, the password or deactivating ends the user's sessions.
async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> ApiResult<Envelope<UserProfile>> {
    user.require_user_admin()?;
    let previous = state.repos.users.find(id).await?;
    let patch = UserPatch {
        email: payload.email,
        full_name: payload.full_name,
        role: payload.role,
        is_active: payload.is_active,
        password: payload.password,
    };
    let password_changed = patch.password.is_some();
    let updated = state
        .repos
        .users
        .mutate(|users, now| UserDirectory::update(users, id, patch, now))
        .await?;

    if updated.role != previous.role || !updated.is_active || password_changed {
        let revoked = state.sessions.revoke_user(id);
        info!(user_id = %id, revoked, "user sessions revoked");
    }
    info!(user_id = %id, by = %user.user_id(), "user updated");
    Ok(Envelope::with_message(UserProfile::from(&updated), "User updated"))
}

/// DELETE /users/{id} - Delete a user.
async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
) -> ApiResult<Envelope<()>> {
    user.require_user_admin()?;
    let acting = user.user_id();
    state
        .repos
        .users
        .mutate(|users, _| UserDirectory::delete(users, id, acting))
        .await?;
    state.sessions.revoke_user(id);
    info!(user_id = %id, by = %acting, "user deleted");
    Ok(Envelope::message("User deleted"))
}
