//! Authentication routes for login, logout, and the current user.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use timebill_core::auth::{AuthError, Session, UserDirectory, UserProfile, new_session_token};
use timebill_db::RepositoryError;
use timebill_shared::{LoginRequest, SessionToken};
use tracing::{info, warn};

use crate::{
    AppState,
    error::ApiResult,
    extractors::{Envelope, ValidJson},
    middleware::{CurrentUser, auth::SESSION_COOKIE},
};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The signed-in user.
    pub user: UserProfile,
    /// Session token and expiry.
    #[serde(flatten)]
    pub session: SessionToken,
}

/// POST /auth/login - Authenticate by username or email and open a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<(CookieJar, Envelope<LoginResponse>)> {
    let login = payload.login.clone();
    let result = state
        .repos
        .users
        .mutate(move |users, now| {
            UserDirectory::authenticate(users, &payload.login, &payload.password, now)
        })
        .await;

    let user = match result {
        Ok(user) => user,
        Err(RepositoryError::Auth(e @ (AuthError::InvalidCredentials | AuthError::Inactive))) => {
            warn!(login = %login, reason = %e, "login rejected");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let session = Session::open(&user, state.clock.now(), state.session_ttl);
    let token = new_session_token();
    let expires_at = session.expires_at;
    state.sessions.put(&token, session);
    info!(user_id = %user.id, role = %user.role, "user logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    let body = LoginResponse {
        user: UserProfile::from(&user),
        session: SessionToken { token, expires_at },
    };
    Ok((jar.add(cookie), Envelope::with_message(body, "Login successful")))
}

/// POST /auth/logout - Close the presented session.
async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Envelope<()>) {
    state.sessions.remove(&user.token);
    info!(user_id = %user.user_id(), "user logged out");
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Envelope::message("Logged out"))
}

/// GET /auth/me - The signed-in user's profile.
async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Envelope<UserProfile>> {
    let stored = state.repos.users.find(user.user_id()).await?;
    Ok(Envelope::ok(UserProfile::from(&stored)))
}
