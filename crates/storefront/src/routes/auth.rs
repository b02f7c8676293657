//! Authentication route handlers.
//!
//! Email/password registration and login. The session stores only the
//! [`CurrentUser`]; the role is read from `profile` whenever it matters.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use gubre_core::{Email, UserId, UserRole};

use crate::db::profiles::ProfileRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The logged-in user as returned by `/api/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: UserId,
    pub email: Email,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Create an account and log it in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .register(
            &body.email,
            &body.password,
            body.first_name.as_deref(),
            body.last_name.as_deref(),
        )
        .await?;

    info!(user_id = %user.id, "User registered");
    let me = start_session(&state, &session, &user).await?;
    Ok((StatusCode::CREATED, Json(me)).into_response())
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<MeResponse>> {
    let user = match AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Login failed");
            return Err(e.into());
        }
    };

    let me = start_session(&state, &session, &user).await?;
    Ok(Json(me))
}

/// End the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session flush failed: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The current user with role and names.
///
/// GET /api/auth/me
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MeResponse>> {
    load_me(&state, &user).await.map(Json)
}

async fn start_session(state: &AppState, session: &Session, user: &User) -> Result<MeResponse> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    load_me(state, &current).await
}

async fn load_me(state: &AppState, user: &CurrentUser) -> Result<MeResponse> {
    let profile = ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .ok_or_else(AppError::login_required)?;

    Ok(MeResponse {
        id: user.id,
        email: user.email.clone(),
        role: profile.role,
        first_name: profile.first_name,
        last_name: profile.last_name,
        avatar_url: profile.avatar_url,
    })
}
