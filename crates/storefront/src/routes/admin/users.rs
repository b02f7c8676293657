//! Admin user management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use gubre_core::{UserId, UserRole};

use crate::db::profiles::ProfileRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, OrNotFound, Result};
use crate::middleware::RequireAuth;
use crate::models::profile::normalize_name;
use crate::models::{Profile, UserAccount};
use crate::routes::profile::remove_account;
use crate::state::AppState;

/// Admin edit of a user.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

/// All accounts, newest first.
///
/// GET /admin/users
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<UserAccount>>> {
    let users = UserRepository::new(state.pool()).list_accounts().await?;
    Ok(Json(users))
}

/// Change a user's names and role. Admins cannot demote themselves.
///
/// PATCH /admin/users/{id}
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<Profile>> {
    let id = UserId::new(id);
    if id == admin.id && !body.role.is_admin() {
        return Err(AppError::BadRequest(
            "Öz admin rolunuzu götürə bilməzsiniz".to_string(),
        ));
    }

    let first_name = normalize_name(&body.first_name).map_err(|m| AppError::BadRequest(m.into()))?;
    let last_name = normalize_name(&body.last_name).map_err(|m| AppError::BadRequest(m.into()))?;

    let profile = ProfileRepository::new(state.pool())
        .admin_update(id, &first_name, &last_name, body.role)
        .await
        .or_not_found("İstifadəçi tapılmadı")?;

    info!(user_id = %id, role = %body.role, "User updated by admin");
    Ok(Json(profile))
}

/// Delete a user. Admins cannot delete themselves.
///
/// DELETE /admin/users/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let id = UserId::new(id);
    if id == admin.id {
        return Err(AppError::BadRequest(
            "Öz hesabınızı buradan silə bilməzsiniz".to_string(),
        ));
    }

    remove_account(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
