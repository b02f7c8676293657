//! Profile route handlers.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use gubre_core::{MediaKind, UserId};

use super::upload::read_upload;
use crate::db::profiles::ProfileRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, OrNotFound, Result, clear_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user};
use crate::models::{Profile, ProfileUpdate};
use crate::services::storage::{self, UploadRejection, verify_upload};
use crate::state::AppState;

const PROFILE_NOT_FOUND: &str = "Profil tapılmadı";

/// The current user's profile.
///
/// GET /api/profile
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))?;
    Ok(Json(profile))
}

/// Update names and feedback.
///
/// PUT /api/profile
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let update = body
        .normalized()
        .map_err(|m| AppError::BadRequest(m.to_string()))?;

    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await
        .or_not_found(PROFILE_NOT_FOUND)?;
    Ok(Json(profile))
}

/// Replace the avatar with an uploaded image.
///
/// POST /api/profile/avatar (multipart, field `file`)
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Json<Profile>> {
    let form = read_upload(multipart, state.config().max_upload_bytes).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("Fayl seçilməyib".to_string()))?;

    let verified = match verify_upload(&file.content_type, &file.bytes) {
        Ok(v) if v.kind == MediaKind::Image => v,
        Err(UploadRejection::ContentMismatch) => {
            return Err(AppError::BadRequest(
                "Faylın məzmunu növünə uyğun deyil".to_string(),
            ));
        }
        Ok(_) | Err(UploadRejection::UnsupportedType) => {
            return Err(AppError::BadRequest(
                "Yalnız PNG, JPEG və WebP şəkilləri qəbul edilir".to_string(),
            ));
        }
    };

    let relative = state
        .storage()
        .save_avatar(user.id, verified.extension, &file.bytes)
        .await?;
    let url = storage::public_url(&relative);

    let profiles = ProfileRepository::new(state.pool());
    let previous = match profiles.set_avatar(user.id, &url).await {
        Ok(previous) => previous,
        Err(e) => {
            state.storage().remove_all([relative.as_str()]).await;
            return Err(e).or_not_found(PROFILE_NOT_FOUND);
        }
    };

    if let Some(previous) = previous.filter(|p| *p != url)
        && let Err(e) = state.storage().remove_by_url(&previous).await
    {
        warn!(error = %e, "Failed to remove previous avatar");
    }

    let profile = profiles
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))?;
    Ok(Json(profile))
}

/// Delete the account and end the session.
///
/// DELETE /api/profile
#[instrument(skip(state, user, session), fields(user_id = %user.id))]
pub async fn delete_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<StatusCode> {
    remove_account(&state, user.id).await?;

    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session flush failed: {e}")))?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a login identity with everything that cascades from it, then
/// clean up its stored files.
///
/// Orders survive with `user_id` cleared.
pub(crate) async fn remove_account(state: &AppState, user_id: UserId) -> Result<()> {
    let deleted = UserRepository::new(state.pool())
        .delete(user_id)
        .await
        .or_not_found("İstifadəçi tapılmadı")?;

    state
        .storage()
        .remove_all(deleted.media_paths.iter().map(String::as_str))
        .await;
    if let Some(avatar) = &deleted.avatar_url
        && let Err(e) = state.storage().remove_by_url(avatar).await
    {
        warn!(error = %e, "Failed to remove avatar of deleted user");
    }

    // Open tabs of the deleted user drop their basket.
    state.hub().publish(user_id);
    info!(%user_id, media = deleted.media_paths.len(), "Account deleted");
    Ok(())
}
