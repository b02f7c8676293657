//! Media gallery route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::{instrument, warn};

use gubre_core::MediaId;

use super::upload::read_upload;
use crate::db::media::{MediaRepository, NewMedia};
use crate::db::profiles::ProfileRepository;
use crate::error::{AppError, OrNotFound, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{LikeState, MediaItem};
use crate::services::storage::{UploadRejection, verify_upload};
use crate::state::AppState;

const MEDIA_NOT_FOUND: &str = "Media tapılmadı";
const MAX_TITLE_LENGTH: usize = 200;

/// Gallery, newest first.
///
/// GET /api/media
#[instrument(skip(state, viewer))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Json<Vec<MediaItem>>> {
    let items = MediaRepository::new(state.pool())
        .list(viewer.map(|u| u.id))
        .await?;
    Ok(Json(items))
}

/// Upload an image or video.
///
/// POST /api/media (multipart: `title`, optional `description`, `file`)
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MediaItem>)> {
    let form = read_upload(multipart, state.config().max_upload_bytes).await?;

    let title = form
        .text("title")
        .ok_or_else(|| AppError::BadRequest("Başlıq boş ola bilməz".to_string()))?;
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::BadRequest("Başlıq çox uzundur".to_string()));
    }
    let description = form.text("description");

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Fayl seçilməyib".to_string()))?;
    let verified = verify_upload(&file.content_type, &file.bytes).map_err(|e| match e {
        UploadRejection::UnsupportedType => AppError::BadRequest(
            "Yalnız PNG, JPEG, WebP, MP4 və WebM faylları qəbul edilir".to_string(),
        ),
        UploadRejection::ContentMismatch => {
            AppError::BadRequest("Faylın məzmunu növünə uyğun deyil".to_string())
        }
    })?;

    let media_path = state
        .storage()
        .save_media(verified.extension, &file.bytes)
        .await?;

    let created = MediaRepository::new(state.pool())
        .create(
            user.id,
            &NewMedia {
                title,
                description,
                media_path: &media_path,
                media_kind: verified.kind,
            },
        )
        .await;

    match created {
        Ok(item) => Ok((StatusCode::CREATED, Json(item))),
        Err(e) => {
            state.storage().remove_all([media_path.as_str()]).await;
            Err(e.into())
        }
    }
}

/// Like or unlike a gallery item.
///
/// POST /api/media/{id}/like
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_like(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<LikeState>> {
    let like = MediaRepository::new(state.pool())
        .toggle_like(MediaId::new(id), user.id)
        .await
        .or_not_found(MEDIA_NOT_FOUND)?;
    Ok(Json(like))
}

/// Delete a gallery item; owner or admin only.
///
/// DELETE /api/media/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let id = MediaId::new(id);
    let media = MediaRepository::new(state.pool());

    let ownership = media
        .ownership(id)
        .await?
        .ok_or_else(|| AppError::NotFound(MEDIA_NOT_FOUND.to_string()))?;

    if ownership.user_id != user.id.as_uuid() {
        let role = ProfileRepository::new(state.pool()).get_role(user.id).await?;
        if !role.is_some_and(|r| r.is_admin()) {
            return Err(AppError::Forbidden(
                "Bu medianı silməyə icazəniz yoxdur".to_string(),
            ));
        }
    }

    media.delete(id).await.or_not_found(MEDIA_NOT_FOUND)?;

    if let Err(e) = state.storage().remove(&ownership.media_path).await {
        warn!(media_id = %id, error = %e, "Failed to remove media file");
    }

    Ok(StatusCode::NO_CONTENT)
}
