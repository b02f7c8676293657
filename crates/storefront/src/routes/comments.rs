//! Product comment route handlers.
//!
//! Comments are threaded one level deep: a reply's parent must be a
//! top-level comment on the same product.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use gubre_core::{CommentId, ProductId};

use super::products::{PRODUCT_NOT_FOUND, find};
use crate::db::comments::CommentRepository;
use crate::error::{AppError, OrNotFound, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::comment::{Comment, build_threads, check_reply_parent, normalize_content};
use crate::models::social::LikeState;
use crate::state::AppState;

const COMMENT_NOT_FOUND: &str = "Rəy tapılmadı";

/// New comment payload.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<i32>,
}

/// Threaded comments of a product.
///
/// GET /api/products/{id}/comments
#[instrument(skip(state, viewer))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<Comment>>> {
    let product_id = ProductId::new(product_id);
    find(&state, product_id).await?;

    let comments = CommentRepository::new(state.pool())
        .list_for_product(product_id, viewer.map(|u| u.id))
        .await?;

    Ok(Json(build_threads(comments)))
}

/// Post a comment or a reply.
///
/// POST /api/products/{id}/comments
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let product_id = ProductId::new(product_id);
    let content = normalize_content(&body.content).map_err(|m| AppError::BadRequest(m.into()))?;
    let comments = CommentRepository::new(state.pool());

    let parent_id = body.parent_id.map(CommentId::new);
    if let Some(parent_id) = parent_id {
        let parent = comments
            .reply_parent(parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(COMMENT_NOT_FOUND.to_string()))?;
        check_reply_parent(product_id, parent).map_err(|m| AppError::BadRequest(m.into()))?;
    }

    let comment = comments
        .create(product_id, user.id, parent_id, &content)
        .await
        .or_not_found(PRODUCT_NOT_FOUND)?;

    add_breadcrumb(
        "comments",
        "Comment posted",
        Some(&[("product_id", &product_id.to_string())]),
    );

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Like or unlike a comment.
///
/// POST /api/comments/{id}/like
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_like(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<LikeState>> {
    let like = CommentRepository::new(state.pool())
        .toggle_like(CommentId::new(id), user.id)
        .await
        .or_not_found(COMMENT_NOT_FOUND)?;
    Ok(Json(like))
}
