//! Admin comment moderation.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use gubre_core::CommentId;

use crate::db::comments::CommentRepository;
use crate::error::{AppError, OrNotFound, Result};
use crate::models::AdminComment;
use crate::models::comment::normalize_content;
use crate::state::AppState;

const COMMENT_NOT_FOUND: &str = "Rəy tapılmadı";

/// Edited comment text.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Every comment with author and product name, newest first.
///
/// GET /admin/comments
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<AdminComment>>> {
    let comments = CommentRepository::new(state.pool()).list_all().await?;
    Ok(Json(comments))
}

/// PATCH /admin/comments/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<StatusCode> {
    let content = normalize_content(&body.content).map_err(|m| AppError::BadRequest(m.into()))?;

    CommentRepository::new(state.pool())
        .update_content(CommentId::new(id), &content)
        .await
        .or_not_found(COMMENT_NOT_FOUND)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a comment; its replies and likes cascade.
///
/// DELETE /admin/comments/{id}
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    CommentRepository::new(state.pool())
        .delete(CommentId::new(id))
        .await
        .or_not_found(COMMENT_NOT_FOUND)?;
    Ok(StatusCode::NO_CONTENT)
}
