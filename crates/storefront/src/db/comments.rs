//! Comment and comment-like repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gubre_core::{CommentId, ProductId, UserId};

use super::{RepositoryError, not_found_on_fk};
use crate::models::comment::{AdminComment, Comment, ReplyParent};
use crate::models::social::{Author, LikeState};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i32,
    product_id: i32,
    parent_id: Option<i32>,
    content: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    first_name: String,
    last_name: String,
    avatar_url: Option<String>,
    like_count: i64,
    viewer_liked: bool,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            product_id: ProductId::new(row.product_id),
            parent_id: row.parent_id.map(CommentId::new),
            content: row.content,
            created_at: row.created_at,
            author: Author {
                id: UserId::new(row.author_id),
                first_name: row.first_name,
                last_name: row.last_name,
                avatar_url: row.avatar_url,
            },
            like_count: row.like_count,
            viewer_liked: row.viewer_liked,
            replies: Vec::new(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminCommentRow {
    id: i32,
    product_id: i32,
    product_name: String,
    parent_id: Option<i32>,
    content: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    first_name: String,
    last_name: String,
    avatar_url: Option<String>,
}

impl From<AdminCommentRow> for AdminComment {
    fn from(row: AdminCommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            parent_id: row.parent_id.map(CommentId::new),
            content: row.content,
            created_at: row.created_at,
            author: Author {
                id: UserId::new(row.author_id),
                first_name: row.first_name,
                last_name: row.last_name,
                avatar_url: row.avatar_url,
            },
        }
    }
}

/// Shared projection; `$1` is the viewer id (nullable).
const COMMENT_SELECT: &str = r"
    SELECT c.id, c.product_id, c.parent_id, c.content, c.created_at,
           p.id AS author_id, p.first_name, p.last_name, p.avatar_url,
           (SELECT COUNT(*) FROM storefront.comment_like l WHERE l.comment_id = c.id) AS like_count,
           EXISTS (
               SELECT 1 FROM storefront.comment_like l
               WHERE l.comment_id = c.id AND l.user_id = $1
           ) AS viewer_liked
    FROM storefront.comment c
    JOIN storefront.profile p ON p.id = c.user_id
";

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every comment on a product (top-level and replies), unthreaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        viewer: Option<UserId>,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.product_id = $2 ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(viewer)
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one comment as seen by `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: CommentId,
        viewer: Option<UserId>,
    ) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = $2"))
            .bind(viewer)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Product and parent of a comment, used to validate reply parents.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reply_parent(&self, id: CommentId) -> Result<Option<ReplyParent>, RepositoryError> {
        let row: Option<(i32, Option<i32>)> =
            sqlx::query_as("SELECT product_id, parent_id FROM storefront.comment WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(|(product_id, parent_id)| ReplyParent {
            product_id: ProductId::new(product_id),
            parent_id: parent_id.map(CommentId::new),
        }))
    }

    /// Insert a comment and return it with author details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self, content), fields(product_id = %product_id, user_id = %user_id))]
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        parent_id: Option<CommentId>,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.comment (product_id, user_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| not_found_on_fk(e, "comment_product_id_fkey"))?;

        self.get(CommentId::new(id), Some(user_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Like the comment if the user has not, unlike it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    #[instrument(skip(self), fields(comment_id = %id, user_id = %user_id))]
    pub async fn toggle_like(
        &self,
        id: CommentId,
        user_id: UserId,
    ) -> Result<LikeState, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM storefront.comment_like WHERE comment_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let liked = if removed == 0 {
            sqlx::query(
                r"
                INSERT INTO storefront.comment_like (comment_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (comment_id, user_id) DO NOTHING
                ",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| not_found_on_fk(e, "comment_like_comment_id_fkey"))?;
            true
        } else {
            false
        };

        let like_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.comment_like WHERE comment_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(LikeState { liked, like_count })
    }

    /// All comments with author and product name, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<AdminComment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminCommentRow>(
            r"
            SELECT c.id, c.product_id, pr.name AS product_name, c.parent_id, c.content,
                   c.created_at, p.id AS author_id, p.first_name, p.last_name, p.avatar_url
            FROM storefront.comment c
            JOIN storefront.profile p ON p.id = c.user_id
            JOIN storefront.product pr ON pr.id = c.product_id
            ORDER BY c.created_at DESC, c.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Replace a comment's text.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    #[instrument(skip(self, content), fields(comment_id = %id))]
    pub async fn update_content(&self, id: CommentId, content: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE storefront.comment SET content = $2 WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a comment; its replies and likes cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    #[instrument(skip(self), fields(comment_id = %id))]
    pub async fn delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.comment WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count all comments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.comment")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
