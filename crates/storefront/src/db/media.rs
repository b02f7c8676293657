//! Media gallery repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gubre_core::{MediaId, MediaKind, UserId};

use super::{RepositoryError, not_found_on_fk};
use crate::models::media::MediaItem;
use crate::models::social::{Author, LikeState};
use crate::services::storage;

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: i32,
    title: String,
    description: Option<String>,
    media_path: String,
    media_kind: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    first_name: String,
    last_name: String,
    avatar_url: Option<String>,
    like_count: i64,
    user_has_liked: bool,
}

impl TryFrom<MediaRow> for MediaItem {
    type Error = RepositoryError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let media_kind: MediaKind = row
            .media_kind
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: MediaId::new(row.id),
            title: row.title,
            description: row.description,
            url: storage::public_url(&row.media_path),
            media_kind,
            created_at: row.created_at,
            author: Author {
                id: UserId::new(row.author_id),
                first_name: row.first_name,
                last_name: row.last_name,
                avatar_url: row.avatar_url,
            },
            like_count: row.like_count,
            user_has_liked: row.user_has_liked,
        })
    }
}

/// Data for a new gallery entry; the file is already stored.
#[derive(Debug, Clone)]
pub struct NewMedia<'m> {
    pub title: &'m str,
    pub description: Option<&'m str>,
    pub media_path: &'m str,
    pub media_kind: MediaKind,
}

/// Owner and stored path of a media row, used for delete checks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaOwnership {
    pub user_id: Uuid,
    pub media_path: String,
}

const MEDIA_SELECT: &str = r"
    SELECT m.id, m.title, m.description, m.media_path, m.media_kind, m.created_at,
           p.id AS author_id, p.first_name, p.last_name, p.avatar_url,
           (SELECT COUNT(*) FROM storefront.media_like l WHERE l.media_id = m.id) AS like_count,
           EXISTS (
               SELECT 1 FROM storefront.media_like l
               WHERE l.media_id = m.id AND l.user_id = $1
           ) AS user_has_liked
    FROM storefront.media m
    JOIN storefront.profile p ON p.id = m.user_id
";

/// Repository for media database operations.
pub struct MediaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MediaRepository<'a> {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All gallery entries, newest first, as seen by `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, viewer: Option<UserId>) -> Result<Vec<MediaItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            "{MEDIA_SELECT} ORDER BY m.created_at DESC, m.id DESC"
        ))
        .bind(viewer)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Record an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, media), fields(user_id = %user_id, kind = %media.media_kind))]
    pub async fn create(
        &self,
        user_id: UserId,
        media: &NewMedia<'_>,
    ) -> Result<MediaItem, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.media (user_id, title, description, media_path, media_kind)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(media.title)
        .bind(media.description)
        .bind(media.media_path)
        .bind(media.media_kind.as_str())
        .fetch_one(self.pool)
        .await?;

        let row = sqlx::query_as::<_, MediaRow>(&format!("{MEDIA_SELECT} WHERE m.id = $2"))
            .bind(Some(user_id))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Owner and path of a media row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ownership(&self, id: MediaId) -> Result<Option<MediaOwnership>, RepositoryError> {
        let row = sqlx::query_as::<_, MediaOwnership>(
            "SELECT user_id, media_path FROM storefront.media WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a media row; its likes cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    #[instrument(skip(self), fields(media_id = %id))]
    pub async fn delete(&self, id: MediaId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.media WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Like the media if the user has not, unlike it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the media does not exist.
    #[instrument(skip(self), fields(media_id = %id, user_id = %user_id))]
    pub async fn toggle_like(
        &self,
        id: MediaId,
        user_id: UserId,
    ) -> Result<LikeState, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed =
            sqlx::query("DELETE FROM storefront.media_like WHERE media_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let liked = if removed == 0 {
            sqlx::query(
                r"
                INSERT INTO storefront.media_like (media_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (media_id, user_id) DO NOTHING
                ",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| not_found_on_fk(e, "media_like_media_id_fkey"))?;
            true
        } else {
            false
        };

        let like_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.media_like WHERE media_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(LikeState { liked, like_count })
    }
}
