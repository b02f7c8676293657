//! Profile repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gubre_core::{UserId, UserRole};

use super::RepositoryError;
use crate::models::profile::{Profile, ProfileUpdate};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    avatar_url: Option<String>,
    feedback: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role: UserRole = row
            .role
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            avatar_url: row.avatar_url,
            feedback: row.feedback,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PROFILE_COLUMNS: &str =
    "id, first_name, last_name, avatar_url, feedback, role, created_at, updated_at";

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM storefront.profile WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Load only the role flag, used by the admin guard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_role(&self, id: UserId) -> Result<Option<UserRole>, RepositoryError> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM storefront.profile WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        role.map(|r| r.parse().map_err(RepositoryError::DataCorruption))
            .transpose()
    }

    /// Update the self-editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r"
            UPDATE storefront.profile
            SET first_name = $2, last_name = $3, feedback = $4, updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.feedback.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Point the profile at a new avatar, returning the previous URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn set_avatar(
        &self,
        id: UserId,
        avatar_url: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r"
            WITH old AS (SELECT avatar_url FROM storefront.profile WHERE id = $1)
            UPDATE storefront.profile
            SET avatar_url = $2, updated_at = now()
            WHERE id = $1
            RETURNING (SELECT avatar_url FROM old)
            ",
        )
        .bind(id)
        .bind(avatar_url)
        .fetch_optional(self.pool)
        .await?;

        previous.ok_or(RepositoryError::NotFound)
    }

    /// Admin edit of names and role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self), fields(user_id = %id, role = %role))]
    pub async fn admin_update(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
        role: UserRole,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r"
            UPDATE storefront.profile
            SET first_name = $2, last_name = $3, role = $4, updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(role.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
