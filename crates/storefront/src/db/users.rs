//! User repository for database operations.
//!
//! A user row and its profile row are always created together and removed
//! together (the profile cascades from the user).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gubre_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::{User, UserAccount};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserAccountRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserAccountRow> for UserAccount {
    type Error = RepositoryError;

    fn try_from(row: UserAccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: UserRole = row
            .role
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
            created_at: row.created_at,
        })
    }
}

/// Files owned by a deleted user that should be removed from storage.
#[derive(Debug, Default)]
pub struct DeletedUser {
    /// Storage-relative paths of the user's media uploads.
    pub media_paths: Vec<String>,
    /// Public avatar URL, if one was set.
    pub avatar_url: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, created_at
            FROM storefront."user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a user and their profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create_with_profile(
        &self,
        email: &Email,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO storefront."user" (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, created_at
            "#,
        )
        .bind(UserId::generate())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        sqlx::query(
            r"
            INSERT INTO storefront.profile (id, first_name, last_name, role)
            VALUES ($1, $2, $3, 'user')
            ",
        )
        .bind(row.id)
        .bind(first_name)
        .bind(last_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r#"
            SELECT id, email, created_at, password_hash
            FROM storefront."user"
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            let user = User::try_from(UserRow {
                id: r.id,
                email: r.email,
                created_at: r.created_at,
            })?;
            Ok((user, r.password_hash))
        })
        .transpose()
    }

    /// List every user with their profile, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_accounts(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserAccountRow>(
            r#"
            SELECT u.id, u.email, p.first_name, p.last_name, p.role, u.created_at
            FROM storefront."user" u
            JOIN storefront.profile p ON p.id = u.id
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count registered users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM storefront."user""#)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a user; profile, basket, comments, likes and media cascade,
    /// orders keep their rows with `user_id` set to NULL.
    ///
    /// Returns the stored files the caller should remove.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<DeletedUser, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let media_paths: Vec<String> =
            sqlx::query_scalar("SELECT media_path FROM storefront.media WHERE user_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let avatar_url: Option<Option<String>> =
            sqlx::query_scalar("SELECT avatar_url FROM storefront.profile WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let result = sqlx::query(r#"DELETE FROM storefront."user" WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(DeletedUser {
            media_paths,
            avatar_url: avatar_url.flatten(),
        })
    }
}
