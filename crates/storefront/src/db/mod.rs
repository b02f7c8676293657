//! Database operations for storefront `PostgreSQL`.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `user` - Login identities (email + Argon2 hash)
//! - `profile` - Names, avatar, feedback and role, keyed by the user id
//! - `product` - Fertilizer catalog
//! - `basket` - One row per (user, product) with a quantity
//! - `comment`, `comment_like` - Product discussion
//! - `media`, `media_like` - Shared photo/video gallery
//! - `order`, `order_item` - Placed orders with line snapshots
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p gubre-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as::<_, Row>` so the crate
//! compiles without a live database.

pub mod basket;
pub mod comments;
pub mod media;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a foreign key violation on `constraint` to `NotFound`.
///
/// Inserts that reference a missing parent row (product, comment, media)
/// surface as `NotFound` rather than a generic database error.
pub(crate) fn not_found_on_fk(e: sqlx::Error, constraint: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
        && db_err.constraint() == Some(constraint)
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}
