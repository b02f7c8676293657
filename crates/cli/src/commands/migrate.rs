//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and creates the session store
//! table used by `tower-sessions`.

use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront and session-store migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .map_err(MigrationError::from)?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool)
        .migrate()
        .await
        .map_err(MigrationError::from)?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
