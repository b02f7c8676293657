//! Admin role management.
//!
//! Admins are regular users whose profile carries the `admin` role, so the
//! user has to register through the API first.

use gubre_core::{Email, UserRole};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account for the email.
    #[error("No user registered with email: {0}")]
    UserNotFound(String),
}

/// Set the role of the user registered with `email`.
///
/// # Errors
///
/// Returns an error if the email is malformed, no such user exists, or the
/// database is unreachable.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = super::connect().await?;

    let updated = sqlx::query(
        r#"
        UPDATE storefront.profile p
        SET role = $2, updated_at = now()
        FROM storefront."user" u
        WHERE u.id = p.id AND u.email = $1
        "#,
    )
    .bind(email.as_str())
    .bind(role.as_str())
    .execute(&pool)
    .await
    .map_err(AdminError::from)?
    .rows_affected();

    if updated == 0 {
        return Err(AdminError::UserNotFound(email.to_string()).into());
    }

    tracing::info!("Role updated! Email: {}, Role: {}", email, role);
    Ok(())
}
