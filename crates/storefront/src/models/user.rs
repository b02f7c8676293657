//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gubre_core::{Email, UserId, UserRole};

/// A login identity (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID, shared with the profile row.
    pub id: UserId,
    /// Normalized email address.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A user joined with their profile, as listed in the admin panel.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
