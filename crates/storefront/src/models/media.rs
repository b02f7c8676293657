//! Shared media gallery types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gubre_core::{MediaId, MediaKind};

use super::social::Author;

/// A photo or video shared by a user.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub title: String,
    pub description: Option<String>,
    /// Public URL under `/files/`.
    pub url: String,
    pub media_kind: MediaKind,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    pub like_count: i64,
    pub user_has_liked: bool,
}
