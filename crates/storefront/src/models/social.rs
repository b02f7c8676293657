//! Types shared by comments and the media gallery.

use serde::Serialize;

use gubre_core::UserId;

/// Public view of the profile that wrote a comment or shared a file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}
