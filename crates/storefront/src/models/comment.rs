//! Product comment types and thread assembly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use gubre_core::{CommentId, ProductId};

use super::social::Author;

/// Maximum comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// A comment with its author, like summary and (for top-level comments)
/// its replies.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub product_id: ProductId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    pub like_count: i64,
    pub viewer_liked: bool,
    pub replies: Vec<Comment>,
}

/// A comment as listed in the admin moderation view.
#[derive(Debug, Clone, Serialize)]
pub struct AdminComment {
    pub id: CommentId,
    pub product_id: ProductId,
    pub product_name: String,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
}

/// Trim comment text and reject blank or oversized content.
///
/// # Errors
///
/// Returns a user-facing message for blank or oversized content.
pub fn normalize_content(content: &str) -> Result<String, &'static str> {
    let content = content.trim();
    if content.is_empty() {
        return Err("Rəy boş ola bilməz");
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err("Rəy çox uzundur");
    }
    Ok(content.to_owned())
}

/// Where an existing comment sits, as needed to validate a reply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyParent {
    pub product_id: ProductId,
    pub parent_id: Option<CommentId>,
}

/// Check that a reply on `product_id` may hang off `parent`.
///
/// Threads are one level deep, so the parent must itself be top-level.
///
/// # Errors
///
/// Returns a user-facing message when the parent is on another product or is
/// already a reply.
pub fn check_reply_parent(product_id: ProductId, parent: ReplyParent) -> Result<(), &'static str> {
    if parent.product_id != product_id {
        return Err("Cavab başqa məhsulun rəyinə yazıla bilməz");
    }
    if parent.parent_id.is_some() {
        return Err("Yalnız əsas rəyə cavab yazmaq olar");
    }
    Ok(())
}

/// Group a flat list of comments into threads.
///
/// Top-level comments come back newest first; replies under each are oldest
/// first. Replies whose parent is not in the list are dropped.
#[must_use]
pub fn build_threads(comments: Vec<Comment>) -> Vec<Comment> {
    let (mut roots, replies): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());

    let mut by_parent: HashMap<CommentId, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.parent_id {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    roots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    for root in &mut roots {
        if let Some(mut children) = by_parent.remove(&root.id) {
            children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            root.replies = children;
        }
    }
    roots
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use gubre_core::UserId;

    use super::*;

    fn comment(id: i32, parent: Option<i32>, minute: u32) -> Comment {
        Comment {
            id: CommentId::new(id),
            product_id: ProductId::new(1),
            parent_id: parent.map(CommentId::new),
            content: format!("rəy {id}"),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
            author: Author {
                id: UserId::generate(),
                first_name: "Nigar".to_string(),
                last_name: "Quliyeva".to_string(),
                avatar_url: None,
            },
            like_count: 0,
            viewer_liked: false,
            replies: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  Əla məhsul!  ").unwrap(), "Əla məhsul!");
        assert_eq!(normalize_content(" \n\t "), Err("Rəy boş ola bilməz"));
        assert!(normalize_content(&"x".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_build_threads_orders_roots_and_replies() {
        let flat = vec![
            comment(1, None, 0),
            comment(2, None, 10),
            comment(3, Some(1), 20),
            comment(4, Some(1), 5),
            comment(5, Some(2), 30),
        ];

        let threads = build_threads(flat);
        let roots: Vec<i32> = threads.iter().map(|c| c.id.as_i32()).collect();
        assert_eq!(roots, vec![2, 1]);

        let first_replies: Vec<i32> = threads[1].replies.iter().map(|c| c.id.as_i32()).collect();
        assert_eq!(first_replies, vec![4, 3]);
        assert_eq!(threads[0].replies.len(), 1);
    }

    #[test]
    fn test_check_reply_parent() {
        let product = ProductId::new(1);
        let root = ReplyParent {
            product_id: product,
            parent_id: None,
        };
        assert_eq!(check_reply_parent(product, root), Ok(()));

        let other_product = ReplyParent {
            product_id: ProductId::new(2),
            parent_id: None,
        };
        assert_eq!(
            check_reply_parent(product, other_product),
            Err("Cavab başqa məhsulun rəyinə yazıla bilməz")
        );

        // A reply to a reply would never be shown by build_threads.
        let reply = ReplyParent {
            product_id: product,
            parent_id: Some(CommentId::new(1)),
        };
        assert_eq!(
            check_reply_parent(product, reply),
            Err("Yalnız əsas rəyə cavab yazmaq olar")
        );
    }

    #[test]
    fn test_build_threads_drops_orphans() {
        let threads = build_threads(vec![comment(1, None, 0), comment(2, Some(99), 1)]);
        assert_eq!(threads.len(), 1);
        assert!(threads[0].replies.is_empty());
    }
}
