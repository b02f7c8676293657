//! Basket change fan-out.
//!
//! ```text
//! cart / checkout / admin product delete / account delete
//!       │ publish(user_id)
//!       ▼
//! BasketHub ── broadcast::Sender<BasketChange>
//!       │
//!       ▼
//! GET /api/cart/events (one subscriber per open tab, filtered by user)
//! ```
//!
//! Events carry only the user id; subscribers refetch the basket.

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use gubre_core::UserId;

/// Channel capacity; a subscriber further behind than this gets a resync.
const BROADCAST_CAPACITY: usize = 256;

/// A user's basket was modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasketChange {
    pub user_id: UserId,
}

/// What a subscriber sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasketEvent {
    /// The subscriber's basket changed.
    Changed,
    /// Events were dropped; the client should refetch.
    Resync,
}

impl BasketEvent {
    /// SSE event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Changed => "basket_changed",
            Self::Resync => "resync",
        }
    }
}

/// Process-wide basket change hub.
#[derive(Debug, Clone)]
pub struct BasketHub {
    tx: broadcast::Sender<BasketChange>,
}

impl Default for BasketHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BasketHub {
    /// Create a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Notify every subscriber of `user_id` that their basket changed.
    pub fn publish(&self, user_id: UserId) {
        // send only fails when nobody is subscribed
        let _ = self.tx.send(BasketChange { user_id });
    }

    /// Notify several users at once.
    pub fn publish_all(&self, users: impl IntoIterator<Item = UserId>) {
        for user_id in users {
            self.publish(user_id);
        }
    }

    /// Number of open subscriptions across all users.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stream of basket events for one user.
    ///
    /// Ends when the hub is dropped.
    pub fn subscribe_user(&self, user_id: UserId) -> impl Stream<Item = BasketEvent> + use<> {
        let mut rx = self.tx.subscribe();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(change) if change.user_id == user_id => yield BasketEvent::Changed,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(%user_id, skipped, "Basket subscriber lagged");
                        yield BasketEvent::Resync;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::pin::pin;

    use futures::StreamExt;
    use uuid::Uuid;

    use super::*;

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_own_changes() {
        let hub = BasketHub::new();
        let alice = user();
        let bob = user();

        let mut events = pin!(hub.subscribe_user(alice));
        hub.publish(bob);
        hub.publish(alice);

        assert_eq!(events.next().await, Some(BasketEvent::Changed));
    }

    #[tokio::test]
    async fn test_every_session_of_a_user_is_notified() {
        let hub = BasketHub::new();
        let alice = user();

        let mut tab_one = pin!(hub.subscribe_user(alice));
        let mut tab_two = pin!(hub.subscribe_user(alice));
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(alice);

        assert_eq!(tab_one.next().await, Some(BasketEvent::Changed));
        assert_eq!(tab_two.next().await, Some(BasketEvent::Changed));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_resync() {
        let hub = BasketHub::new();
        let alice = user();

        let mut events = pin!(hub.subscribe_user(alice));
        for _ in 0..=BROADCAST_CAPACITY {
            hub.publish(alice);
        }

        assert_eq!(events.next().await, Some(BasketEvent::Resync));
        assert_eq!(events.next().await, Some(BasketEvent::Changed));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let hub = BasketHub::new();
        hub.publish_all([user(), user()]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(BasketEvent::Changed.name(), "basket_changed");
        assert_eq!(BasketEvent::Resync.name(), "resync");
    }
}
