//! Publish/subscribe topics for notification state.
//!
//! Topics are plain values injected where needed. Every subscriber sees
//! every event published after it subscribed; delivery order across
//! subscribers is unspecified.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::model::Notification;

const DEFAULT_CAPACITY: usize = 64;

/// A typed broadcast topic.
#[derive(Debug)]
pub struct Topic<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to current subscribers. Returns how many received it; zero
    /// subscribers is not an error.
    pub fn publish(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Default for Topic<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Payload of the unread-count topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadCount(pub u64);

/// Payload of the live-update topic.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationUpdate {
    Created(Box<Notification>),
    Updated(Box<Notification>),
    Deleted { id: String },
    Read { id: String },
    AllRead,
}

/// The two process-wide notification topics.
#[derive(Debug, Default)]
pub struct NotificationTopics {
    pub unread: Topic<UnreadCount>,
    pub updates: Topic<NotificationUpdate>,
}

impl NotificationTopics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let topics = NotificationTopics::shared();
        let mut first = topics.unread.subscribe();
        let mut second = topics.unread.subscribe();
        assert_eq!(topics.unread.publish(UnreadCount(3)), 2);
        assert_eq!(first.recv().await.unwrap(), UnreadCount(3));
        assert_eq!(second.recv().await.unwrap(), UnreadCount(3));
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let topic: Topic<NotificationUpdate> = Topic::default();
        assert_eq!(topic.publish(NotificationUpdate::AllRead), 0);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let topic: Topic<NotificationUpdate> = Topic::new(4);
        topic.publish(NotificationUpdate::Read { id: "n1".into() });
        let mut late = topic.subscribe();
        topic.publish(NotificationUpdate::Deleted { id: "n2".into() });
        assert_eq!(
            late.recv().await.unwrap(),
            NotificationUpdate::Deleted { id: "n2".into() }
        );
    }
}
