//! Notification mutations that announce themselves on the shared topics.

use std::sync::Arc;

use crate::error::ApiResult;
use crate::events::{NotificationTopics, NotificationUpdate, UnreadCount};
use crate::model::Notification;
use crate::requests::{AttachmentUpload, NotificationDraft};
use crate::traits::NotificationApi;

/// Wraps a [`NotificationApi`] so that every successful change is published
/// on [`NotificationTopics::updates`].
///
/// Read-state changes also republish the unread count. A failed call
/// publishes nothing.
#[derive(Clone)]
pub struct LiveNotifications {
    api: Arc<dyn NotificationApi>,
    topics: Arc<NotificationTopics>,
}

impl LiveNotifications {
    pub fn new(api: Arc<dyn NotificationApi>, topics: Arc<NotificationTopics>) -> Self {
        Self { api, topics }
    }

    pub fn topics(&self) -> &Arc<NotificationTopics> {
        &self.topics
    }

    pub async fn create(
        &self,
        draft: &NotificationDraft,
        attachments: &[AttachmentUpload],
    ) -> ApiResult<Notification> {
        let created = self.api.create_notification(draft, attachments).await?;
        self.topics
            .updates
            .publish(NotificationUpdate::Created(Box::new(created.clone())));
        Ok(created)
    }

    pub async fn update(
        &self,
        notification_id: &str,
        draft: &NotificationDraft,
    ) -> ApiResult<Notification> {
        let updated = self.api.update_notification(notification_id, draft).await?;
        self.topics
            .updates
            .publish(NotificationUpdate::Updated(Box::new(updated.clone())));
        Ok(updated)
    }

    pub async fn delete(&self, notification_id: &str) -> ApiResult<()> {
        self.api.delete_notification(notification_id).await?;
        self.topics.updates.publish(NotificationUpdate::Deleted {
            id: notification_id.to_string(),
        });
        self.refresh_unread().await;
        Ok(())
    }

    pub async fn mark_read(&self, notification_id: &str) -> ApiResult<()> {
        self.api.mark_read(notification_id).await?;
        self.topics.updates.publish(NotificationUpdate::Read {
            id: notification_id.to_string(),
        });
        self.refresh_unread().await;
        Ok(())
    }

    pub async fn mark_many_read(&self, notification_ids: &[String]) -> ApiResult<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }
        self.api.mark_many_read(notification_ids).await?;
        for id in notification_ids {
            self.topics
                .updates
                .publish(NotificationUpdate::Read { id: id.clone() });
        }
        self.refresh_unread().await;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> ApiResult<()> {
        self.api.mark_all_read().await?;
        self.topics.updates.publish(NotificationUpdate::AllRead);
        self.topics.unread.publish(UnreadCount(0));
        Ok(())
    }

    /// Fetch and publish the current unread count. A failure is logged and
    /// leaves the last published count in place.
    pub async fn refresh_unread(&self) -> Option<u64> {
        match self.api.unread_count().await {
            Ok(count) => {
                self.topics.unread.publish(UnreadCount(count));
                Some(count)
            }
            Err(e) => {
                tracing::warn!("unread count refresh failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::model::Page;
    use crate::requests::NotificationQuery;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Counts unread notifications; ids in `failing` reject every call.
    #[derive(Default)]
    struct Inbox {
        unread: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl Inbox {
        fn with_unread(ids: &[&str]) -> Self {
            Self {
                unread: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
                failing: Vec::new(),
            }
        }

        fn check(&self, id: &str) -> ApiResult<()> {
            if self.failing.iter().any(|f| f == id) {
                return Err(ApiError::NotFound(id.to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationApi for Inbox {
        async fn create_notification(
            &self,
            _draft: &NotificationDraft,
            _attachments: &[AttachmentUpload],
        ) -> ApiResult<Notification> {
            Err(ApiError::Forbidden("students cannot publish".into()))
        }

        async fn list_notifications(
            &self,
            _query: &NotificationQuery,
        ) -> ApiResult<Page<Notification>> {
            Ok(Page::single(Vec::new()))
        }

        async fn get_notification(&self, id: &str) -> ApiResult<Notification> {
            Err(ApiError::NotFound(id.to_string()))
        }

        async fn update_notification(
            &self,
            id: &str,
            _draft: &NotificationDraft,
        ) -> ApiResult<Notification> {
            Err(ApiError::NotFound(id.to_string()))
        }

        async fn delete_notification(&self, id: &str) -> ApiResult<()> {
            self.check(id)?;
            self.unread.lock().unwrap().retain(|u| u != id);
            Ok(())
        }

        async fn mark_read(&self, id: &str) -> ApiResult<()> {
            self.check(id)?;
            self.unread.lock().unwrap().retain(|u| u != id);
            Ok(())
        }

        async fn mark_many_read(&self, ids: &[String]) -> ApiResult<()> {
            for id in ids {
                self.mark_read(id).await?;
            }
            Ok(())
        }

        async fn mark_all_read(&self) -> ApiResult<()> {
            self.unread.lock().unwrap().clear();
            Ok(())
        }

        async fn download_attachment(&self, id: &str, _attachment: &str) -> ApiResult<Vec<u8>> {
            Err(ApiError::NotFound(id.to_string()))
        }

        async fn search_notifications(
            &self,
            _text: &str,
            _query: &NotificationQuery,
        ) -> ApiResult<Page<Notification>> {
            Ok(Page::single(Vec::new()))
        }

        async fn unread_count(&self) -> ApiResult<u64> {
            Ok(self.unread.lock().unwrap().len() as u64)
        }
    }

    #[tokio::test]
    async fn mark_read_publishes_update_and_new_count() {
        let live = LiveNotifications::new(
            Arc::new(Inbox::with_unread(&["n1", "n2"])),
            NotificationTopics::shared(),
        );
        let mut updates = live.topics().updates.subscribe();
        let mut unread = live.topics().unread.subscribe();

        live.mark_read("n1").await.unwrap();

        assert_eq!(
            updates.recv().await.unwrap(),
            NotificationUpdate::Read { id: "n1".into() }
        );
        assert_eq!(unread.recv().await.unwrap(), UnreadCount(1));
    }

    #[tokio::test]
    async fn bulk_read_announces_each_id() {
        let live = LiveNotifications::new(
            Arc::new(Inbox::with_unread(&["n1", "n2", "n3"])),
            NotificationTopics::shared(),
        );
        let mut updates = live.topics().updates.subscribe();
        let mut unread = live.topics().unread.subscribe();

        live.mark_many_read(&["n1".into(), "n3".into()]).await.unwrap();

        assert_eq!(
            updates.recv().await.unwrap(),
            NotificationUpdate::Read { id: "n1".into() }
        );
        assert_eq!(
            updates.recv().await.unwrap(),
            NotificationUpdate::Read { id: "n3".into() }
        );
        assert_eq!(unread.recv().await.unwrap(), UnreadCount(1));
    }

    #[tokio::test]
    async fn mark_all_read_zeroes_the_count() {
        let live = LiveNotifications::new(
            Arc::new(Inbox::with_unread(&["n1"])),
            NotificationTopics::shared(),
        );
        let mut updates = live.topics().updates.subscribe();
        let mut unread = live.topics().unread.subscribe();

        live.mark_all_read().await.unwrap();

        assert_eq!(updates.recv().await.unwrap(), NotificationUpdate::AllRead);
        assert_eq!(unread.recv().await.unwrap(), UnreadCount(0));
    }

    #[tokio::test]
    async fn delete_publishes_deleted() {
        let live = LiveNotifications::new(
            Arc::new(Inbox::with_unread(&["n1"])),
            NotificationTopics::shared(),
        );
        let mut updates = live.topics().updates.subscribe();

        live.delete("n1").await.unwrap();

        assert_eq!(
            updates.recv().await.unwrap(),
            NotificationUpdate::Deleted { id: "n1".into() }
        );
    }

    #[tokio::test]
    async fn failed_change_publishes_nothing() {
        let inbox = Inbox {
            failing: vec!["n1".into()],
            ..Inbox::with_unread(&["n1"])
        };
        let live = LiveNotifications::new(Arc::new(inbox), NotificationTopics::shared());
        let mut updates = live.topics().updates.subscribe();
        let mut unread = live.topics().unread.subscribe();

        assert!(live.mark_read("n1").await.is_err());
        assert!(live.create(&NotificationDraft::new("Sortie", "Lundi"), &[]).await.is_err());

        assert!(updates.try_recv().is_err());
        assert!(unread.try_recv().is_err());
    }
}
