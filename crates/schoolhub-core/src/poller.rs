//! Background refresh of the unread-notification count.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::events::{NotificationTopics, UnreadCount};
use crate::scope::ScopeHandle;
use crate::traits::NotificationApi;

/// Default refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically fetches the unread count and publishes changes on the
/// unread topic.
///
/// Polling stops as soon as the owning view is torn down or the poller is
/// dropped. A failed poll is logged and the last published count stands.
#[derive(Debug)]
pub struct UnreadPoller {
    task: JoinHandle<()>,
}

impl UnreadPoller {
    pub fn spawn(
        api: Arc<dyn NotificationApi>,
        topics: Arc<NotificationTopics>,
        interval: Duration,
        mut scope: ScopeHandle,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last: Option<u64> = None;

            loop {
                tokio::select! {
                    _ = scope.closed() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = scope.closed() => break,
                    result = api.unread_count() => result,
                };

                match result {
                    Ok(count) if last != Some(count) => {
                        last = Some(count);
                        topics.unread.publish(UnreadCount(count));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("unread count refresh failed: {e}");
                    }
                }
            }
            tracing::debug!("unread poller stopped");
        });

        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for UnreadPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
