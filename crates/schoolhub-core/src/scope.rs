//! View lifetimes.
//!
//! A [`ViewScope`] owns the requests and pollers started by one view. After
//! teardown their results are discarded; requests already sent are left to
//! finish on their own.

use std::future::Future;

use tokio::sync::watch;

/// Teardown signal for one view. Dropping the scope tears it down.
#[derive(Debug)]
pub struct ViewScope {
    name: String,
    closed: watch::Sender<bool>,
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            name: name.into(),
            closed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Tear the view down. Idempotent.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            tracing::debug!(view = %self.name, "view torn down");
        }
    }

    /// A cloneable handle background tasks use to observe teardown.
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            closed: self.closed.subscribe(),
        }
    }

    /// Run `request` on its own task and hand back its output, or `None` if
    /// the view was torn down first. The request is not aborted.
    pub async fn run<F>(&self, request: F) -> Option<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.is_closed() {
            return None;
        }
        let mut handle = self.handle();
        let task = tokio::spawn(request);
        tokio::select! {
            joined = task => match joined {
                Ok(output) if !self.is_closed() => Some(output),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(view = %self.name, "request task failed: {e}");
                    None
                }
            },
            _ = handle.closed() => {
                tracing::debug!(view = %self.name, "discarding result of request after teardown");
                None
            }
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}

/// Observer side of a [`ViewScope`].
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    closed: watch::Receiver<bool>,
}

impl ScopeHandle {
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow() || self.closed.has_changed().is_err()
    }

    /// Resolves once the scope is torn down or dropped.
    pub async fn closed(&mut self) {
        let _ = self.closed.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn returns_result_while_open() {
        let scope = ViewScope::new("dashboard");
        assert_eq!(scope.run(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn closed_scope_runs_nothing() {
        let scope = ViewScope::new("dashboard");
        scope.close();
        assert_eq!(scope.run(async { 7 }).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_discards_but_does_not_abort() {
        let scope = Arc::new(ViewScope::new("exercise"));
        let finished = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&finished);
        let runner = Arc::clone(&scope);
        let pending = tokio::spawn(async move {
            runner
                .run(async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    flag.store(true, Ordering::SeqCst);
                    42
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        scope.close();
        assert_eq!(pending.await.unwrap(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn handle_sees_drop_as_teardown() {
        let scope = ViewScope::new("sidebar");
        let mut handle = scope.handle();
        assert!(!handle.is_closed());
        drop(scope);
        handle.closed().await;
        assert!(handle.is_closed());
    }
}
