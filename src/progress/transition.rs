use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// A one-shot delayed action that can be called off before it fires.
///
/// Dropping the transition cancels it, so a view that goes away takes its
/// pending navigation with it.
pub struct DelayedTransition {
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<bool>,
}

impl DelayedTransition {
    pub fn schedule<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = sleep(delay) => {
                    action().await;
                    true
                }
                // Fires on explicit cancel and when the sender is dropped.
                _ = cancel_rx => false,
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
            handle,
        }
    }

    /// Idempotent. Has no effect once the action has run.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_pending(&self) -> bool {
        self.cancel_tx.is_some() && !self.handle.is_finished()
    }

    /// Wait for the timer to settle. `true` means the action ran.
    pub async fn settled(self) -> bool {
        let DelayedTransition { cancel_tx, handle } = self;
        let result = handle.await.unwrap_or(false);
        drop(cancel_tx);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let transition = DelayedTransition::schedule(Duration::from_secs(3), move || async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(transition.is_pending());
        assert!(transition.settled().await);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_action() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let mut transition =
            DelayedTransition::schedule(Duration::from_secs(3), move || async move {
                flag.store(true, Ordering::SeqCst);
            });
        transition.cancel();
        transition.cancel();
        assert!(!transition.is_pending());
        assert!(!transition.settled().await);
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let transition = DelayedTransition::schedule(Duration::from_secs(3), move || async move {
            flag.store(true, Ordering::SeqCst);
        });
        drop(transition);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
