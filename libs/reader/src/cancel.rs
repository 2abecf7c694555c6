//! # Cancellation Tokens
//!
//! ## Purpose
//!
//! Read operations can outlive the caller's interest: a batch read may
//! abort its siblings when one leg fails, or a caller may walk away
//! mid-fetch. Tokens carry an explicit *cause* string so the resulting
//! error names who cancelled and why rather than a bare "cancelled".
//!
//! Backed by `tokio::sync::watch`: a [`CancelHandle`] publishes the cause
//! once, every [`CancellationToken`] clone observes it. A token whose
//! handle is dropped without cancelling pends forever, which makes
//! "no cancellation" the natural default inside `select!` arms.

use std::sync::Arc;

use tokio::sync::watch;

/// Observer side; cheap to clone and pass into spawned work
#[derive(Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<Option<String>>,
}

/// Producer side; publishes the cancellation cause at most once
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl CancellationToken {
    /// A fresh token and the handle that cancels it
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(None);
        (Self { rx }, CancelHandle { tx: Arc::new(tx) })
    }

    /// A token that can never be cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The published cause, if any
    pub fn cause(&self) -> Option<String> {
        self.rx.borrow().clone()
    }

    /// Resolves with the cause once cancelled; pends forever otherwise
    pub async fn cancelled(&self) -> String {
        let mut rx = self.rx.clone();
        loop {
            if let Some(cause) = rx.borrow().clone() {
                return cause;
            }
            if rx.changed().await.is_err() {
                // handle dropped without cancelling; nothing can ever
                // publish a cause now
                std::future::pending::<()>().await;
            }
        }
    }

    /// A sub-token that cancels when either its own handle or this parent
    /// cancels; the parent's cause propagates unchanged
    pub fn child(&self) -> (CancellationToken, CancelHandle) {
        let (token, handle) = CancellationToken::new();
        let parent = self.clone();
        let tx = Arc::clone(&handle.tx);
        tokio::spawn(async move {
            tokio::select! {
                cause = parent.cancelled() => {
                    let _ = tx.send(Some(cause));
                }
                _ = tx.closed() => {}
            }
        });
        (token, handle)
    }
}

impl CancelHandle {
    /// Publish the cause; later calls keep the first cause
    pub fn cancel(&self, cause: impl Into<String>) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(cause.into());
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_resolves_with_the_cause() {
        let (token, handle) = CancellationToken::new();
        assert!(!token.is_cancelled());

        handle.cancel("caller gave up");
        assert_eq!(token.cancelled().await, "caller gave up");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn first_cause_wins() {
        let (token, handle) = CancellationToken::new();
        handle.cancel("first");
        handle.cancel("second");
        assert_eq!(token.cancelled().await, "first");
    }

    #[tokio::test(start_paused = true)]
    async fn uncancelled_token_pends() {
        let token = CancellationToken::never();
        let waited = tokio::time::timeout(Duration::from_secs(60), token.cancelled()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn child_observes_parent_cancellation() {
        let (parent, parent_handle) = CancellationToken::new();
        let (child, _child_handle) = parent.child();

        parent_handle.cancel("parent stopped");
        assert_eq!(child.cancelled().await, "parent stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn child_cancellation_does_not_reach_the_parent() {
        let (parent, _parent_handle) = CancellationToken::new();
        let (child, child_handle) = parent.child();

        child_handle.cancel("local abort");
        assert_eq!(child.cancelled().await, "local abort");

        let waited =
            tokio::time::timeout(Duration::from_secs(60), parent.cancelled()).await;
        assert!(waited.is_err());
    }
}
