//! Single-use preload results.
//!
//! A [`LoadedResult`] is the hand-off point between a spawned preload and
//! the read that consumes it: exactly one fill, exactly one wait. Both
//! halves are taken out of their slots on first use so a second fill or
//! wait surfaces as [`ReaderError::PreloadConsumed`] instead of silently
//! racing.

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{ReaderError, ReaderResult};

type Outcome = ReaderResult<Vec<u8>>;

/// One preloaded byte payload, fillable once and awaitable once
pub struct LoadedResult {
    tx: Mutex<Option<oneshot::Sender<Outcome>>>,
    rx: Mutex<Option<oneshot::Receiver<Outcome>>>,
}

impl LoadedResult {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Deliver the outcome to the waiting side
    pub fn fill(&self, outcome: Outcome) -> ReaderResult<()> {
        let tx = self
            .tx
            .lock()
            .take()
            .ok_or(ReaderError::PreloadConsumed)?;
        // a dropped receiver means nobody is waiting anymore; the
        // outcome is discarded either way
        let _ = tx.send(outcome);
        Ok(())
    }

    /// Wait for the outcome delivered by [`fill`](Self::fill)
    pub async fn wait(&self) -> Outcome {
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or(ReaderError::PreloadConsumed)?;
        rx.await
            .map_err(|_| ReaderError::read("preload abandoned before delivering a result"))?
    }
}

impl Default for LoadedResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fill_then_wait_delivers_the_payload() {
        let loaded = LoadedResult::new();
        loaded.fill(Ok(vec![1, 2, 3])).unwrap();
        assert_eq!(loaded.wait().await.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn wait_pends_until_filled() {
        let loaded = LoadedResult::new();
        let mut wait = tokio_test::task::spawn(loaded.wait());
        assert!(wait.poll().is_pending());

        loaded.fill(Ok(vec![5])).unwrap();
        assert!(wait.is_woken());
        match wait.poll() {
            std::task::Poll::Ready(Ok(bytes)) => assert_eq!(bytes, vec![5]),
            other => panic!("expected delivered payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_fill_is_an_error() {
        let loaded = LoadedResult::new();
        loaded.fill(Ok(vec![])).unwrap();
        let err = loaded.fill(Ok(vec![])).unwrap_err();
        assert!(matches!(err, ReaderError::PreloadConsumed));
    }

    #[tokio::test]
    async fn second_wait_is_an_error() {
        let loaded = LoadedResult::new();
        loaded.fill(Ok(vec![9])).unwrap();
        loaded.wait().await.unwrap();
        let err = loaded.wait().await.unwrap_err();
        assert!(matches!(err, ReaderError::PreloadConsumed));
    }

    #[tokio::test]
    async fn abandoned_producer_surfaces_as_a_read_error() {
        let loaded = LoadedResult::new();
        drop(loaded.tx.lock().take());
        let err = loaded.wait().await.unwrap_err();
        assert!(matches!(err, ReaderError::Read { .. }));
    }

    #[tokio::test]
    async fn errors_pass_through_fill() {
        let loaded = LoadedResult::new();
        loaded
            .fill(Err(ReaderError::cancelled("test cause")))
            .unwrap();
        let err = loaded.wait().await.unwrap_err();
        assert_eq!(err.to_string(), "cancelled: test cause");
    }
}
