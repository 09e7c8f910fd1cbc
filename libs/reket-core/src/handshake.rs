use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Single-resolution value shared by any number of waiters.
///
/// A handshake is created eagerly and resolved later by an unrelated code
/// path. Every clone observes the same outcome; only the first call to
/// [`resolve`](Self::resolve) has an effect.
///
/// Backed by a `tokio::sync::watch` channel holding `Option<T>`, so waiters
/// that subscribe after resolution return immediately.
pub struct Handshake<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for Handshake<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> fmt::Debug for Handshake<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("settled", &self.tx.borrow().is_some())
            .finish()
    }
}

impl<T: Clone> Handshake<T> {
    /// Create an unresolved handshake.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Resolve the handshake with `value`.
    ///
    /// Returns `false` (and drops `value`) if the handshake was already
    /// resolved.
    pub fn resolve(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        })
    }

    /// Whether [`resolve`](Self::resolve) has been called.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The resolved value, if any, without waiting.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Wait until the handshake is resolved and return a copy of the value.
    ///
    /// Never completes for a handshake that is never resolved.
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(value) = current {
                return value;
            }
            // The sender lives as long as `self`, so `changed` cannot fail here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl<T: Clone> Default for Handshake<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_after_resolve_returns_immediately() {
        let handshake = Handshake::new();
        assert!(handshake.resolve(42));
        assert_eq!(handshake.wait().await, 42);
        assert!(handshake.is_settled());
    }

    #[tokio::test]
    async fn test_second_resolve_is_ignored() {
        let handshake = Handshake::new();
        assert!(handshake.resolve("first"));
        assert!(!handshake.resolve("second"));
        assert_eq!(handshake.peek(), Some("first"));
    }

    #[tokio::test]
    async fn test_many_waiters_observe_one_outcome() {
        let handshake: Handshake<Option<u32>> = Handshake::new();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let h = handshake.clone();
                tokio::spawn(async move { h.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        handshake.resolve(Some(7));

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), Some(7));
        }
    }

    #[tokio::test]
    async fn test_unresolved_handshake_keeps_pending() {
        let handshake: Handshake<()> = Handshake::new();
        let result = tokio::time::timeout(Duration::from_millis(20), handshake.wait()).await;
        assert!(result.is_err());
        assert!(!handshake.is_settled());
    }
}
