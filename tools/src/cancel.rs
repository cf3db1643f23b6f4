//! Cooperative cancellation context (spec.md §5 "Scheduling model",
//! §9 "Cancellation through nested contexts").
//!
//! A single [`CancelToken`] is created per turn and cloned into every
//! long-running operation it spawns — subprocess waits, provider calls,
//! streaming reads — never re-derived from a fresh root, so one cancel
//! call cascades everywhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    canceled: AtomicBool,
    notify: Notify,
}

/// A cloneable, cooperative cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<Inner>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark canceled and wake every waiter. Idempotent (spec.md §5
    /// "Cancellation is idempotent").
    pub fn cancel(&self) {
        self.0.canceled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.0.canceled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called. Intended for use in a
    /// `tokio::select!` alongside the operation being canceled.
    pub async fn canceled(&self) {
        if self.is_canceled() {
            return;
        }
        // Re-check after registering to avoid a cancel-before-register race.
        let notified = self.0.notify.notified();
        if self.is_canceled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent_and_observable() {
        let token = CancelToken::new();
        assert!(!token.is_canceled());
        token.cancel();
        token.cancel();
        assert!(token.is_canceled());
    }

    #[tokio::test]
    async fn canceled_resolves_immediately_if_already_canceled() {
        let token = CancelToken::new();
        token.cancel();
        token.canceled().await;
    }

    #[tokio::test]
    async fn canceled_resolves_after_a_later_cancel_call() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.canceled().await;
        });
        tokio::task::yield_now().await;
        token.cancel();
        handle.await.unwrap();
    }
}
