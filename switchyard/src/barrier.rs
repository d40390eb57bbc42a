//! # Completion Barrier
//!
//! A per-request wait group. Every branch of a request's call tree holds a
//! [`BarrierGuard`] while it runs; the response stream is finalized only once
//! the count returns to zero.
//!
//! The count lives in a `tokio::sync::watch` channel so that [`Barrier::wait`]
//! can observe the transition to zero without polling. Guards decrement on
//! drop, which covers success, error, panic and cancellation alike.

use std::sync::Arc;
use tokio::sync::watch;

/// Counts in-flight branches of one request.
#[derive(Debug, Clone)]
pub struct Barrier {
    count: Arc<watch::Sender<usize>>,
}

impl Barrier {
    /// Create a barrier with no branches in flight.
    pub fn new() -> Self {
        let (count, _rx) = watch::channel(0);
        Self {
            count: Arc::new(count),
        }
    }

    /// Register a branch. The branch ends when the guard is dropped.
    #[must_use = "the branch ends as soon as the guard is dropped"]
    pub fn enter(&self) -> BarrierGuard {
        self.count.send_modify(|count| *count += 1);
        BarrierGuard {
            count: self.count.clone(),
        }
    }

    /// Number of branches currently in flight.
    pub fn pending(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolve once no branch is in flight.
    ///
    /// Returns immediately if the count is already zero, so callers register
    /// the root branch before waiting.
    pub async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one branch as in flight until dropped.
#[derive(Debug)]
pub struct BarrierGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        self.count
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_resolves_immediately_when_idle() {
        Barrier::new().wait().await;
    }

    #[tokio::test]
    async fn test_guards_count_branches() {
        let barrier = Barrier::new();
        let a = barrier.enter();
        let b = barrier.enter();
        assert_eq!(barrier.pending(), 2);
        drop(a);
        assert_eq!(barrier.pending(), 1);
        drop(b);
        assert_eq!(barrier.pending(), 0);
    }

    #[tokio::test]
    async fn test_wait_until_last_guard_drops() {
        let barrier = Barrier::new();
        let guard = barrier.enter();

        let waiter = tokio::spawn({
            let barrier = barrier.clone();
            async move { barrier.wait().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_branch_still_leaves() {
        let barrier = Barrier::new();
        let guard = barrier.enter();
        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("branch failed");
        });
        assert!(task.await.is_err());
        assert_eq!(barrier.pending(), 0);
    }
}
