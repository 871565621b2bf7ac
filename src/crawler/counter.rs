//! Outstanding-work counter used to detect the end of a crawl

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Count of queued plus running units of work
///
/// Work is registered with `enter`, which hands back a `WorkGuard`. The count
/// drops when the guard is dropped, so a unit of work is released exactly once
/// however it ends: normally, with an error, by panicking, or by being
/// discarded from the queue before it ever ran.
#[derive(Debug, Default)]
pub(crate) struct WorkCounter {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl WorkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unit of work
    ///
    /// Must be called before the work is made visible to any worker.
    pub fn enter(self: &Arc<Self>) -> WorkGuard {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        WorkGuard {
            counter: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Resolves once no work is outstanding
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn leave(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Releases one unit of work on drop
#[derive(Debug)]
#[must_use = "dropping the guard releases the work immediately"]
pub(crate) struct WorkGuard {
    counter: Arc<WorkCounter>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.counter.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_guard_tracks_outstanding_work() {
        let counter = Arc::new(WorkCounter::new());
        assert_eq!(counter.outstanding(), 0);

        let first = counter.enter();
        let second = counter.enter();
        assert_eq!(counter.outstanding(), 2);

        drop(first);
        assert_eq!(counter.outstanding(), 1);
        drop(second);
        assert_eq!(counter.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let counter = WorkCounter::new();
        counter.wait_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_resolves_when_last_guard_drops() {
        let counter = Arc::new(WorkCounter::new());
        let guard = counter.enter();

        let waiter = {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move { counter.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        // Handing work over before releasing keeps the count above zero
        let child = counter.enter();
        drop(guard);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(child);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_guard_released_when_task_panics() {
        let counter = Arc::new(WorkCounter::new());
        let guard = counter.enter();

        let result = tokio::spawn(async move {
            let _guard = guard;
            panic!("task failed");
        })
        .await;

        assert!(result.unwrap_err().is_panic());
        assert_eq!(counter.outstanding(), 0);
    }
}
