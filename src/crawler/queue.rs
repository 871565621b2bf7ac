//! Rate-limited dispatch queue
//!
//! An unbounded FIFO queue whose removals are throttled globally: no two
//! successful pops, across all consumers, happen less than `delay` apart.
//!
//! Consumers serialize on a single gate that also stores the instant of the
//! last successful pop. A consumer holding the gate first waits for the queue
//! to become non-empty, then waits out whatever is left of the delay, then
//! removes the head and records the new instant without yielding in between.
//! An empty queue never makes a consumer sit out the delay for nothing: the
//! remaining delay is only evaluated once work is available.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::time::Instant;

/// Unbounded FIFO queue with a global minimum interval between removals
pub(crate) struct DelayedQueue<T> {
    items: Mutex<VecDeque<T>>,

    /// Signalled on push and on close
    available: Notify,

    /// Exclusive consumer section, holding the instant of the last successful pop
    gate: AsyncMutex<Option<Instant>>,

    delay: Duration,
    closed: AtomicBool,
}

impl<T> DelayedQueue<T> {
    /// Creates a queue; a zero `delay` disables throttling
    pub fn new(delay: Duration) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            gate: AsyncMutex::new(None),
            delay,
            closed: AtomicBool::new(false),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Appends an item to the tail
    ///
    /// Never blocks. Items pushed after `close` are dropped immediately.
    pub fn push(&self, item: T) {
        if self.is_closed() {
            return;
        }
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Removes the head, waiting for work and for the throttle
    ///
    /// # Returns
    ///
    /// * `Some(item)` - The head of the queue
    /// * `None` - The queue was closed
    pub async fn pop(&self) -> Option<T> {
        let mut last_pop = self.gate.lock().await;

        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_closed() {
                return None;
            }
            if !self.items.lock().is_empty() {
                break;
            }
            notified.await;
        }

        // A wake-up here is either close or a push; a push just re-arms the wait
        while let Some(ready_at) = self.ready_at(*last_pop) {
            let closing = self.available.notified();
            tokio::pin!(closing);
            closing.as_mut().enable();

            if self.is_closed() {
                return None;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(ready_at) => {}
                _ = &mut closing => {}
            }
            if self.is_closed() {
                return None;
            }
        }

        self.take_head(&mut last_pop)
    }

    /// Like `pop`, giving up after `timeout`
    ///
    /// Returns `None` when the timeout elapses or the queue is closed. Dropping
    /// the wait never loses an item: the head is removed only once it is handed out.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.pop()).await.ok().flatten()
    }

    /// Removes the head only if that is possible right now
    ///
    /// Returns `None` when another consumer holds the gate, the throttle has
    /// not elapsed, the queue is empty or it has been closed.
    pub fn try_pop(&self) -> Option<T> {
        let mut last_pop = self.gate.try_lock().ok()?;
        if self.is_closed() {
            return None;
        }
        if let Some(ready_at) = self.ready_at(*last_pop) {
            if Instant::now() < ready_at {
                return None;
            }
        }
        self.take_head(&mut last_pop)
    }

    /// Closes the queue, discarding pending items and waking every consumer
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let discarded = std::mem::take(&mut *self.items.lock());
        if !discarded.is_empty() {
            tracing::debug!("Discarding {} queued items", discarded.len());
        }
        drop(discarded);
        self.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Earliest instant the next pop may happen, if the throttle applies
    fn ready_at(&self, last_pop: Option<Instant>) -> Option<Instant> {
        if self.delay.is_zero() {
            return None;
        }
        let ready_at = last_pop? + self.delay;
        (Instant::now() < ready_at).then_some(ready_at)
    }

    /// Must be called with the gate held
    fn take_head(&self, last_pop: &mut Option<Instant>) -> Option<T> {
        let item = self.items.lock().pop_front()?;
        *last_pop = Some(Instant::now());
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order_without_delay() {
        let queue = DelayedQueue::new(Duration::ZERO);
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.try_pop(), Some(3));
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successive_pops_are_spaced_by_delay() {
        let delay = Duration::from_millis(200);
        let queue = Arc::new(DelayedQueue::new(delay));
        for item in 0..3 {
            queue.push(item);
        }

        let popped_at = Arc::new(Mutex::new(Vec::new()));
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let popped_at = Arc::clone(&popped_at);
                tokio::spawn(async move {
                    if queue.pop().await.is_some() {
                        popped_at.lock().push(Instant::now());
                    }
                })
            })
            .collect();
        for consumer in consumers {
            consumer.await.unwrap();
        }

        let mut popped_at = popped_at.lock().clone();
        popped_at.sort();
        assert_eq!(popped_at.len(), 3);
        for pair in popped_at.windows(2) {
            assert!(pair[1] - pair[0] >= delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pop_is_not_delayed() {
        let queue = DelayedQueue::new(Duration::from_secs(5));
        let start = Instant::now();
        queue.push("first");

        assert_eq!(queue.pop().await, Some("first"));
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_counts_towards_delay() {
        let delay = Duration::from_millis(200);
        let queue = DelayedQueue::new(delay);
        queue.push(1);
        queue.pop().await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        queue.push(2);
        let before = Instant::now();
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_waits_for_push() {
        let queue = Arc::new(DelayedQueue::new(Duration::ZERO));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!consumer.is_finished());
        queue.push(7);
        assert_eq!(consumer.await.unwrap(), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_pop_respects_throttle() {
        let delay = Duration::from_millis(100);
        let queue = DelayedQueue::new(delay);
        queue.push(1);
        queue.push(2);

        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), None);
        tokio::time::sleep(delay).await;
        assert_eq!(queue.try_pop(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_timeout_on_empty_queue() {
        let queue: DelayedQueue<u32> = DelayedQueue::new(Duration::ZERO);
        let start = Instant::now();

        assert_eq!(queue.pop_timeout(Duration::from_millis(300)).await, None);
        assert!(Instant::now() - start >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_pop_keeps_item() {
        let queue = DelayedQueue::new(Duration::from_secs(1));
        queue.push(1);
        queue.push(2);
        queue.pop().await;

        assert_eq!(queue.pop_timeout(Duration::from_millis(10)).await, None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_wakes_waiting_consumers() {
        let queue: Arc<DelayedQueue<u32>> = Arc::new(DelayedQueue::new(Duration::ZERO));
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.pop().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close();
        for consumer in consumers {
            assert_eq!(consumer.await.unwrap(), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_interrupts_throttle_wait() {
        let queue = Arc::new(DelayedQueue::new(Duration::from_secs(3600)));
        queue.push(1);
        queue.push(2);
        queue.pop().await;

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close();

        assert_eq!(consumer.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_discards_pending_items() {
        let queue = DelayedQueue::new(Duration::ZERO);
        queue.push(1);
        queue.push(2);
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.len(), 0);
        queue.push(3);
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop().await, None);
    }
}
