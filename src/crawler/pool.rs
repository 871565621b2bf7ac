//! Worker pool draining the rate-limited dispatch queue
//!
//! The pool keeps `min_workers` core workers alive until shutdown. When a job
//! is submitted and no worker is idle, an extra worker is started, up to
//! `max_workers`; extra workers exit after `keep_alive` without work.
//!
//! Every job runs in its own spawned task that the worker awaits, so a job
//! that panics is logged and counted without taking its worker down.

use crate::config::CrawlerConfig;
use crate::crawler::queue::DelayedQueue;
use crate::CrawlerError;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A unit of work dispatched to a worker
pub(crate) type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Sizing and pacing of a worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PoolSettings {
    pub min_workers: usize,
    pub max_workers: usize,

    /// Idle time after which a worker above `min_workers` exits
    pub keep_alive: Duration,

    /// Minimum time between two jobs leaving the queue
    pub dispatch_delay: Duration,
}

impl From<&CrawlerConfig> for PoolSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            min_workers: config.min_pool_size,
            max_workers: config.max_pool_size,
            keep_alive: config.keep_alive_duration(),
            dispatch_delay: config.request_delay_duration(),
        }
    }
}

struct PoolShared {
    queue: DelayedQueue<Job>,
    settings: PoolSettings,
    workers: AtomicUsize,
    idle: AtomicUsize,
    next_worker_id: AtomicUsize,
    completed: AtomicU64,
    panicked: AtomicU64,
    shutdown: AtomicBool,
}

/// Self-feeding pool of tokio workers
///
/// Must be created from within a tokio runtime.
pub(crate) struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates the pool and starts its core workers
    pub fn new(settings: PoolSettings) -> Self {
        let min_workers = settings.min_workers.max(1);
        let pool = Self {
            shared: Arc::new(PoolShared {
                queue: DelayedQueue::new(settings.dispatch_delay),
                settings,
                workers: AtomicUsize::new(0),
                idle: AtomicUsize::new(0),
                next_worker_id: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                panicked: AtomicU64::new(0),
                shutdown: AtomicBool::new(false),
            }),
            handles: Mutex::new(Vec::new()),
        };

        for _ in 0..min_workers {
            pool.shared.workers.fetch_add(1, Ordering::AcqRel);
            pool.spawn_worker(true);
        }

        tracing::debug!(
            "Started worker pool: {} core workers, up to {} total, {:?} between dispatches",
            min_workers,
            pool.shared.settings.max_workers,
            pool.shared.queue.delay()
        );

        pool
    }

    /// Queues a job for execution
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The job was queued
    /// * `Err(CrawlerError::PoolShutdown)` - The pool no longer accepts work;
    ///   the job is dropped without running
    pub fn submit<F>(&self, job: F) -> Result<(), CrawlerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shutdown() {
            return Err(CrawlerError::PoolShutdown);
        }

        self.shared.queue.push(Box::pin(job));
        self.grow_if_saturated();
        Ok(())
    }

    /// Stops accepting work, discards queued jobs and lets workers exit
    ///
    /// Jobs that are already running are left to finish.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.queue.close();
        tracing::debug!(
            "Worker pool shut down after {} jobs ({} panicked)",
            self.completed(),
            self.panicked()
        );
    }

    /// Waits for every worker to exit
    ///
    /// Only returns once the pool is shut down and running jobs have finished.
    pub async fn join(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker exited abnormally: {}", e);
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Jobs that ran to completion without panicking
    pub fn completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Acquire)
    }

    pub fn panicked(&self) -> u64 {
        self.shared.panicked.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.shared.workers.load(Ordering::Acquire)
    }

    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    fn grow_if_saturated(&self) {
        if self.shared.idle.load(Ordering::Acquire) > 0 {
            return;
        }

        let max_workers = self.shared.settings.max_workers;
        let reserved =
            self.shared
                .workers
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                    (current < max_workers).then_some(current + 1)
                });
        if reserved.is_ok() {
            self.spawn_worker(false);
        }
    }

    fn spawn_worker(&self, core: bool) {
        let id = self.shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(run_worker(Arc::clone(&self.shared), id, core));

        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_worker(shared: Arc<PoolShared>, id: usize, core: bool) {
    tracing::trace!("Worker {} started (core: {})", id, core);

    loop {
        // Workers only count as idle while they actually wait for work
        let job = match shared.queue.try_pop() {
            Some(job) => Some(job),
            None => {
                shared.idle.fetch_add(1, Ordering::AcqRel);
                let job = if core {
                    shared.queue.pop().await
                } else {
                    shared.queue.pop_timeout(shared.settings.keep_alive).await
                };
                shared.idle.fetch_sub(1, Ordering::AcqRel);
                job
            }
        };

        let Some(job) = job else {
            break;
        };

        match tokio::spawn(job).await {
            Ok(()) => {
                shared.completed.fetch_add(1, Ordering::AcqRel);
            }
            Err(e) if e.is_panic() => {
                shared.panicked.fetch_add(1, Ordering::AcqRel);
                tracing::error!("Job on worker {} panicked", id);
            }
            Err(e) => {
                tracing::debug!("Job on worker {} was cancelled: {}", id, e);
            }
        }
    }

    shared.workers.fetch_sub(1, Ordering::AcqRel);
    tracing::trace!("Worker {} exited", id);
}
