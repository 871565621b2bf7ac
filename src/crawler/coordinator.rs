//! Crawl orchestration
//!
//! `PageCrawler` wires a configuration into a running crawl:
//! - Building the dispatch queue and worker pool from the configured sizes and delay
//! - Wrapping the caller's visitor in a dedup visitor seeded with the start URL
//! - Submitting the root fetch task
//! - Waiting for the outstanding-work counter to reach zero, logging progress
//! - Shutting the pool down on every way out

use crate::config::{validate, Config};
use crate::crawler::counter::WorkCounter;
use crate::crawler::fetcher::{Downloader, HttpDownloader};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::pool::{PoolSettings, WorkerPool};
use crate::crawler::task::{CrawlContext, FetchTask};
use crate::url::{CrawlUrl, DefaultLinkNormalizer, LinkNormalizer};
use crate::visitor::{DedupVisitor, PageVisitor};
use crate::{CrawlerError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// How often progress is logged while a crawl runs
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of the most recent crawl started by a `PageCrawler`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// No crawl has been started yet
    Idle,
    /// Tasks are being fetched
    Running,
    /// Work ran out or the crawl was interrupted; the pool is being stopped
    Draining,
    Done,
}

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,

    /// Tasks that ran to the end, including the ones counted in `tasks_failed`
    pub tasks_completed: u64,

    /// Tasks whose fetch failed with an unclassified error
    pub tasks_failed: u64,

    pub tasks_panicked: u64,
}

/// Recursive crawler starting from the configured start URL
///
/// # Example
///
/// ```no_run
/// use page_crawler::{Config, CrawlUrl, FetchedPage, PageCrawler, PageVisitor, Status};
///
/// struct Printer;
///
/// impl PageVisitor for Printer {
///     fn follow_url(&self, url: &CrawlUrl) -> bool {
///         url.depth() <= 2
///     }
///     fn on_visit(&self, page: &FetchedPage) {
///         println!("{}", page.url());
///     }
///     fn on_error(&self, url: &CrawlUrl, status: Status) {
///         eprintln!("{}: {}", url.link(), status);
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let crawler = PageCrawler::new(Config::for_start_point("http://example.com"))?;
/// let report = crawler.crawl(Printer).await?;
/// println!("{} pages in {:?}", report.tasks_completed, report.elapsed);
/// # Ok(())
/// # }
/// ```
pub struct PageCrawler {
    config: Config,
    downloader: Arc<dyn Downloader>,
    normalizer: Arc<dyn LinkNormalizer>,
    extractor: Arc<dyn LinkExtractor>,
    phase: Mutex<CrawlPhase>,
}

impl PageCrawler {
    /// Creates a crawler that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(PageCrawler)` - Ready to crawl
    /// * `Err(CrawlerError)` - The configuration is invalid or the HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;
        let downloader = HttpDownloader::new(&config)?;
        let normalizer = DefaultLinkNormalizer::new(&config.crawler.start_url)?;
        Self::with_components(config, Arc::new(downloader), Arc::new(normalizer))
    }

    /// Creates a crawler with caller-supplied collaborators
    ///
    /// Links are extracted with `HtmlLinkExtractor` unless replaced through
    /// `with_link_extractor`.
    pub fn with_components(
        config: Config,
        downloader: Arc<dyn Downloader>,
        normalizer: Arc<dyn LinkNormalizer>,
    ) -> Result<Self> {
        let mut config = config;
        validate(&config)?;
        // Validation accepts surrounding whitespace; the root link must not carry it
        config.crawler.start_url = config.crawler.start_url.trim().to_string();
        Ok(Self {
            config,
            downloader,
            normalizer,
            extractor: Arc::new(HtmlLinkExtractor),
            phase: Mutex::new(CrawlPhase::Idle),
        })
    }

    pub fn with_link_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> CrawlPhase {
        *self.phase.lock()
    }

    /// Crawls until no work is left
    ///
    /// The visitor decides which links are followed and receives every visited
    /// page and every fetch error. Links are never followed twice within one call.
    pub async fn crawl<V>(&self, visitor: V) -> Result<CrawlReport>
    where
        V: PageVisitor + 'static,
    {
        self.crawl_until(visitor, std::future::pending()).await
    }

    /// Crawls until no work is left or `interrupt` resolves
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every reachable, accepted URL was processed
    /// * `Err(CrawlerError::Interrupted)` - `interrupt` resolved first; queued
    ///   tasks are discarded and running ones are left to finish on their own
    pub async fn crawl_until<V, F>(&self, visitor: V, interrupt: F) -> Result<CrawlReport>
    where
        V: PageVisitor + 'static,
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let root = CrawlUrl::root(self.config.crawler.start_url.clone());

        let context = Arc::new(CrawlContext {
            pool: WorkerPool::new(PoolSettings::from(&self.config.crawler)),
            counter: Arc::new(WorkCounter::new()),
            downloader: Arc::clone(&self.downloader),
            normalizer: Arc::clone(&self.normalizer),
            extractor: Arc::clone(&self.extractor),
            visitor: Arc::new(DedupVisitor::new(root.link(), visitor)),
            failed: AtomicU64::new(0),
        });
        let _scope = CrawlScope {
            pool: &context.pool,
            phase: &self.phase,
        };

        tracing::info!("Starting crawl at {}", root.link());
        self.set_phase(CrawlPhase::Running);
        FetchTask::submit(root, &context)?;

        let outcome = wait_for_completion(&context, interrupt).await;

        self.set_phase(CrawlPhase::Draining);
        context.pool.shutdown();
        if outcome.is_ok() {
            context.pool.join().await;
        }
        outcome?;

        let report = CrawlReport {
            started_at,
            elapsed: clock.elapsed(),
            tasks_completed: context.pool.completed(),
            tasks_failed: context.failed.load(Ordering::Acquire),
            tasks_panicked: context.pool.panicked(),
        };

        tracing::info!(
            "Crawl completed: {} tasks in {:?} ({} failed, {} panicked)",
            report.tasks_completed,
            report.elapsed,
            report.tasks_failed,
            report.tasks_panicked
        );

        Ok(report)
    }

    fn set_phase(&self, phase: CrawlPhase) {
        let mut current = self.phase.lock();
        tracing::debug!("Crawl phase {:?} -> {:?}", *current, phase);
        *current = phase;
    }
}

/// Waits for the work counter to reach zero, logging progress meanwhile
async fn wait_for_completion<F>(context: &CrawlContext, interrupt: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut progress = tokio::time::interval_at(Instant::now() + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
    progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = context.counter.wait_idle() => return Ok(()),
            _ = &mut interrupt => {
                tracing::warn!(
                    "Crawl interrupted with {} tasks outstanding",
                    context.counter.outstanding()
                );
                return Err(CrawlerError::Interrupted);
            }
            _ = progress.tick() => {
                tracing::info!(
                    "Progress: {} tasks completed, {} outstanding ({} queued, {} workers)",
                    context.pool.completed(),
                    context.counter.outstanding(),
                    context.pool.queued(),
                    context.pool.worker_count()
                );
            }
        }
    }
}

/// Stops the pool and marks the crawl done however `crawl_until` exits
struct CrawlScope<'a> {
    pool: &'a WorkerPool,
    phase: &'a Mutex<CrawlPhase>,
}

impl Drop for CrawlScope<'_> {
    fn drop(&mut self) {
        self.pool.shutdown();
        *self.phase.lock() = CrawlPhase::Done;
    }
}
