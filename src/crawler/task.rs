//! Fetch task: the recursive unit of crawl work

use crate::crawler::counter::{WorkCounter, WorkGuard};
use crate::crawler::fetcher::Downloader;
use crate::crawler::parser::LinkExtractor;
use crate::crawler::pool::WorkerPool;
use crate::page::FetchedPage;
use crate::url::{CrawlUrl, LinkNormalizer};
use crate::visitor::PageVisitor;
use crate::CrawlerError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Services shared by every task of one crawl
pub(crate) struct CrawlContext {
    pub pool: WorkerPool,
    pub counter: Arc<WorkCounter>,
    pub downloader: Arc<dyn Downloader>,
    pub normalizer: Arc<dyn LinkNormalizer>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub visitor: Arc<dyn PageVisitor>,

    /// Tasks that ended with an unclassified error
    pub failed: AtomicU64,
}

/// Fetches one URL, reports it to the visitor chain and submits accepted children
pub(crate) struct FetchTask {
    url: CrawlUrl,
    context: Arc<CrawlContext>,

    /// Held for the whole life of the task, queued or running
    _guard: WorkGuard,
}

impl FetchTask {
    /// Registers a task for `url` with the work counter and queues it
    ///
    /// The counter is incremented before the task becomes visible to any
    /// worker. If the pool refuses the task it is dropped, which releases the
    /// count again.
    pub fn submit(url: CrawlUrl, context: &Arc<CrawlContext>) -> Result<(), CrawlerError> {
        let task = FetchTask {
            _guard: context.counter.enter(),
            context: Arc::clone(context),
            url,
        };
        context.pool.submit(task.run())
    }

    async fn run(self) {
        if let Err(e) = self.execute().await {
            self.context.failed.fetch_add(1, Ordering::AcqRel);
            tracing::error!("Failed to crawl {}: {}", self.url, e);
        }
    }

    async fn execute(&self) -> Result<(), CrawlerError> {
        tracing::debug!("Fetching {}", self.url);
        let page = self.context.downloader.fetch(self.url.link()).await?;

        match &page {
            FetchedPage::Error { status, .. } => {
                self.context.visitor.on_error(&self.url, *status);
                Ok(())
            }
            FetchedPage::RejectedMimeType { mime_type, .. } => {
                tracing::debug!("Skipping {}: content type '{}'", self.url, mime_type);
                Ok(())
            }
            FetchedPage::Ok { .. } => {
                self.context.visitor.on_visit(&page);
                self.follow_links(&page)
            }
        }
    }

    fn follow_links(&self, page: &FetchedPage) -> Result<(), CrawlerError> {
        let mut followed = 0;

        for raw_link in page.links(self.context.extractor.as_ref()) {
            let link = match self.context.normalizer.normalize(&raw_link) {
                Ok(link) => link,
                Err(e) => {
                    tracing::debug!("Ignoring link '{}' on {}: {}", raw_link, self.url.link(), e);
                    continue;
                }
            };

            let child = self.url.child(link);
            if self.context.visitor.follow_url(&child) {
                FetchTask::submit(child, &self.context)?;
                followed += 1;
            }
        }

        tracing::debug!("Following {} links from {}", followed, self.url.link());
        Ok(())
    }
}
