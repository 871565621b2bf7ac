use crate::page::{FetchedPage, Status};
use crate::url::CrawlUrl;
use crate::visitor::PageVisitor;
use dashmap::DashSet;

/// Rejects links that were already seen anywhere in the crawl
///
/// The seen-set only grows. Checking and marking a link is a single atomic
/// insert, so two workers racing on the same link cannot both get past this
/// visitor. A link is marked seen even when the inner visitor then declines it.
pub struct DedupVisitor<V> {
    seen: DashSet<String>,
    inner: V,
}

impl<V: PageVisitor> DedupVisitor<V> {
    /// Creates the visitor with `root_link` already marked as seen
    pub fn new(root_link: &str, inner: V) -> Self {
        let seen = DashSet::new();
        seen.insert(root_link.to_string());
        Self { seen, inner }
    }

    /// Number of distinct links seen so far, root included
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_seen(&self, link: &str) -> bool {
        self.seen.contains(link)
    }
}

impl<V: PageVisitor> PageVisitor for DedupVisitor<V> {
    fn follow_url(&self, url: &CrawlUrl) -> bool {
        if !self.seen.insert(url.link().to_string()) {
            tracing::trace!("Already seen {}", url.link());
            return false;
        }
        self.inner.follow_url(url)
    }

    fn on_visit(&self, page: &FetchedPage) {
        self.inner.on_visit(page);
    }

    fn on_error(&self, url: &CrawlUrl, status: Status) {
        self.inner.on_error(url, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::testing::StubVisitor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_root_is_pre_marked() {
        let visitor = DedupVisitor::new("http://test.com", StubVisitor::accepting());

        assert!(visitor.has_seen("http://test.com"));
        assert!(!visitor.follow_url(&CrawlUrl::new("http://test.com", 1)));
        assert_eq!(visitor.inner.follow_calls(), 0);
    }

    #[test]
    fn test_accepts_each_link_once() {
        let visitor = DedupVisitor::new("http://test.com", StubVisitor::accepting());
        let url = CrawlUrl::new("http://test.com/a", 1);

        assert!(visitor.follow_url(&url));
        assert!(!visitor.follow_url(&url));
        assert!(!visitor.follow_url(&CrawlUrl::new("http://test.com/a", 3)));

        assert_eq!(visitor.inner.follow_calls(), 1);
        assert_eq!(visitor.seen_count(), 2);
    }

    #[test]
    fn test_marks_seen_even_when_inner_rejects() {
        let visitor = DedupVisitor::new("http://test.com", StubVisitor::rejecting());
        let url = CrawlUrl::new("http://test.com/a", 1);

        assert!(!visitor.follow_url(&url));
        assert!(visitor.has_seen("http://test.com/a"));
        assert!(!visitor.follow_url(&url));
        assert_eq!(visitor.inner.follow_calls(), 1);
    }

    #[test]
    fn test_reporting_is_not_filtered() {
        let visitor = DedupVisitor::new("http://test.com", StubVisitor::accepting());

        visitor.on_visit(&FetchedPage::ok("http://test.com", "<html></html>"));
        visitor.on_error(&CrawlUrl::root("http://test.com"), Status::NotFound);

        assert_eq!(visitor.inner.visited.lock().len(), 1);
        assert_eq!(visitor.inner.errors.lock().len(), 1);
    }

    #[test]
    fn test_concurrent_check_and_mark_admits_one_worker() {
        const WORKERS: usize = 32;
        const ROUNDS: usize = 50;

        for round in 0..ROUNDS {
            let visitor = Arc::new(DedupVisitor::new(
                "http://test.com",
                StubVisitor::accepting(),
            ));
            let accepted = AtomicUsize::new(0);
            let barrier = Barrier::new(WORKERS);
            let link = format!("http://test.com/contended/{}", round);

            std::thread::scope(|scope| {
                for _ in 0..WORKERS {
                    scope.spawn(|| {
                        barrier.wait();
                        if visitor.follow_url(&CrawlUrl::new(link.as_str(), 1)) {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
            });

            assert_eq!(accepted.load(Ordering::SeqCst), 1);
            assert_eq!(visitor.inner.follow_calls(), 1);
        }
    }
}
