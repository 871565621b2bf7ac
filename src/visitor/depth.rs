use crate::page::{FetchedPage, Status};
use crate::url::CrawlUrl;
use crate::visitor::PageVisitor;

/// Stops following links deeper than `max_depth` hops from the start URL
pub struct DepthVisitor<V> {
    max_depth: u32,
    inner: V,
}

impl<V: PageVisitor> DepthVisitor<V> {
    pub fn new(max_depth: u32, inner: V) -> Self {
        Self { max_depth, inner }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

impl<V: PageVisitor> PageVisitor for DepthVisitor<V> {
    fn follow_url(&self, url: &CrawlUrl) -> bool {
        if url.depth() > self.max_depth {
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
