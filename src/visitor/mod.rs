//! Visitor chain deciding which links to follow and how fetched pages are handled
//!
//! A chain is built by nesting decorators around an application-supplied visitor:
//!
//! - `DedupVisitor`: never follows a link twice
//! - `DomainVisitor`: only follows links on one origin
//! - `DepthVisitor`: stops following past a maximum depth
//!
//! Decorators only filter `follow_url`. A decorator that rejects a URL never
//! asks its inner visitor, while `on_visit` and `on_error` always reach the
//! innermost visitor.
//!
//! # Example
//!
//! ```
//! use page_crawler::{CrawlUrl, DepthVisitor, DomainVisitor, FetchedPage, PageVisitor, Status};
//!
//! struct Printer;
//!
//! impl PageVisitor for Printer {
//!     fn follow_url(&self, _url: &CrawlUrl) -> bool {
//!         true
//!     }
//!     fn on_visit(&self, page: &FetchedPage) {
//!         println!("visited {}", page.url());
//!     }
//!     fn on_error(&self, url: &CrawlUrl, status: Status) {
//!         println!("{} failed: {}", url.link(), status);
//!     }
//! }
//!
//! let chain = DomainVisitor::new("http://a.com", DepthVisitor::new(2, Printer)).unwrap();
//! assert!(chain.follow_url(&CrawlUrl::new("http://a.com/x", 1)));
//! assert!(!chain.follow_url(&CrawlUrl::new("http://b.com/x", 1)));
//! assert!(!chain.follow_url(&CrawlUrl::new("http://a.com/deep", 3)));
//! ```

mod dedup;
mod depth;
mod domain;

pub use dedup::DedupVisitor;
pub use depth::DepthVisitor;
pub use domain::DomainVisitor;

use crate::page::{FetchedPage, Status};
use crate::url::CrawlUrl;
use std::sync::Arc;

/// Policy consulted by every worker during a crawl
///
/// Implementations are shared across all workers and must be safe to call concurrently.
pub trait PageVisitor: Send + Sync {
    /// Decides whether a discovered link becomes a new fetch
    fn follow_url(&self, url: &CrawlUrl) -> bool;

    /// Called once for every successfully fetched page
    fn on_visit(&self, page: &FetchedPage);

    /// Called for every fetch that ended in an error status
    fn on_error(&self, url: &CrawlUrl, status: Status);
}

impl<V: PageVisitor + ?Sized> PageVisitor for Box<V> {
    fn follow_url(&self, url: &CrawlUrl) -> bool {
        (**self).follow_url(url)
    }

    fn on_visit(&self, page: &FetchedPage) {
        (**self).on_visit(page)
    }

    fn on_error(&self, url: &CrawlUrl, status: Status) {
        (**self).on_error(url, status)
    }
}

impl<V: PageVisitor + ?Sized> PageVisitor for Arc<V> {
    fn follow_url(&self, url: &CrawlUrl) -> bool {
        (**self).follow_url(url)
    }

    fn on_visit(&self, page: &FetchedPage) {
        (**self).on_visit(page)
    }

    fn on_error(&self, url: &CrawlUrl, status: Status) {
        (**self).on_error(url, status)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Stub innermost visitor that records every call it receives
    pub struct StubVisitor {
        follow: bool,
        pub followed: Mutex<Vec<CrawlUrl>>,
        pub visited: Mutex<Vec<String>>,
        pub errors: Mutex<Vec<(String, Status)>>,
    }

    impl StubVisitor {
        pub fn accepting() -> Self {
            Self::new(true)
        }

        pub fn rejecting() -> Self {
            Self::new(false)
        }

        fn new(follow: bool) -> Self {
            Self {
                follow,
                followed: Mutex::new(Vec::new()),
                visited: Mutex::new(Vec::new()),
                errors: Mutex::new(Vec::new()),
            }
        }

        pub fn follow_calls(&self) -> usize {
            self.followed.lock().len()
        }
    }

    impl PageVisitor for StubVisitor {
        fn follow_url(&self, url: &CrawlUrl) -> bool {
            self.followed.lock().push(url.clone());
            self.follow
        }

        fn on_visit(&self, page: &FetchedPage) {
            self.visited.lock().push(page.url().to_string());
        }

        fn on_error(&self, url: &CrawlUrl, status: Status) {
            self.errors.lock().push((url.link().to_string(), status));
        }
    }
}
