use crate::page::{FetchedPage, Status};
use crate::url::{origin_prefix, CrawlUrl};
use crate::visitor::PageVisitor;
use crate::CrawlerError;

/// Only follows links that start with the base URL's `scheme://host[:port]/` prefix
pub struct DomainVisitor<V> {
    prefix: String,
    inner: V,
}

impl<V: PageVisitor> DomainVisitor<V> {
    /// Fails with `CrawlerError::InvalidArgument` when `base_url` is blank or not
    /// an absolute http(s) URL
    pub fn new(base_url: &str, inner: V) -> Result<Self, CrawlerError> {
        let prefix = origin_prefix(base_url).map_err(|e| {
            CrawlerError::InvalidArgument(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        Ok(Self { prefix, inner })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<V: PageVisitor> PageVisitor for DomainVisitor<V> {
    fn follow_url(&self, url: &CrawlUrl) -> bool {
        if !url.link().starts_with(&self.prefix) {
            tracing::trace!("{} is outside {}", url.link(), self.prefix);
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

    #[test]
    fn test_rejects_blank_base_url() {
        assert!(matches!(
            DomainVisitor::new("", StubVisitor::accepting()),
            Err(CrawlerError::InvalidArgument(_))
        ));
        assert!(matches!(
            DomainVisitor::new("  \n   \t  ", StubVisitor::accepting()),
            Err(CrawlerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_base_url_without_http_scheme() {
        assert!(matches!(
            DomainVisitor::new("htp://any.thing", StubVisitor::accepting()),
            Err(CrawlerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_follows_only_same_origin() {
        let visitor = DomainVisitor::new("http://a.com", StubVisitor::accepting()).unwrap();
        assert_eq!(visitor.prefix(), "http://a.com/");

        assert!(!visitor.follow_url(&CrawlUrl::new("http://b.com/x", 1)));
        assert!(visitor.follow_url(&CrawlUrl::new("http://a.com/y", 1)));
        assert_eq!(visitor.inner.follow_calls(), 1);
    }

    #[test]
    fn test_prefix_is_not_fooled_by_lookalike_hosts() {
        let visitor = DomainVisitor::new("http://a.com", StubVisitor::accepting()).unwrap();

        assert!(!visitor.follow_url(&CrawlUrl::new("http://a.com.evil.net/", 1)));
        assert!(!visitor.follow_url(&CrawlUrl::new("https://a.com/y", 1)));
    }

    #[test]
    fn test_delegates_decision_to_inner() {
        let visitor = DomainVisitor::new("http://a.com", StubVisitor::rejecting()).unwrap();

        assert!(!visitor.follow_url(&CrawlUrl::new("http://a.com/y", 1)));
        assert_eq!(visitor.inner.follow_calls(), 1);
    }

    #[test]
    fn test_reporting_is_not_filtered() {
        let visitor = DomainVisitor::new("http://a.com", StubVisitor::accepting()).unwrap();

        visitor.on_visit(&FetchedPage::ok("http://b.com/x", ""));
        visitor.on_error(&CrawlUrl::new("http://b.com/y", 1), Status::Forbidden);

        assert_eq!(visitor.inner.visited.lock().len(), 1);
        assert_eq!(visitor.inner.errors.lock().len(), 1);
    }
}
