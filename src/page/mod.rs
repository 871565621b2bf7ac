//! Fetched page model
//!
//! A fetch attempt produces exactly one `FetchedPage` variant:
//!
//! - `Ok`: content is available and links can be extracted from it
//! - `Error`: a non-2xx response or a transport failure; no content
//! - `RejectedMimeType`: the response's content type is not accepted; no content

mod status;

pub use status::Status;

use crate::crawler::LinkExtractor;

/// Result of attempting to retrieve a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedPage {
    Ok {
        url: String,
        content: String,
    },
    Error {
        url: String,
        status: Status,
    },
    RejectedMimeType {
        url: String,
        status: Status,
        mime_type: String,
    },
}

impl FetchedPage {
    pub fn ok(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Ok {
            url: url.into(),
            content: content.into(),
        }
    }

    pub fn error(url: impl Into<String>, status: Status) -> Self {
        Self::Error {
            url: url.into(),
            status,
        }
    }

    pub fn rejected(url: impl Into<String>, status: Status, mime_type: impl Into<String>) -> Self {
        Self::RejectedMimeType {
            url: url.into(),
            status,
            mime_type: mime_type.into(),
        }
    }

    /// The link that was fetched
    pub fn url(&self) -> &str {
        match self {
            Self::Ok { url, .. } | Self::Error { url, .. } | Self::RejectedMimeType { url, .. } => {
                url
            }
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Ok { .. } => Status::Ok,
            Self::Error { status, .. } | Self::RejectedMimeType { status, .. } => *status,
        }
    }

    /// Page content, only present for `Ok` pages
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Ok { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Raw (not yet normalized) links found in the page
    ///
    /// Always empty for `Error` and `RejectedMimeType` pages.
    pub fn links(&self, extractor: &dyn LinkExtractor) -> Vec<String> {
        match self.content() {
            Some(content) => extractor.extract(content),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::HtmlLinkExtractor;

    #[test]
    fn test_ok_page_exposes_content_and_links() {
        let page = FetchedPage::ok(
            "http://test.com",
            r#"<a href="http://link">x</a><a href="/other">y</a>"#,
        );

        assert!(page.is_ok());
        assert_eq!(page.url(), "http://test.com");
        assert_eq!(page.status(), Status::Ok);
        assert_eq!(
            page.links(&HtmlLinkExtractor),
            vec!["http://link".to_string(), "/other".to_string()]
        );
    }

    #[test]
    fn test_error_page_has_no_links() {
        let page = FetchedPage::error("http://test.com/missing", Status::NotFound);

        assert!(!page.is_ok());
        assert_eq!(page.status(), Status::NotFound);
        assert!(page.content().is_none());
        assert!(page.links(&HtmlLinkExtractor).is_empty());
    }

    #[test]
    fn test_rejected_page_has_no_links() {
        let page = FetchedPage::rejected("http://test.com/logo.png", Status::Ok, "image/png");

        assert_eq!(page.url(), "http://test.com/logo.png");
        assert_eq!(page.status(), Status::Ok);
        assert!(page.content().is_none());
        assert!(page.links(&HtmlLinkExtractor).is_empty());
    }
}
