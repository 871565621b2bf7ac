//! HTML link extraction
//!
//! Finds the raw link strings a page points at. Links are returned exactly as
//! written in the document; resolving them is the normalizer's job, and
//! duplicates are left for the dedup visitor.

use scraper::{ElementRef, Html, Selector};

/// Turns page content into raw link strings
pub trait LinkExtractor: Send + Sync {
    /// Raw links in document order, duplicates included
    fn extract(&self, content: &str) -> Vec<String>;
}

const LINK_ELEMENTS: &str = "a[href], iframe[src], iframe[href], frame[src], frame[href]";

/// Schemes that never lead to another page
const SKIPPED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Extracts links from HTML documents
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">`
/// - `<iframe src="...">` (or `href` when there is no `src`)
/// - `<frame src="...">` (or `href` when there is no `src`)
///
/// **Exclude:**
/// - Empty values
/// - Fragment-only links (`#section`)
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
///
/// # Example
///
/// ```
/// use page_crawler::crawler::{HtmlLinkExtractor, LinkExtractor};
///
/// let html = r#"<a href="/page">Link</a><iframe src="frame.html"></iframe>"#;
/// assert_eq!(HtmlLinkExtractor.extract(html), vec!["/page", "frame.html"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, content: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(LINK_ELEMENTS) else {
            return Vec::new();
        };

        let document = Html::parse_document(content);
        document
            .select(&selector)
            .filter_map(link_target)
            .filter(|link| is_followable(link))
            .map(str::to_string)
            .collect()
    }
}

fn link_target(element: ElementRef<'_>) -> Option<&str> {
    let element = element.value();
    match element.name() {
        "a" => element.attr("href"),
        _ => element.attr("src").or_else(|| element.attr("href")),
    }
}

fn is_followable(link: &str) -> bool {
    let link = link.trim();
    if link.is_empty() || link.starts_with('#') {
        return false;
    }

    let lowered = link.to_ascii_lowercase();
    !SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}
