use crate::{UrlError, UrlResult};
use url::Url;

/// Turns raw link strings found in a page into absolute links
pub trait LinkNormalizer: Send + Sync {
    fn normalize(&self, raw_link: &str) -> UrlResult<String>;
}

/// Resolves links against the crawl's base URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Decode HTML entities (`&amp;` becomes `&`)
/// 3. Absolute http(s) links are returned unchanged
/// 4. Absolute links with any other scheme are rejected
/// 5. Relative links are resolved against the base URL
///
/// # Examples
///
/// ```
/// use page_crawler::url::{DefaultLinkNormalizer, LinkNormalizer};
///
/// let normalizer = DefaultLinkNormalizer::new("http://example.com/docs/").unwrap();
/// assert_eq!(normalizer.normalize("intro.html").unwrap(), "http://example.com/docs/intro.html");
/// assert_eq!(normalizer.normalize("/a?x=1&amp;y=2").unwrap(), "http://example.com/a?x=1&y=2");
/// assert_eq!(normalizer.normalize("http://other.com").unwrap(), "http://other.com");
/// ```
#[derive(Debug, Clone)]
pub struct DefaultLinkNormalizer {
    base: Url,
}

impl DefaultLinkNormalizer {
    pub fn new(base_url: &str) -> UrlResult<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Parse("base URL cannot be empty".to_string()));
        }

        let base = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(UrlError::Malformed(format!(
                "'{}' cannot be used to resolve relative links",
                trimmed
            )));
        }

        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl LinkNormalizer for DefaultLinkNormalizer {
    fn normalize(&self, raw_link: &str) -> UrlResult<String> {
        let decoded = html_escape::decode_html_entities(raw_link.trim());

        match Url::parse(&decoded) {
            Ok(absolute) => {
                if absolute.scheme() != "http" && absolute.scheme() != "https" {
                    return Err(UrlError::InvalidScheme(format!(
                        "Only HTTP and HTTPS links are followed, got: {}",
                        absolute.scheme()
                    )));
                }
                Ok(decoded.into_owned())
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(&decoded)
                .map(|resolved| resolved.to_string())
                .map_err(|e| UrlError::Parse(format!("{}: {}", decoded, e))),
            Err(e) => Err(UrlError::Parse(format!("{}: {}", decoded, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> DefaultLinkNormalizer {
        DefaultLinkNormalizer::new("http://test.com/dir/index.html").unwrap()
    }

    #[test]
    fn test_rejects_empty_base() {
        assert!(DefaultLinkNormalizer::new("").is_err());
        assert!(DefaultLinkNormalizer::new("   \n  ").is_err());
        assert!(DefaultLinkNormalizer::new("not a url").is_err());
        assert!(DefaultLinkNormalizer::new("mailto:someone@test.com").is_err());
    }

    #[test]
    fn test_absolute_link_is_unchanged() {
        let n = normalizer();
        assert_eq!(n.normalize("http://test.com").unwrap(), "http://test.com");
        assert_eq!(
            n.normalize("https://other.com/a/b?c=d").unwrap(),
            "https://other.com/a/b?c=d"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        let once = n.normalize("../up/page.html").unwrap();
        let twice = n.normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unescapes_entities() {
        let n = normalizer();
        assert_eq!(
            n.normalize("http://test.com/search?a=1&amp;b=2").unwrap(),
            "http://test.com/search?a=1&b=2"
        );
    }

    #[test]
    fn test_resolves_root_relative() {
        let n = normalizer();
        assert_eq!(n.normalize("/other").unwrap(), "http://test.com/other");
    }

    #[test]
    fn test_resolves_path_relative() {
        let n = normalizer();
        assert_eq!(n.normalize("page2").unwrap(), "http://test.com/dir/page2");
        assert_eq!(
            n.normalize("test.page2;jsessionid=20").unwrap(),
            "http://test.com/dir/test.page2;jsessionid=20"
        );
    }

    #[test]
    fn test_trims_whitespace() {
        let n = normalizer();
        assert_eq!(n.normalize("  /spaced  ").unwrap(), "http://test.com/spaced");
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let n = normalizer();
        assert!(matches!(
            n.normalize("mailto:test@test.com"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            n.normalize("javascript:void(0)"),
            Err(UrlError::InvalidScheme(_))
        ));
    }
}
