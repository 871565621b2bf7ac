use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase host of a URL, if it has one
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the `scheme://host[:port]/` prefix every same-origin link starts with
///
/// # Arguments
///
/// * `base_url` - An absolute http(s) URL
///
/// # Returns
///
/// * `Ok(String)` - The origin prefix, always ending in `/`
/// * `Err(UrlError)` - The base URL is blank, unparsable, not http(s), or has no host
///
/// # Examples
///
/// ```
/// use page_crawler::url::origin_prefix;
///
/// assert_eq!(origin_prefix("http://a.com/some/page").unwrap(), "http://a.com/");
/// assert_eq!(origin_prefix("http://localhost:8080").unwrap(), "http://localhost:8080/");
/// assert!(origin_prefix("htp://any.thing").is_err());
/// ```
pub fn origin_prefix(base_url: &str) -> UrlResult<String> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("base URL cannot be empty".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = extract_domain(&url).ok_or(UrlError::MissingDomain)?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_prefix_drops_path_and_query() {
        assert_eq!(
            origin_prefix("http://a.com/x/y?z=1#frag").unwrap(),
            "http://a.com/"
        );
    }

    #[test]
    fn test_prefix_keeps_scheme_and_port() {
        assert_eq!(origin_prefix("https://a.com").unwrap(), "https://a.com/");
        assert_eq!(
            origin_prefix("http://127.0.0.1:3000/start").unwrap(),
            "http://127.0.0.1:3000/"
        );
    }

    #[test]
    fn test_prefix_omits_default_port() {
        assert_eq!(origin_prefix("http://a.com:80/").unwrap(), "http://a.com/");
    }

    #[test]
    fn test_prefix_lowercases_host() {
        assert_eq!(origin_prefix("http://A.COM/Path").unwrap(), "http://a.com/");
    }

    #[test]
    fn test_prefix_rejects_bad_input() {
        assert!(origin_prefix("").is_err());
        assert!(origin_prefix("  \n   \t  ").is_err());
        assert!(matches!(
            origin_prefix("htp://any.thing"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(origin_prefix("no-scheme.com").is_err());
    }
}
