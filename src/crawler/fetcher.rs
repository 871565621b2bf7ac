//! HTTP downloader
//!
//! This module turns a link into a `FetchedPage`:
//! - Building the HTTP client with user agent, timeouts and pre-seeded cookies
//! - Classifying transport failures and status codes into error pages
//! - Gating on the response's Content-Type
//! - Decoding the body to text, detecting its charset when the headers do not declare one

use crate::config::{Config, CookieEntry};
use crate::page::{FetchedPage, Status};
use crate::{ConfigError, CrawlerError};
use async_trait::async_trait;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use reqwest::cookie::Jar;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How much of the body is searched for a `<meta>` charset declaration
const META_SCAN_LIMIT: usize = 1024;

/// Retrieves pages for the crawler
///
/// Implementations classify every outcome they can into a `FetchedPage`
/// (`Error` for non-2xx and transport failures, `RejectedMimeType` for
/// unwanted content). An `Err` means the fetch failed in a way the
/// implementation could not classify; the task for that link is abandoned.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, link: &str) -> Result<FetchedPage, CrawlerError>;
}

/// `Downloader` backed by a reqwest client
pub struct HttpDownloader {
    client: Client,
    accepted_mime_types: Vec<String>,
}

impl HttpDownloader {
    /// Builds the client from `config` (see `build_http_client`)
    pub fn new(config: &Config) -> Result<Self, CrawlerError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(
            client,
            config.crawler.accepted_mime_types.clone(),
        ))
    }

    /// Uses an already configured client
    pub fn with_client(client: Client, accepted_mime_types: Vec<String>) -> Self {
        let accepted_mime_types = accepted_mime_types
            .into_iter()
            .map(|mime| mime.trim().to_ascii_lowercase())
            .collect();
        Self {
            client,
            accepted_mime_types,
        }
    }

    /// Returns true if `content_type` contains one of the accepted mime types
    pub fn accepts(&self, content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        self.accepted_mime_types
            .iter()
            .any(|mime| content_type.contains(mime.as_str()))
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    /// Fetches `link` with a single GET request
    ///
    /// # Classification
    ///
    /// | Outcome | Result |
    /// |---------|--------|
    /// | Request timed out | `Error { Timeout }` |
    /// | Connection failed | `Error { Unreachable }` |
    /// | Non-2xx status | `Error { status }` |
    /// | Content-Type missing or not accepted | `RejectedMimeType` |
    /// | Otherwise | `Ok` with the decoded body |
    ///
    /// Any other request failure, or a failure while reading the body, is
    /// returned as `CrawlerError::Http`.
    async fn fetch(&self, link: &str) -> Result<FetchedPage, CrawlerError> {
        let response = match self.client.get(link).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::debug!("Request to {} timed out", link);
                return Ok(FetchedPage::error(link, Status::Timeout));
            }
            Err(e) if e.is_connect() => {
                tracing::debug!("Could not connect to {}: {}", link, e);
                return Ok(FetchedPage::error(link, Status::Unreachable));
            }
            Err(source) => {
                return Err(CrawlerError::Http {
                    url: link.to_string(),
                    source,
                })
            }
        };

        let status = Status::from_http_code(response.status().as_u16());
        if !response.status().is_success() {
            tracing::debug!("{} returned {}", link, status);
            return Ok(FetchedPage::error(link, status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !self.accepts(&content_type) {
            return Ok(FetchedPage::rejected(link, status, content_type));
        }

        let body = response.bytes().await.map_err(|source| CrawlerError::Http {
            url: link.to_string(),
            source,
        })?;

        Ok(FetchedPage::ok(link, decode_body(&body, &content_type)))
    }
}

/// Decodes a response body to text
///
/// The encoding is taken from, in order: a byte order mark, the `charset`
/// parameter of `content_type`, a `<meta>` declaration near the start of the
/// body, and finally a statistical guess over the whole body. Undecodable
/// sequences become U+FFFD.
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    let encoding = detect_encoding(body, content_type);
    let (text, actual, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::trace!("Body was not valid {}; replaced bad sequences", actual.name());
    }
    text.into_owned()
}

fn detect_encoding(body: &[u8], content_type: &str) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }
    if let Some(encoding) =
        charset_param(content_type).and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }
    if let Some(encoding) = meta_charset(body) {
        return encoding;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(None, true)
}

/// Value of the `charset` parameter of a Content-Type header
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|value| !value.is_empty())
    })
}

/// Encoding named by `<meta charset=..>` or `<meta http-equiv content="..; charset=..">`
fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SCAN_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.match_indices("<meta").find_map(|(start, _)| {
        let tag = &head[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        let value = &tag[tag.find("charset")? + "charset".len()..];
        let value = value.trim_start().strip_prefix('=')?.trim_start();
        let label: String = value
            .trim_start_matches(|c| c == '"' || c == '\'')
            .chars()
            .take_while(|&c| !matches!(c, '"' | '\'' | ';' | '/' | '>') && !c.is_whitespace())
            .collect();

        // A document that can be scanned as ASCII is not UTF-16, whatever it claims
        match Encoding::for_label(label.as_bytes())? {
            encoding if encoding == UTF_16LE || encoding == UTF_16BE => Some(UTF_8),
            encoding => Some(encoding),
        }
    })
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent, request timeout, cookies)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CrawlerError)` - A cookie domain could not be turned into a URL, or
///   the client could not be built
///
/// # Example
///
/// ```no_run
/// use page_crawler::config::{Config, CookieEntry};
/// use page_crawler::crawler::build_http_client;
///
/// let config = Config::for_start_point("http://example.com")
///     .with_cookie(CookieEntry::new("session", "abc", "example.com"));
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, CrawlerError> {
    let jar = Arc::new(Jar::default());
    for cookie in &config.cookies {
        jar.add_cookie_str(&cookie.to_set_cookie(), &cookie_origin(cookie)?);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout_duration())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .cookie_provider(jar)
        .build()?;

    Ok(client)
}

/// URL the cookie is stored under in the jar
fn cookie_origin(cookie: &CookieEntry) -> Result<Url, ConfigError> {
    let host = cookie.domain.trim_start_matches('.');
    Url::parse(&format!("http://{}{}", host, cookie.path)).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "cookie '{}' has unusable domain '{}': {}",
            cookie.name, cookie.domain, e
        ))
    })
}
