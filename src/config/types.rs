use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "cookie", default)]
    pub cookies: Vec<CookieEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Absolute http(s) URL the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Number of workers kept alive for the whole crawl
    #[serde(rename = "min-pool-size", default = "default_min_pool_size")]
    pub min_pool_size: usize,

    /// Upper bound on concurrently running workers
    #[serde(rename = "max-pool-size", default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// How long a worker above the minimum may sit idle before exiting (milliseconds)
    #[serde(rename = "keep-alive", default = "default_keep_alive")]
    pub keep_alive: u64,

    /// Minimum time between two dispatches, across all workers (milliseconds)
    #[serde(rename = "request-delay", default)]
    pub request_delay: u64,

    /// Per-request timeout applied by the HTTP downloader (milliseconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Content types whose pages are visited; anything else is dropped silently
    #[serde(rename = "accepted-mime-types", default = "default_mime_types")]
    pub accepted_mime_types: Vec<String>,

    /// Deepest link hop that is still followed (unbounded when absent)
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    /// Only follow links that stay on the start URL's origin
    #[serde(rename = "restrict-to-domain", default = "default_true")]
    pub restrict_to_domain: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,
}

/// A cookie sent with every request to its domain
#[derive(Debug, Clone, Deserialize)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

fn default_min_pool_size() -> usize {
    4
}

fn default_max_pool_size() -> usize {
    10
}

fn default_keep_alive() -> u64 {
    60_000
}

fn default_request_timeout() -> u64 {
    15_000
}

fn default_mime_types() -> Vec<String> {
    vec!["text/html".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_crawler_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `name/version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl CookieEntry {
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: default_cookie_path(),
        }
    }

    /// Renders the entry as a `Set-Cookie` style string for the cookie jar
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}={}; Domain={}; Path={}",
            self.name, self.value, self.domain, self.path
        )
    }
}

impl Config {
    /// Builds a configuration for `start_url` with every other setting at its default
    ///
    /// # Example
    ///
    /// ```
    /// use page_crawler::config::Config;
    ///
    /// let config = Config::for_start_point("http://example.com")
    ///     .with_pool_size(2, 8)
    ///     .with_request_delay(250);
    /// assert_eq!(config.crawler.max_pool_size, 8);
    /// assert_eq!(config.crawler.request_delay, 250);
    /// ```
    pub fn for_start_point(start_url: &str) -> Self {
        Self {
            crawler: CrawlerConfig {
                start_url: start_url.to_string(),
                min_pool_size: default_min_pool_size(),
                max_pool_size: default_max_pool_size(),
                keep_alive: default_keep_alive(),
                request_delay: 0,
                request_timeout: default_request_timeout(),
                accepted_mime_types: default_mime_types(),
                max_depth: None,
                restrict_to_domain: default_true(),
            },
            user_agent: UserAgentConfig::default(),
            cookies: Vec::new(),
        }
    }

    pub fn with_pool_size(mut self, min: usize, max: usize) -> Self {
        self.crawler.min_pool_size = min;
        self.crawler.max_pool_size = max;
        self
    }

    pub fn with_keep_alive(mut self, millis: u64) -> Self {
        self.crawler.keep_alive = millis;
        self
    }

    pub fn with_request_delay(mut self, millis: u64) -> Self {
        self.crawler.request_delay = millis;
        self
    }

    pub fn with_request_timeout(mut self, millis: u64) -> Self {
        self.crawler.request_timeout = millis;
        self
    }

    pub fn with_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.crawler.accepted_mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cookie(mut self, cookie: CookieEntry) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.crawler.max_depth = Some(max_depth);
        self
    }

    pub fn with_domain_restriction(mut self, restrict: bool) -> Self {
        self.crawler.restrict_to_domain = restrict;
        self
    }
}

impl CrawlerConfig {
    pub fn keep_alive_duration(&self) -> Duration {
        Duration::from_millis(self.keep_alive)
    }

    pub fn request_delay_duration(&self) -> Duration {
        Duration::from_millis(self.request_delay)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}
