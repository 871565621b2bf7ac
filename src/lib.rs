//! Page-Crawler: a rate-limited recursive web crawler
//!
//! Starting from a single URL, every fetched page may fan out into any number of
//! child fetches. Children are dispatched onto a bounded worker pool through a
//! globally throttled queue, filtered by a composable visitor chain, and tracked
//! by an outstanding-work counter that tells the crawler when the traversal has
//! quiesced.

pub mod config;
pub mod crawler;
pub mod output;
pub mod page;
pub mod url;
pub mod visitor;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Worker pool has been shut down")]
    PoolShutdown,

    #[error("Crawl was interrupted before it finished")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, PageCrawler};
pub use page::{FetchedPage, Status};
pub use url::CrawlUrl;
pub use visitor::{DedupVisitor, DepthVisitor, DomainVisitor, PageVisitor};
