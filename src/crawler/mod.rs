//! Crawler module for recursive, rate-limited page fetching
//!
//! This module contains the core crawling machinery, including:
//! - The rate-limited dispatch queue and the worker pool draining it
//! - The outstanding-work counter that detects the end of a crawl
//! - Fetch tasks, which fetch one URL and submit its accepted children
//! - HTTP downloading and HTML link extraction
//! - Overall crawl orchestration

mod coordinator;
mod counter;
mod fetcher;
mod parser;
mod pool;
mod queue;
mod task;

pub use coordinator::{CrawlPhase, CrawlReport, PageCrawler};
pub use fetcher::{build_http_client, Downloader, HttpDownloader};
pub use parser::{HtmlLinkExtractor, LinkExtractor};
