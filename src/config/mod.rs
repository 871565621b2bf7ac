//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and building configurations in code for library use.
//!
//! # Example
//!
//! ```no_run
//! use page_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Dispatch delay: {}ms", config.crawler.request_delay);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CookieEntry, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::{validate, validate_start_url};
