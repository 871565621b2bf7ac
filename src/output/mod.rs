//! Output module for recording and reporting crawl results
//!
//! This module handles:
//! - Recording visits, followed links and errors while a crawl runs
//! - Printing crawl statistics once it is done

pub mod stats;

pub use stats::{print_statistics, CrawlStatistics, RecordingVisitor};
