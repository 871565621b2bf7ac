//! Crawl statistics recorded while the crawl runs
//!
//! This module provides the visitor the command-line tool crawls with and
//! the functions for displaying what it recorded.

use crate::crawler::CrawlReport;
use crate::page::{FetchedPage, Status};
use crate::url::CrawlUrl;
use crate::visitor::PageVisitor;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Pages fetched successfully
    pub pages_visited: u64,

    /// Links the visitor agreed to follow
    pub links_followed: u64,

    /// Failed fetches, by status
    pub errors_by_status: HashMap<Status, u64>,

    /// Visited page URLs in the order they were visited
    pub visited: Vec<String>,
}

impl CrawlStatistics {
    pub fn total_errors(&self) -> u64 {
        self.errors_by_status.values().sum()
    }
}

/// Visitor that follows every link it is offered and records what happened
///
/// Visits are logged at info level and errors at warn level. Wrap it in
/// `DomainVisitor`/`DepthVisitor` to limit the crawl; keep an `Arc` to it to
/// read the statistics afterwards.
#[derive(Debug, Default)]
pub struct RecordingVisitor {
    pages_visited: AtomicU64,
    links_followed: AtomicU64,
    errors: Mutex<HashMap<Status, u64>>,
    visited: Mutex<Vec<String>>,
}

impl RecordingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn statistics(&self) -> CrawlStatistics {
        CrawlStatistics {
            pages_visited: self.pages_visited.load(Ordering::Acquire),
            links_followed: self.links_followed.load(Ordering::Acquire),
            errors_by_status: self.errors.lock().clone(),
            visited: self.visited.lock().clone(),
        }
    }
}

impl PageVisitor for RecordingVisitor {
    fn follow_url(&self, url: &CrawlUrl) -> bool {
        self.links_followed.fetch_add(1, Ordering::AcqRel);
        tracing::debug!("Following {}", url);
        true
    }

    fn on_visit(&self, page: &FetchedPage) {
        self.pages_visited.fetch_add(1, Ordering::AcqRel);
        self.visited.lock().push(page.url().to_string());
        tracing::info!("Visited {}", page.url());
    }

    fn on_error(&self, url: &CrawlUrl, status: Status) {
        *self.errors.lock().entry(status).or_insert(0) += 1;
        tracing::warn!("Failed to fetch {}: {}", url, status);
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics recorded by the visitor
/// * `report` - The crawler's own report for the same crawl
pub fn print_statistics(stats: &CrawlStatistics, report: &CrawlReport) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!(
        "  Started: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Links followed: {}", stats.links_followed);
    println!();

    println!("Tasks:");
    println!("  Completed: {}", report.tasks_completed);
    println!("  Failed: {}", report.tasks_failed);
    println!("  Panicked: {}", report.tasks_panicked);
    println!();

    if !stats.errors_by_status.is_empty() {
        println!("Error Summary:");
        // Sort statuses by count (descending)
        let mut error_counts: Vec<_> = stats.errors_by_status.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (status, count) in error_counts {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    let attempted = stats.pages_visited + stats.total_errors();
    let success_rate = if attempted > 0 {
        (stats.pages_visited as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetched pages visited)",
        success_rate, stats.pages_visited, attempted
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_everything() {
        let visitor = RecordingVisitor::new();

        assert!(visitor.follow_url(&CrawlUrl::new("http://test.com/a", 1)));
        assert!(visitor.follow_url(&CrawlUrl::new("http://other.com/", 40)));
        assert_eq!(visitor.statistics().links_followed, 2);
    }

    #[test]
    fn test_records_visits_and_errors() {
        let visitor = RecordingVisitor::new();

        visitor.on_visit(&FetchedPage::ok("http://test.com", "<html></html>"));
        visitor.on_visit(&FetchedPage::ok("http://test.com/a", ""));
        visitor.on_error(&CrawlUrl::new("http://test.com/b", 1), Status::NotFound);
        visitor.on_error(&CrawlUrl::new("http://test.com/c", 1), Status::NotFound);
        visitor.on_error(&CrawlUrl::new("http://test.com/d", 1), Status::Timeout);

        let stats = visitor.statistics();
        assert_eq!(stats.pages_visited, 2);
        assert_eq!(stats.visited, vec!["http://test.com", "http://test.com/a"]);
        assert_eq!(stats.errors_by_status[&Status::NotFound], 2);
        assert_eq!(stats.errors_by_status[&Status::Timeout], 1);
        assert_eq!(stats.total_errors(), 3);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = RecordingVisitor::new().statistics();
        assert_eq!(stats, CrawlStatistics::default());
        assert_eq!(stats.total_errors(), 0);
    }
}
