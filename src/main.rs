//! Page-Crawler main entry point
//!
//! This is the command-line interface for the page-crawler recursive web crawler.

use anyhow::Context;
use clap::Parser;
use page_crawler::config::{load_config_with_hash, Config};
use page_crawler::output::{print_statistics, RecordingVisitor};
use page_crawler::{DepthVisitor, DomainVisitor, PageCrawler, PageVisitor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Page-Crawler: a rate-limited recursive web crawler
///
/// Starting from one URL, page-crawler follows every link it finds, optionally
/// staying on the start URL's origin and within a maximum depth, while never
/// dispatching requests faster than the configured delay allows.
#[derive(Parser, Debug)]
#[command(name = "page-crawler")]
#[command(version)]
#[command(about = "A rate-limited recursive web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "url")]
    config: Option<PathBuf>,

    /// Start URL; overrides the one in the configuration file
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_crawler=info,warn"),
            1 => EnvFilter::new("page_crawler=debug,info"),
            2 => EnvFilter::new("page_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, if any, and applies `--url`
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            // clap guarantees --url when no config file is given
            let url = cli.url.as_deref().unwrap_or_default();
            Config::for_start_point(url.trim())
        }
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = url.trim().to_string();
    }

    page_crawler::config::validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Page-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!(
        "  Pool size: {} - {} workers",
        config.crawler.min_pool_size, config.crawler.max_pool_size
    );
    println!("  Keep alive: {}ms", config.crawler.keep_alive);
    println!("  Request delay: {}ms", config.crawler.request_delay);
    println!("  Request timeout: {}ms", config.crawler.request_timeout);
    println!(
        "  Accepted mime types: {}",
        config.crawler.accepted_mime_types.join(", ")
    );
    match config.crawler.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }
    println!(
        "  Restrict to domain: {}",
        config.crawler.restrict_to_domain
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nCookies ({}):", config.cookies.len());
    for cookie in &config.cookies {
        println!("  - {} ({}{})", cookie.name, cookie.domain, cookie.path);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", config.crawler.start_url);

    Ok(())
}

/// Builds the visitor chain around the recording visitor
///
/// Outermost to innermost: domain restriction, depth limit, recorder.
fn build_visitor(
    config: &Config,
    recorder: Arc<RecordingVisitor>,
) -> anyhow::Result<Box<dyn PageVisitor>> {
    let mut visitor: Box<dyn PageVisitor> = Box::new(recorder);

    if let Some(max_depth) = config.crawler.max_depth {
        tracing::info!("Limiting crawl to depth {}", max_depth);
        visitor = Box::new(DepthVisitor::new(max_depth, visitor));
    }

    if config.crawler.restrict_to_domain {
        let domain = DomainVisitor::new(&config.crawler.start_url, visitor)?;
        tracing::info!("Restricting crawl to {}", domain.prefix());
        visitor = Box::new(domain);
    }

    Ok(visitor)
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let recorder = Arc::new(RecordingVisitor::new());
    let visitor = build_visitor(&config, Arc::clone(&recorder))?;
    let crawler = PageCrawler::new(config)?;

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl-C, stopping crawl");
    };

    // Run the crawler
    match crawler.crawl_until(visitor, interrupt).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_statistics(&recorder.statistics(), &report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
