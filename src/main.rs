//! Shelfwatch main entry point
//!
//! This is the command-line interface for the Shelfwatch catalog scraper.

use anyhow::Context;
use clap::Parser;
use shelfwatch::config::load_config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shelfwatch: a change-tracking book catalog scraper
///
/// Shelfwatch crawls a paginated book catalog category by category,
/// extracts structured book records, and persists them to SQLite while
/// recording new books and price changes as immutable change events.
#[derive(Parser, Debug)]
#[command(name = "shelfwatch")]
#[command(version = "1.0.0")]
#[command(about = "A change-tracking book catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl without writing records to the database
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "changes"])]
    no_persist: bool,

    /// Validate config and show what would be crawled without fetching
    #[arg(long, conflicts_with_all = ["no_persist", "stats", "changes"])]
    dry_run: bool,

    /// Show catalog statistics from the database and exit
    #[arg(long, conflicts_with_all = ["no_persist", "dry_run", "changes"])]
    stats: bool,

    /// Show the N most recent change events and exit
    #[arg(long, value_name = "N", conflicts_with_all = ["no_persist", "dry_run", "stats"])]
    changes: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(limit) = cli.changes {
        handle_changes(&config, limit)?;
    } else {
        handle_crawl(&config, !cli.no_persist).await?;
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
            0 => EnvFilter::new("shelfwatch=info,warn"),
            1 => EnvFilter::new("shelfwatch=debug,info"),
            2 => EnvFilter::new("shelfwatch=trace,debug"),
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

/// Opens the configured SQLite database
fn open_store(config: &shelfwatch::config::Config) -> anyhow::Result<shelfwatch::SqliteStore> {
    use std::path::Path;

    shelfwatch::SqliteStore::new(Path::new(&config.store.database_path))
        .with_context(|| format!("failed to open database at {}", config.store.database_path))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &shelfwatch::config::Config) {
    println!("=== Shelfwatch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Catalog root: {}", config.crawler.base_url);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {}", config.crawler.base_url);
}

/// Handles the --stats mode: shows catalog statistics from the database
fn handle_stats(config: &shelfwatch::config::Config) -> anyhow::Result<()> {
    use shelfwatch::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.store.database_path);

    let store = open_store(config)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --changes mode: shows the most recent change events
fn handle_changes(config: &shelfwatch::config::Config, limit: u32) -> anyhow::Result<()> {
    use shelfwatch::{ChangeKind, Store};

    let store = open_store(config)?;
    let events = store.recent_changes(None, limit)?;

    if events.is_empty() {
        println!("No change events recorded");
        return Ok(());
    }

    println!("=== Recent Changes ({}) ===\n", events.len());
    for event in &events {
        let occurred = event.occurred_at.format("%Y-%m-%d %H:%M:%S");
        match event.kind {
            ChangeKind::NewBook => {
                println!(
                    "{}  new book      {} ({:.2})",
                    occurred,
                    event.book_title,
                    event.new_price.unwrap_or(0.0)
                );
            }
            ChangeKind::PriceChange => {
                println!(
                    "{}  price change  {} ({:.2} -> {:.2})",
                    occurred,
                    event.book_title,
                    event.previous_price.unwrap_or(0.0),
                    event.new_price.unwrap_or(0.0)
                );
            }
        }
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &shelfwatch::config::Config, persist: bool) -> anyhow::Result<()> {
    use shelfwatch::run_crawl;
    use std::sync::{Arc, Mutex};

    if !persist {
        tracing::info!("Records will not be persisted");
    }

    let store = Arc::new(Mutex::new(open_store(config)?));
    let summary = run_crawl(config, store, persist).await?;

    println!(
        "✓ Crawl finished: {} books in {:.1}s{}",
        summary.total_books,
        summary.duration_seconds,
        if summary.persisted {
            ""
        } else {
            " (not persisted)"
        }
    );

    Ok(())
}
