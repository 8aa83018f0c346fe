//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates a whole run:
//! - Discovering categories from the catalog root
//! - Fanning categories out as concurrent tasks
//! - Walking each category's pagination chain
//! - Fetching and parsing book detail pages
//! - Persisting each page's records as one batch
//!
//! A run is deliberately failure-tolerant: individual fetch or parse
//! failures are logged and skipped, a dead listing page only ends that
//! category's pagination, and an unreachable catalog root produces an
//! empty successful summary. The only way to observe the difference
//! between "empty catalog" and "root was down" is the error log.

use crate::config::Config;
use crate::crawler::extractor::{
    extract_book_detail, extract_book_links, extract_category_links, extract_next_page_link,
};
use crate::crawler::Fetcher;
use crate::store::{BookRecord, SqliteStore, Store};
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Summary of a completed crawl run
///
/// Serializable so callers can hand it straight to an API response or a
/// log sink.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    /// Always "success"; a crawl degrades rather than fails
    pub status: String,
    /// Number of successfully parsed book records across all categories
    pub total_books: u64,
    /// Wall-clock duration from the root fetch to final aggregation
    pub duration_seconds: f64,
    /// When the run finished
    pub scraped_at: DateTime<Utc>,
    /// Whether records were written to the store
    pub persisted: bool,
}

/// Main crawler structure
///
/// Holds the shared fetcher and the store handle that category tasks
/// clone. Construction validates the catalog root URL and builds the
/// HTTP client; everything after that is infallible.
pub struct Crawler {
    base_url: Url,
    fetcher: Fetcher,
    store: Arc<Mutex<SqliteStore>>,
}

impl Crawler {
    /// Creates a new crawler instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - Shared store handle for persisting records
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(ScrapeError)` - Invalid base URL or HTTP client build failure
    pub fn new(config: &Config, store: Arc<Mutex<SqliteStore>>) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.crawler.base_url)?;
        let fetcher = Fetcher::new(&config.crawler)?;

        Ok(Self {
            base_url,
            fetcher,
            store,
        })
    }

    /// Runs a full crawl and returns its summary
    ///
    /// Fetches the catalog root, spawns one task per category, and waits
    /// for all of them. Every category task walks its pagination chain and
    /// scrapes each listing page's books concurrently; with `persist` set,
    /// each page's records are written as one batch as soon as the page
    /// completes, so an interrupted run keeps everything scraped so far.
    ///
    /// This method never fails: whatever goes wrong is logged, skipped,
    /// and reflected only in the book count.
    ///
    /// # Arguments
    ///
    /// * `persist` - Whether to write scraped records to the store
    pub async fn run(&self, persist: bool) -> CrawlSummary {
        let start_time = Instant::now();
        tracing::info!("Starting crawl of {}", self.base_url);

        let categories = match self.fetcher.fetch(&self.base_url).await {
            Ok(body) => extract_category_links(&body, &self.base_url),
            Err(e) => {
                // The run still reports success; the log line is the only
                // signal that the root was unreachable
                tracing::error!("Failed to fetch catalog root {}: {}", self.base_url, e);
                Vec::new()
            }
        };
        tracing::info!("Found {} categories", categories.len());

        let mut tasks = JoinSet::new();
        for category_url in categories {
            let fetcher = self.fetcher.clone();
            let store = if persist {
                Some(Arc::clone(&self.store))
            } else {
                None
            };
            tasks.spawn(scrape_category(fetcher, category_url, store));
        }

        let mut total_books: u64 = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(count) => total_books += count,
                Err(e) => tracing::warn!("Category task failed: {}", e),
            }
        }

        let duration_seconds = start_time.elapsed().as_secs_f64();
        tracing::info!(
            "Crawl complete: {} books in {:.2}s",
            total_books,
            duration_seconds
        );

        CrawlSummary {
            status: "success".to_string(),
            total_books,
            duration_seconds,
            scraped_at: Utc::now(),
            persisted: persist,
        }
    }
}

/// Scrapes one category end to end, following its pagination chain
///
/// Each listing page is fetched exactly once; book links and the
/// next-page link both come out of that single body. A page that fails
/// to fetch ends the chain, since without its body there is no next
/// link to follow. Returns the number of successfully parsed books.
async fn scrape_category(
    fetcher: Fetcher,
    category_url: Url,
    store: Option<Arc<Mutex<SqliteStore>>>,
) -> u64 {
    let mut total: u64 = 0;
    let mut page_number: u32 = 1;
    let mut current_url = Some(category_url);

    while let Some(page_url) = current_url {
        tracing::debug!("Scraping listing page {}: {}", page_number, page_url);

        let body = match fetcher.fetch(&page_url).await {
            Ok(body) => body,
            Err(_) => break,
        };

        let book_links = extract_book_links(&body, &page_url);
        let next_url = extract_next_page_link(&body, &page_url);

        let books = scrape_page_books(&fetcher, book_links).await;
        total += books.len() as u64;

        if let Some(store) = &store {
            if !books.is_empty() {
                let outcome = {
                    let mut store = store.lock().unwrap();
                    store.upsert_batch(&books)
                };
                tracing::info!(
                    "Saved {} new, updated {} books ({})",
                    outcome.inserted,
                    outcome.updated,
                    page_url
                );
                if outcome.errors > 0 {
                    tracing::warn!(
                        "{} records failed to persist ({})",
                        outcome.errors,
                        page_url
                    );
                }
            }
        }

        current_url = next_url;
        page_number += 1;
    }

    total
}

/// Fetches and parses every book detail linked from one listing page
///
/// Detail pages are scraped concurrently; the fetcher's shared permit
/// pool keeps the run-wide cap intact. Fetch failures are already logged
/// by the fetcher, so only parse failures are logged here. Failed books
/// are skipped, never retried.
async fn scrape_page_books(fetcher: &Fetcher, book_links: Vec<Url>) -> Vec<BookRecord> {
    let mut tasks = JoinSet::new();

    for link in book_links {
        let fetcher = fetcher.clone();
        tasks.spawn(async move {
            let body = match fetcher.fetch(&link).await {
                Ok(body) => body,
                Err(_) => return None,
            };

            match extract_book_detail(&body, &link) {
                Ok(book) => Some(book),
                Err(e) => {
                    tracing::warn!("Failed to parse book detail {}: {}", link, e);
                    None
                }
            }
        });
    }

    let mut books = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(book)) => books.push(book),
            Ok(None) => {}
            Err(e) => tracing::warn!("Book detail task failed: {}", e),
        }
    }

    books
}

/// Runs a full crawl against the configured catalog
///
/// Convenience wrapper that builds a [`Crawler`] and runs it once.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - Shared store handle for persisting records
/// * `persist` - Whether to write scraped records to the store
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The run summary
/// * `Err(ScrapeError)` - Invalid base URL or HTTP client build failure
///
/// # Example
///
/// ```no_run
/// use shelfwatch::config::load_config;
/// use shelfwatch::crawler::run_crawl;
/// use shelfwatch::store::SqliteStore;
/// use std::path::Path;
/// use std::sync::{Arc, Mutex};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let store = SqliteStore::new(Path::new(&config.store.database_path))?;
/// let summary = run_crawl(&config, Arc::new(Mutex::new(store)), true).await?;
/// println!("{} books", summary.total_books);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    store: Arc<Mutex<SqliteStore>>,
    persist: bool,
) -> Result<CrawlSummary, ScrapeError> {
    let crawler = Crawler::new(config, store)?;
    Ok(crawler.run(persist).await)
}
