//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the store layer.

use crate::store::{ChangeKind, Store};
use crate::ScrapeError;
use chrono::{DateTime, Utc};

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Total number of books stored
    pub total_books: u64,

    /// Book counts per category, largest first
    pub books_by_category: Vec<(String, u64)>,

    /// Average price across all books; None when the catalog is empty
    pub average_price: Option<f64>,

    /// Total number of recorded new-book events
    pub new_book_events: u64,

    /// Total number of recorded price-change events
    pub price_change_events: u64,

    /// Most recent scrape timestamp; None when the catalog is empty
    pub latest_scrape: Option<DateTime<Utc>>,
}

/// Loads statistics from the store
///
/// # Arguments
///
/// * `store` - The store backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(ScrapeError)` - Failed to query statistics
pub fn load_statistics(store: &dyn Store) -> Result<CatalogStatistics, ScrapeError> {
    let total_books = store.count_books()?;
    let books_by_category = store.count_by_category()?;
    let average_price = store.average_price()?;
    let new_book_events = store.count_changes(Some(ChangeKind::NewBook))?;
    let price_change_events = store.count_changes(Some(ChangeKind::PriceChange))?;
    let latest_scrape = store.latest_scrape()?;

    Ok(CatalogStatistics {
        total_books,
        books_by_category,
        average_price,
        new_book_events,
        price_change_events,
        latest_scrape,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total books: {}", stats.total_books);
    match stats.average_price {
        Some(average) => println!("  Average price: {:.2}", average),
        None => println!("  Average price: n/a"),
    }
    match stats.latest_scrape {
        Some(latest) => println!("  Last scraped: {}", latest.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Last scraped: never"),
    }
    println!();

    if !stats.books_by_category.is_empty() {
        println!("Books by Category:");
        for (category, count) in &stats.books_by_category {
            let percentage = if stats.total_books > 0 {
                (*count as f64 / stats.total_books as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    println!("Change Events:");
    println!("  New books: {}", stats.new_book_events);
    println!("  Price changes: {}", stats.price_change_events);
}
