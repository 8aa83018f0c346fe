//! Store module for persisting book records with change tracking
//!
//! This module handles all database operations for the scraper, including:
//! - SQLite database initialization and schema management
//! - Change-aware book upserts keyed by (title, category)
//! - The append-only change event log
//! - Filtered, sorted, paginated read queries for the API layer

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{Store, StoreError, StoreResult};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A book record as extracted from a detail page
///
/// This is the write model: the extractor produces it and the store
/// persists it, keyed by (title, category).
#[derive(Debug, Clone, Serialize)]
pub struct BookRecord {
    pub title: String,
    pub category: String,
    pub cover_url: String,
    /// Star rating 1-5; None when the page carries no recognizable rating
    pub rating: Option<u8>,
    pub description: Option<String>,
    /// Ordered label/value pairs from the detail page attribute table
    pub attributes: Vec<(String, String)>,
    /// Price derived from the "Price (excl. tax)" attribute; 0.0 when unparseable
    pub price: f64,
    /// Review count derived from the "Number of reviews" attribute
    pub review_count: u32,
    pub scraped_at: DateTime<Utc>,
}

/// A book as returned by the read contracts, with its storage-assigned id
#[derive(Debug, Clone, Serialize)]
pub struct StoredBook {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub cover_url: String,
    pub rating: Option<u8>,
    pub description: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub price: f64,
    pub review_count: u32,
    pub scraped_at: DateTime<Utc>,
}

/// An immutable record of a detected difference between crawl passes
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub kind: ChangeKind,
    pub previous_price: Option<f64>,
    pub new_price: Option<f64>,
    pub occurred_at: DateTime<Utc>,
}

/// Kind of change detected during an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    NewBook,
    PriceChange,
}

impl ChangeKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::NewBook => "new_book",
            Self::PriceChange => "price_change",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "new_book" => Some(Self::NewBook),
            "price_change" => Some(Self::PriceChange),
            _ => None,
        }
    }
}

/// Result of a single change-aware upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// True when no record existed for the key and one was created
    pub inserted: bool,
    /// True when a prior record existed and its price differed
    pub changed: bool,
}

/// Result of a batch upsert; per-record failures are counted, never raised
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOutcome {
    pub inserted: u32,
    pub updated: u32,
    pub errors: u32,
    pub total: u32,
}

/// Sort key for book list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Price,
    Rating,
    ReviewCount,
}

impl SortKey {
    /// ORDER BY clause for this key, tie-broken by the natural key so
    /// pagination is deterministic
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            Self::Title => "title ASC, category ASC",
            Self::Price => "price ASC, title ASC, category ASC",
            Self::Rating => "rating DESC, title ASC, category ASC",
            Self::ReviewCount => "review_count DESC, title ASC, category ASC",
        }
    }
}

/// Filter and pagination parameters for book list queries
#[derive(Debug, Clone)]
pub struct BookQuery {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Lower bound: a value of 4 means "4 stars or better"
    pub min_rating: Option<u8>,
    pub sort: SortKey,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            category: None,
            min_price: None,
            max_price: None,
            min_rating: None,
            sort: SortKey::Title,
            page: 1,
            page_size: 20,
        }
    }
}
