//! Store traits and error types
//!
//! This module defines the trait interface for store backends and
//! associated error types.

use crate::store::{
    BatchOutcome, BookQuery, BookRecord, ChangeEvent, ChangeKind, StoredBook, UpsertOutcome,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for store backend implementations
///
/// This trait defines all database operations needed by the crawler and
/// the read-side consumers. Implementations should provide thread-safe
/// access to the underlying storage.
pub trait Store {
    // ===== Write Path =====

    /// Inserts or updates a book keyed by (title, category)
    ///
    /// The check-then-write runs atomically. A first sighting records a
    /// `NewBook` change event; a price difference against the stored
    /// record updates the row and records a `PriceChange` event. An
    /// unchanged price still refreshes the stored fields.
    ///
    /// # Returns
    ///
    /// Whether the record was inserted and whether its price changed
    fn upsert_book(&mut self, book: &BookRecord) -> StoreResult<UpsertOutcome>;

    /// Upserts a batch of books, counting per-record failures
    ///
    /// A failing record is logged and counted; it never aborts the rest
    /// of the batch.
    fn upsert_batch(&mut self, books: &[BookRecord]) -> BatchOutcome;

    // ===== Read Contracts =====

    /// Gets a book by its store-assigned ID
    fn get_book(&self, id: i64) -> StoreResult<Option<StoredBook>>;

    /// Lists books matching the query filters, sorted and paginated
    fn list_books(&self, query: &BookQuery) -> StoreResult<Vec<StoredBook>>;

    /// Counts all stored books
    fn count_books(&self) -> StoreResult<u64>;

    /// Gets the most recent change events, newest first
    ///
    /// # Arguments
    ///
    /// * `kind` - Restricts the result to one change kind when set
    /// * `limit` - Maximum number of events to return
    fn recent_changes(&self, kind: Option<ChangeKind>, limit: u32) -> StoreResult<Vec<ChangeEvent>>;

    // ===== Statistics =====

    /// Counts change events, optionally restricted to one kind
    fn count_changes(&self, kind: Option<ChangeKind>) -> StoreResult<u64>;

    /// Gets book counts per category, largest first
    fn count_by_category(&self) -> StoreResult<Vec<(String, u64)>>;

    /// Gets the average price across all books, None when empty
    fn average_price(&self) -> StoreResult<Option<f64>>;

    /// Gets the most recent scrape timestamp, None when empty
    fn latest_scrape(&self) -> StoreResult<Option<DateTime<Utc>>>;
}
