//! SQLite store implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.
//! Each upsert runs as one transaction so a record and its change event
//! land together or not at all.

use crate::store::schema::initialize_schema;
use crate::store::traits::{Store, StoreError, StoreResult};
use crate::store::{
    BatchOutcome, BookQuery, BookRecord, ChangeEvent, ChangeKind, StoredBook, UpsertOutcome,
};
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(ScrapeError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScrapeError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScrapeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    // ===== Write Path =====

    fn upsert_book(&mut self, book: &BookRecord) -> StoreResult<UpsertOutcome> {
        let tx = self.conn.transaction()?;

        // Check-then-write under one transaction, keyed by the natural key
        let existing: Option<(i64, f64)> = tx
            .query_row(
                "SELECT id, price FROM books WHERE title = ?1 AND category = ?2",
                params![book.title, book.category],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let attributes = serde_json::to_string(&book.attributes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let scraped_at = book.scraped_at.to_rfc3339();

        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO books (title, category, cover_url, rating, description,
                     attributes, price, review_count, scraped_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        book.title,
                        book.category,
                        book.cover_url,
                        book.rating,
                        book.description,
                        attributes,
                        book.price,
                        book.review_count,
                        scraped_at
                    ],
                )
                .map_err(|e| classify_write_error(e, &book.title, &book.category))?;

                let book_id = tx.last_insert_rowid();
                record_change(
                    &tx,
                    book_id,
                    &book.title,
                    ChangeKind::NewBook,
                    None,
                    Some(book.price),
                )?;
                tracing::debug!("New book: '{}' ({})", book.title, book.category);

                UpsertOutcome {
                    inserted: true,
                    changed: false,
                }
            }
            Some((book_id, old_price)) => {
                // A re-sighting refreshes every mutable field even when
                // nothing changed, so scraped_at always reflects the last run
                tx.execute(
                    "UPDATE books SET cover_url = ?1, rating = ?2, description = ?3,
                     attributes = ?4, price = ?5, review_count = ?6, scraped_at = ?7
                     WHERE id = ?8",
                    params![
                        book.cover_url,
                        book.rating,
                        book.description,
                        attributes,
                        book.price,
                        book.review_count,
                        scraped_at,
                        book_id
                    ],
                )?;

                let changed = !prices_equal(old_price, book.price);
                if changed {
                    record_change(
                        &tx,
                        book_id,
                        &book.title,
                        ChangeKind::PriceChange,
                        Some(old_price),
                        Some(book.price),
                    )?;
                    tracing::info!(
                        "Price change: '{}' {:.2} -> {:.2}",
                        book.title,
                        old_price,
                        book.price
                    );
                }

                UpsertOutcome {
                    inserted: false,
                    changed,
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn upsert_batch(&mut self, books: &[BookRecord]) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            total: books.len() as u32,
            ..Default::default()
        };

        for book in books {
            match self.upsert_book(book) {
                Ok(UpsertOutcome { inserted: true, .. }) => outcome.inserted += 1,
                Ok(UpsertOutcome { inserted: false, .. }) => outcome.updated += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to upsert '{}' ({}): {}",
                        book.title,
                        book.category,
                        e
                    );
                    outcome.errors += 1;
                }
            }
        }

        outcome
    }

    // ===== Read Contracts =====

    fn get_book(&self, id: i64) -> StoreResult<Option<StoredBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, cover_url, rating, description, attributes,
             price, review_count, scraped_at FROM books WHERE id = ?1",
        )?;

        let book = stmt.query_row(params![id], row_to_book).optional()?;

        Ok(book)
    }

    fn list_books(&self, query: &BookQuery) -> StoreResult<Vec<StoredBook>> {
        let mut sql = String::from(
            "SELECT id, title, category, cover_url, rating, description, attributes,
             price, review_count, scraped_at FROM books",
        );

        let limit = query.page_size;
        let offset = (query.page.max(1) as u64 - 1) * query.page_size as u64;

        // Filters are conjunctive; absent filters contribute nothing
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::new();

        if let Some(category) = &query.category {
            clauses.push("category = ?");
            params.push(category);
        }
        if let Some(min_price) = &query.min_price {
            clauses.push("price >= ?");
            params.push(min_price);
        }
        if let Some(max_price) = &query.max_price {
            clauses.push("price <= ?");
            params.push(max_price);
        }
        if let Some(min_rating) = &query.min_rating {
            // NULL ratings never satisfy the bound, so unrated books drop out
            clauses.push("rating >= ?");
            params.push(min_rating);
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(query.sort.order_clause());
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(&limit);
        params.push(&offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map(params.as_slice(), row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    fn count_books(&self) -> StoreResult<u64> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count)
    }

    fn recent_changes(
        &self,
        kind: Option<ChangeKind>,
        limit: u32,
    ) -> StoreResult<Vec<ChangeEvent>> {
        // Ties on occurred_at break toward the higher id, so events from the
        // same batch still come back newest-insert-first
        let events = match kind {
            Some(kind) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, book_id, book_title, kind, previous_price, new_price, occurred_at
                     FROM changes WHERE kind = ?1 ORDER BY occurred_at DESC, id DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![kind.to_db_string(), limit], row_to_change)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, book_id, book_title, kind, previous_price, new_price, occurred_at
                     FROM changes ORDER BY occurred_at DESC, id DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit], row_to_change)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(events)
    }

    // ===== Statistics =====

    fn count_changes(&self, kind: Option<ChangeKind>) -> StoreResult<u64> {
        let count: u64 = match kind {
            Some(kind) => self.conn.query_row(
                "SELECT COUNT(*) FROM changes WHERE kind = ?1",
                params![kind.to_db_string()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM changes", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    fn count_by_category(&self) -> StoreResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) as count FROM books
             GROUP BY category ORDER BY count DESC, category ASC",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn average_price(&self) -> StoreResult<Option<f64>> {
        let average: Option<f64> =
            self.conn
                .query_row("SELECT AVG(price) FROM books", [], |row| row.get(0))?;
        Ok(average)
    }

    fn latest_scrape(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(scraped_at) FROM books", [], |row| row.get(0))?;

        match latest {
            Some(raw) => {
                let parsed = raw.parse::<DateTime<Utc>>().map_err(|e| {
                    StoreError::Serialization(format!("bad scraped_at '{}': {}", raw, e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }
}

/// Prices compared at cent precision so float noise never fabricates events
fn prices_equal(a: f64, b: f64) -> bool {
    (a * 100.0).round() as i64 == (b * 100.0).round() as i64
}

/// Appends one change event inside the caller's transaction
fn record_change(
    tx: &rusqlite::Transaction<'_>,
    book_id: i64,
    title: &str,
    kind: ChangeKind,
    previous_price: Option<f64>,
    new_price: Option<f64>,
) -> StoreResult<()> {
    tx.execute(
        "INSERT INTO changes (book_id, book_title, kind, previous_price, new_price, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            book_id,
            title,
            kind.to_db_string(),
            previous_price,
            new_price,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Surfaces unique-key violations as conflicts; everything else passes through
fn classify_write_error(error: rusqlite::Error, title: &str, category: &str) -> StoreError {
    match &error {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation(format!("books({}, {})", title, category))
        }
        _ => StoreError::Sqlite(error),
    }
}

fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredBook> {
    let attributes_json: String = row.get(6)?;
    let attributes: Vec<(String, String)> = serde_json::from_str(&attributes_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let scraped_at_raw: String = row.get(9)?;
    let scraped_at = scraped_at_raw.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StoredBook {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        cover_url: row.get(3)?,
        rating: row.get(4)?,
        description: row.get(5)?,
        attributes,
        price: row.get(7)?,
        review_count: row.get(8)?,
        scraped_at,
    })
}

fn row_to_change(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChangeEvent> {
    let kind_raw: String = row.get(3)?;
    let kind = ChangeKind::from_db_string(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown change kind '{}'", kind_raw).into(),
        )
    })?;

    let occurred_at_raw: String = row.get(6)?;
    let occurred_at = occurred_at_raw.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ChangeEvent {
        id: row.get(0)?,
        book_id: row.get(1)?,
        book_title: row.get(2)?,
        kind,
        previous_price: row.get(4)?,
        new_price: row.get(5)?,
        occurred_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortKey;

    fn sample_book(title: &str, category: &str, price: f64) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            category: category.to_string(),
            cover_url: format!("https://books.example.com/media/{}.jpg", title),
            rating: Some(3),
            description: Some(format!("About {}", title)),
            attributes: vec![
                ("UPC".to_string(), "4f19709e47883df5".to_string()),
                ("Price (excl. tax)".to_string(), format!("£{:.2}", price)),
                ("Availability".to_string(), "In stock".to_string()),
            ],
            price,
            review_count: 0,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_sighting_inserts_and_records_new_book() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let outcome = store
            .upsert_book(&sample_book("Meditations", "Philosophy", 25.89))
            .unwrap();

        assert!(outcome.inserted);
        assert!(!outcome.changed);
        assert_eq!(store.count_books().unwrap(), 1);

        let events = store.recent_changes(None, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::NewBook);
        assert_eq!(events[0].book_title, "Meditations");
        assert_eq!(events[0].previous_price, None);
        assert_eq!(events[0].new_price, Some(25.89));
    }

    #[test]
    fn test_identical_resighting_is_silent() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let book = sample_book("Meditations", "Philosophy", 25.89);

        store.upsert_book(&book).unwrap();
        let outcome = store.upsert_book(&book).unwrap();

        assert!(!outcome.inserted);
        assert!(!outcome.changed);
        assert_eq!(store.count_books().unwrap(), 1);
        assert_eq!(store.count_changes(None).unwrap(), 1);
    }

    #[test]
    fn test_price_difference_records_one_change() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .upsert_book(&sample_book("Meditations", "Philosophy", 10.00))
            .unwrap();
        let outcome = store
            .upsert_book(&sample_book("Meditations", "Philosophy", 12.50))
            .unwrap();

        assert!(!outcome.inserted);
        assert!(outcome.changed);

        let events = store
            .recent_changes(Some(ChangeKind::PriceChange), 10)
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous_price, Some(10.00));
        assert_eq!(events[0].new_price, Some(12.50));

        // Re-sighting the new price is quiet again
        let outcome = store
            .upsert_book(&sample_book("Meditations", "Philosophy", 12.50))
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(
            store.count_changes(Some(ChangeKind::PriceChange)).unwrap(),
            1
        );
    }

    #[test]
    fn test_sub_cent_noise_is_not_a_price_change() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .upsert_book(&sample_book("Meditations", "Philosophy", 10.00))
            .unwrap();
        let outcome = store
            .upsert_book(&sample_book("Meditations", "Philosophy", 10.001))
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(
            store.count_changes(Some(ChangeKind::PriceChange)).unwrap(),
            0
        );
    }

    #[test]
    fn test_resighting_refreshes_mutable_fields() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .upsert_book(&sample_book("Meditations", "Philosophy", 25.89))
            .unwrap();

        let mut updated = sample_book("Meditations", "Philosophy", 25.89);
        updated.rating = Some(5);
        updated.review_count = 12;
        store.upsert_book(&updated).unwrap();

        let books = store.list_books(&BookQuery::default()).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].rating, Some(5));
        assert_eq!(books[0].review_count, 12);
    }

    #[test]
    fn test_same_title_in_another_category_is_a_new_book() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .upsert_book(&sample_book("Meditations", "Philosophy", 25.89))
            .unwrap();
        let outcome = store
            .upsert_book(&sample_book("Meditations", "Classics", 19.99))
            .unwrap();

        assert!(outcome.inserted);
        assert_eq!(store.count_books().unwrap(), 2);
        assert_eq!(store.count_changes(Some(ChangeKind::NewBook)).unwrap(), 2);
    }

    #[test]
    fn test_get_book_round_trips_attributes() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let book = sample_book("Meditations", "Philosophy", 25.89);
        store.upsert_book(&book).unwrap();

        let events = store.recent_changes(None, 1).unwrap();
        let stored = store.get_book(events[0].book_id).unwrap().unwrap();

        assert_eq!(stored.title, "Meditations");
        assert_eq!(stored.attributes, book.attributes);
        assert_eq!(stored.description, book.description);
    }

    #[test]
    fn test_get_book_missing_is_none() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.get_book(999).unwrap().is_none());
    }

    #[test]
    fn test_list_books_filters_by_category() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert_book(&sample_book("Meditations", "Philosophy", 25.89))
            .unwrap();
        store
            .upsert_book(&sample_book("Emma", "Classics", 32.93))
            .unwrap();

        let query = BookQuery {
            category: Some("Classics".to_string()),
            ..Default::default()
        };
        let books = store.list_books(&query).unwrap();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Emma");
    }

    #[test]
    fn test_list_books_filters_by_price_range() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert_book(&sample_book("A", "Cat", 5.00)).unwrap();
        store.upsert_book(&sample_book("B", "Cat", 15.00)).unwrap();
        store.upsert_book(&sample_book("C", "Cat", 25.00)).unwrap();

        let query = BookQuery {
            min_price: Some(10.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        let books = store.list_books(&query).unwrap();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "B");
    }

    #[test]
    fn test_min_rating_excludes_unrated_books() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let mut unrated = sample_book("Unrated", "Cat", 5.00);
        unrated.rating = None;
        store.upsert_book(&unrated).unwrap();

        let mut rated = sample_book("Rated", "Cat", 5.00);
        rated.rating = Some(1);
        store.upsert_book(&rated).unwrap();

        let query = BookQuery {
            min_rating: Some(1),
            ..Default::default()
        };
        let books = store.list_books(&query).unwrap();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Rated");
    }

    #[test]
    fn test_list_books_sorts_by_price_with_title_tiebreak() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert_book(&sample_book("B", "Cat", 10.00)).unwrap();
        store.upsert_book(&sample_book("A", "Cat", 10.00)).unwrap();
        store.upsert_book(&sample_book("C", "Cat", 5.00)).unwrap();

        let query = BookQuery {
            sort: SortKey::Price,
            ..Default::default()
        };
        let books = store.list_books(&query).unwrap();

        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_list_books_sorts_by_rating_descending() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let mut low = sample_book("Low", "Cat", 10.00);
        low.rating = Some(1);
        store.upsert_book(&low).unwrap();

        let mut high = sample_book("High", "Cat", 10.00);
        high.rating = Some(5);
        store.upsert_book(&high).unwrap();

        let query = BookQuery {
            sort: SortKey::Rating,
            ..Default::default()
        };
        let books = store.list_books(&query).unwrap();

        assert_eq!(books[0].title, "High");
        assert_eq!(books[1].title, "Low");
    }

    #[test]
    fn test_list_books_paginates() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        for title in ["A", "B", "C", "D", "E"] {
            store.upsert_book(&sample_book(title, "Cat", 10.00)).unwrap();
        }

        let query = BookQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        };
        let books = store.list_books(&query).unwrap();

        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "D"]);
    }

    #[test]
    fn test_recent_changes_newest_first_and_limited() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store.upsert_book(&sample_book("A", "Cat", 10.00)).unwrap();
        store.upsert_book(&sample_book("B", "Cat", 10.00)).unwrap();
        store.upsert_book(&sample_book("A", "Cat", 12.00)).unwrap();

        let events = store.recent_changes(None, 2).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ChangeKind::PriceChange);
        assert_eq!(events[0].book_title, "A");
        assert_eq!(events[1].kind, ChangeKind::NewBook);
        assert_eq!(events[1].book_title, "B");
    }

    #[test]
    fn test_recent_changes_filters_by_kind() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store.upsert_book(&sample_book("A", "Cat", 10.00)).unwrap();
        store.upsert_book(&sample_book("A", "Cat", 12.00)).unwrap();

        let new_books = store.recent_changes(Some(ChangeKind::NewBook), 10).unwrap();
        let price_changes = store
            .recent_changes(Some(ChangeKind::PriceChange), 10)
            .unwrap();

        assert_eq!(new_books.len(), 1);
        assert_eq!(price_changes.len(), 1);
    }

    #[test]
    fn test_batch_counts_inserted_and_updated() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert_book(&sample_book("A", "Cat", 10.00)).unwrap();

        let batch = vec![
            sample_book("A", "Cat", 12.00),
            sample_book("B", "Cat", 20.00),
            sample_book("C", "Cat", 30.00),
        ];
        let outcome = store.upsert_batch(&batch);

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.errors, 0);
        assert_eq!(outcome.total, 3);
    }

    #[test]
    fn test_batch_counts_failures_without_aborting() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        // Sabotage the change log; every upsert now fails and rolls back
        store.conn.execute("DROP TABLE changes", []).unwrap();

        let batch = vec![sample_book("A", "Cat", 10.00), sample_book("B", "Cat", 20.00)];
        let outcome = store.upsert_batch(&batch);

        assert_eq!(outcome.errors, 2);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.total, 2);
        // The failed transactions rolled back the book rows too
        assert_eq!(store.count_books().unwrap(), 0);
    }

    #[test]
    fn test_count_by_category_largest_first() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert_book(&sample_book("A", "Travel", 10.00)).unwrap();
        store.upsert_book(&sample_book("B", "Travel", 10.00)).unwrap();
        store.upsert_book(&sample_book("C", "Mystery", 10.00)).unwrap();

        let counts = store.count_by_category().unwrap();

        assert_eq!(counts[0], ("Travel".to_string(), 2));
        assert_eq!(counts[1], ("Mystery".to_string(), 1));
    }

    #[test]
    fn test_average_price_empty_is_none() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert_eq!(store.average_price().unwrap(), None);
    }

    #[test]
    fn test_average_price() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert_book(&sample_book("A", "Cat", 10.00)).unwrap();
        store.upsert_book(&sample_book("B", "Cat", 20.00)).unwrap();

        let average = store.average_price().unwrap().unwrap();
        assert!((average - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_latest_scrape_tracks_the_newest_record() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        assert!(store.latest_scrape().unwrap().is_none());

        let before = Utc::now();
        store.upsert_book(&sample_book("A", "Cat", 10.00)).unwrap();

        let latest = store.latest_scrape().unwrap().unwrap();
        assert!(latest >= before);
    }
}
