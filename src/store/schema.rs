//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Shelfwatch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Book records, keyed by (title, category)
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    cover_url TEXT NOT NULL,
    rating INTEGER,
    description TEXT,
    attributes TEXT NOT NULL,
    price REAL NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0,
    scraped_at TEXT NOT NULL,
    UNIQUE(title, category)
);

CREATE INDEX IF NOT EXISTS idx_books_category ON books(category);
CREATE INDEX IF NOT EXISTS idx_books_price ON books(price);
CREATE INDEX IF NOT EXISTS idx_books_rating ON books(rating);
CREATE INDEX IF NOT EXISTS idx_books_review_count ON books(review_count);
CREATE INDEX IF NOT EXISTS idx_books_scraped ON books(scraped_at);

-- Append-only log of detected differences between crawl passes
CREATE TABLE IF NOT EXISTS changes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id INTEGER NOT NULL REFERENCES books(id),
    book_title TEXT NOT NULL,
    kind TEXT NOT NULL,
    previous_price REAL,
    new_price REAL,
    occurred_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_changes_book ON changes(book_id);
CREATE INDEX IF NOT EXISTS idx_changes_kind ON changes(kind);
CREATE INDEX IF NOT EXISTS idx_changes_occurred ON changes(occurred_at DESC);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
