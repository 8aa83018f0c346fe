//! Crawler module for catalog fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - Bounded-concurrency HTTP fetching
//! - HTML extraction of links and book records
//! - Overall crawl coordination and the run summary

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{run_crawl, CrawlSummary, Crawler};
pub use extractor::{
    extract_book_detail, extract_book_links, extract_category_links, extract_next_page_link,
    ParseError,
};
pub use fetcher::{build_http_client, FetchError, Fetcher};
