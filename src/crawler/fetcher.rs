//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Bounding run-wide concurrency with a shared permit pool
//! - GET requests to fetch page content
//! - Error classification
//!
//! All page and detail fetches in a run go through one [`Fetcher`]; cloning
//! it is cheap and every clone draws permits from the same pool, so the
//! configured concurrency cap holds across every task in the run.

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

/// Errors from a single fetch attempt
///
/// A fetch failure never aborts a crawl; callers treat an error as
/// absence of content for the URL that failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status code
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// The request or body download exceeded the configured timeout
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// Connection-level failure (refused, reset, TLS, DNS)
    #[error("Transport error for {url}: {detail}")]
    Transport { url: String, detail: String },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use shelfwatch::config::CrawlerConfig;
/// use shelfwatch::crawler::build_http_client;
///
/// let config = CrawlerConfig {
///     base_url: "https://books.toscrape.com/".to_string(),
///     max_concurrent_fetches: 10,
///     fetch_timeout_secs: 30,
///     user_agent: "shelfwatch/1.0".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Bounded-concurrency page fetcher
///
/// Wraps one HTTP client and one semaphore sized by
/// `max-concurrent-fetches`. Clones share both, so the cap applies to the
/// whole run regardless of how many tasks hold a clone.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<Semaphore>,
}

impl Fetcher {
    /// Creates a fetcher from the crawler configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to fetch
    /// * `Err(reqwest::Error)` - Failed to build the HTTP client
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_fetches as usize));
        Ok(Self { client, limiter })
    }

    /// Fetches a URL and returns the response body
    ///
    /// Acquires one permit from the shared pool before the request goes out
    /// and holds it until the body download completes, so a slow body still
    /// counts against the concurrency cap. Every failure is logged at warn
    /// here before it is returned.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body
    /// * `Err(FetchError)` - Classified fetch failure
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let _permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FetchError::Transport {
                url: url.to_string(),
                detail: "fetch limiter closed".to_string(),
            })?;

        let result = self.fetch_body(url).await;
        if let Err(error) = &result {
            tracing::warn!("Fetch failed: {}", error);
        }
        result
    }

    async fn fetch_body(&self, url: &Url) -> Result<String, FetchError> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(error) => return Err(classify_request_error(url, error)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|error| classify_request_error(url, error))
    }
}

/// Classifies a reqwest error into the fetch error taxonomy
fn classify_request_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            detail: "connection refused".to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            detail: error.to_string(),
        }
    }
}
