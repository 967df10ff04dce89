//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with bounded exponential backoff
//! - Error classification for logging
//!
//! Exhausting the retries is not an error: callers get `FetchOutcome::GaveUp`
//! and carry on with the next card, page, or query.

use crate::config::{CrawlerConfig, RetryConfig, UserAgentConfig};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Retry schedule for a class of requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,

    /// Delay after the first failure
    pub initial_delay: Duration,

    /// Factor applied to the delay after each further failure
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Policy for search result pages
    pub fn for_search(config: &RetryConfig) -> Self {
        Self {
            attempts: config.search_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
        }
    }

    /// Policy for detail pages and image downloads
    pub fn for_detail(config: &RetryConfig) -> Self {
        Self {
            attempts: config.detail_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.min(20));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// HTTP 429
    RateLimited,

    /// Any other non-200 status
    Status(u16),

    /// Request timed out
    Timeout,

    /// Connection refused, DNS failure, TLS error, body read error, ...
    Network(String),
}

/// Result of a retried fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the body
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Response body
        body: Vec<u8>,
    },

    /// Every attempt failed; the last failure is kept for logging
    GaveUp {
        attempts: u32,
        last_error: AttemptError,
    },
}

impl FetchOutcome {
    /// Returns the body on success
    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::GaveUp { .. } => None,
        }
    }

    /// Returns the body decoded as (lossy) UTF-8 text on success
    pub fn into_text(self) -> Option<String> {
        self.into_body()
            .map(|body| String::from_utf8_lossy(&body).into_owned())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use plane_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use plane_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.clone())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.request_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying with exponential backoff
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Done |
/// | HTTP 429 | Back off, retry |
/// | Other status | Back off, retry |
/// | Timeout / network error | Back off, retry |
///
/// There is no sleep after the final attempt.
pub async fn fetch_with_retry(client: &Client, url: &str, policy: RetryPolicy) -> FetchOutcome {
    let attempts = policy.attempts.max(1);
    let mut last_error = AttemptError::Network("no attempt made".to_string());

    for attempt in 0..attempts {
        match fetch_once(client, url).await {
            Ok((final_url, body)) => return FetchOutcome::Success { final_url, body },
            Err(error) => {
                let remaining = attempts - attempt - 1;
                if remaining > 0 {
                    let delay = policy.delay(attempt);
                    match &error {
                        AttemptError::RateLimited => tracing::warn!(
                            "429 Too Many Requests for {}, backing off for {:?}",
                            url,
                            delay
                        ),
                        other => tracing::debug!(
                            "Attempt {}/{} for {} failed ({:?}), retrying in {:?}",
                            attempt + 1,
                            attempts,
                            url,
                            other,
                            delay
                        ),
                    }
                    tokio::time::sleep(delay).await;
                }
                last_error = error;
            }
        }
    }

    tracing::warn!(
        "Failed to fetch {} after {} attempts: {:?}",
        url,
        attempts,
        last_error
    );
    FetchOutcome::GaveUp {
        attempts,
        last_error,
    }
}

/// Performs a single GET, classifying any failure
async fn fetch_once(client: &Client, url: &str) -> Result<(String, Vec<u8>), AttemptError> {
    let response = client.get(url).send().await.map_err(classify_error)?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AttemptError::RateLimited);
    }
    if status != StatusCode::OK {
        return Err(AttemptError::Status(status.as_u16()));
    }

    let final_url = response.url().to_string();
    let body = response.bytes().await.map_err(classify_error)?;
    Ok((final_url, body.to_vec()))
}

fn classify_error(e: reqwest::Error) -> AttemptError {
    if e.is_timeout() {
        AttemptError::Timeout
    } else {
        AttemptError::Network(e.to_string())
    }
}
