//! Crawler module for search paging and image harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff
//! - HTML parsing of search and detail pages
//! - Quota decisions per classified entry
//! - Overall crawl coordination and checkpointing

mod coordinator;
mod fetcher;
mod parser;
pub mod quota;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlReport, PageStats};
pub use fetcher::{build_http_client, fetch_with_retry, AttemptError, FetchOutcome, RetryPolicy};
pub use parser::{extract_detail_links, parse_detail_page, DetailEntry};
pub use quota::{check_quota, DiscardReason, QuotaDecision};
