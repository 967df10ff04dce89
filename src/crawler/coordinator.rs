//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that drives a harvest:
//! - Selecting the active query and page from the checkpoint
//! - Fetching the search page and, concurrently, its detail pages
//! - Classifying entries and applying quotas, one entry at a time
//! - Downloading and storing accepted images
//! - Persisting the checkpoint after every page
//!
//! Detail pages are the only concurrent step. Workers return owned entries and
//! never see the crawl state; every counter update happens in the sequential
//! consumption phase after all workers of the page have been joined.

use crate::classify::{tables_from_config, ClassTable, SubclassTable};
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_with_retry, FetchOutcome, RetryPolicy};
use crate::crawler::parser::{extract_detail_links, parse_detail_page, DetailEntry};
use crate::crawler::quota::{check_quota, record_save, DiscardReason, QuotaDecision};
use crate::output::{print_progress, ProgressReport};
use crate::state::{load_state, save_state, CrawlState, StateError};
use crate::storage::{DirectoryStore, ImageStore};
use crate::HarvestError;
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every class that received images has reached its limit
    QuotasSatisfied,

    /// The last page of the last query has been processed
    QueriesExhausted,
}

/// Summary of a finished `Coordinator::run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub pages_processed: u32,
    pub images_saved: u32,
}

/// Per-page counts, for logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Detail links found on the search page
    pub cards: usize,

    /// Detail pages that yielded a type and an image
    pub entries: usize,

    /// Images written to the store
    pub saved: u32,

    /// Entries whose type matched no class
    pub unclassified: u32,

    /// Entries dropped by dedup or quota
    pub discarded: u32,

    /// Accepted entries whose download or write failed
    pub failed: u32,

    /// The search page itself could not be fetched
    pub page_skipped: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    classes: ClassTable,
    subclasses: SubclassTable,
    store: Box<dyn ImageStore>,
    state: CrawlState,
    state_path: PathBuf,
    base_url: Url,
    config_hash: Option<String>,
    show_progress: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `fresh` - Ignore any existing checkpoint and start from the first query
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The checkpoint or HTTP client could not be set up
    pub fn new(config: Config, fresh: bool) -> Result<Self, HarvestError> {
        let state_path = PathBuf::from(&config.output.state_path);

        let state = if fresh {
            tracing::info!("Starting fresh; existing checkpoint will be overwritten");
            CrawlState::new()
        } else {
            let state = load_state(&state_path)?;
            if state.downloaded.is_empty() {
                tracing::info!("No previous progress found, starting from the first query");
            } else {
                tracing::info!(
                    "Resuming at query {} page {} with {} images already downloaded",
                    state.query_index,
                    state.page,
                    state.downloaded.len()
                );
            }
            state
        };

        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let base_url = Url::parse(&config.search.base_url)?;
        let (classes, subclasses) = tables_from_config(&config);
        let store = Box::new(DirectoryStore::new(&config.output.save_dir));

        Ok(Self {
            config: Arc::new(config),
            client,
            classes,
            subclasses,
            store,
            state,
            state_path,
            base_url,
            config_hash: None,
            show_progress: true,
        })
    }

    /// Replaces the image store
    pub fn with_store(mut self, store: Box<dyn ImageStore>) -> Self {
        self.store = store;
        self
    }

    /// Records the configuration hash in every checkpoint written
    ///
    /// Resuming under a different configuration is allowed but logged, since
    /// the saved cursor may then point at a different query.
    pub fn with_config_hash(mut self, hash: String) -> Self {
        if let Some(previous) = &self.state.config_hash {
            if *previous != hash {
                tracing::warn!(
                    "Configuration changed since the checkpoint was written ({} -> {})",
                    previous,
                    hash
                );
            }
        }
        self.config_hash = Some(hash);
        self
    }

    /// Enables or disables the progress bars printed after each page
    pub fn with_progress_output(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// The current crawl state
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Fills the search URL template for a query and page
    pub fn search_url(&self, query: &str, page: u32) -> String {
        self.config
            .search
            .url_template
            .replace("{query}", query)
            .replace("{page}", &page.to_string())
    }

    /// Runs the main crawl loop
    ///
    /// Each iteration:
    /// 1. Stops if quotas are satisfied or the queries are exhausted
    /// 2. Processes the current page
    /// 3. Advances the cursor and writes the checkpoint
    ///
    /// A failed checkpoint write ends the run with an error; every other
    /// failure only affects the entry or page it happened on.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let limit = self.config.quota.limit_per_class;
        let max_pages = self.config.search.max_pages_per_query;
        let page_delay = Duration::from_millis(self.config.crawler.page_delay_ms);
        let time_budget = Duration::from_secs(self.config.crawler.page_time_budget_secs);

        let mut pages_processed = 0;
        let mut images_saved = 0;

        let outcome = loop {
            if self.state.quotas_satisfied(limit) {
                tracing::info!("All aircraft classes have reached their image limits");
                break CrawlOutcome::QuotasSatisfied;
            }

            let Some(query) = self
                .config
                .search
                .queries
                .get(self.state.query_index)
                .cloned()
            else {
                tracing::info!("All search queries exhausted");
                break CrawlOutcome::QueriesExhausted;
            };
            let page = self.state.page;

            let started = Instant::now();
            let stats = self.process_page(&query, page).await;
            let took = started.elapsed();

            if took > time_budget {
                tracing::warn!(
                    "Page {} for '{}' took {:.1}s, over the {}s budget",
                    page,
                    query,
                    took.as_secs_f64(),
                    time_budget.as_secs()
                );
            }

            self.state.elapsed += took.as_secs_f64();
            self.state.advance_page(max_pages);
            self.persist()?;

            pages_processed += 1;
            images_saved += stats.saved;

            if stats.page_skipped {
                tracing::debug!("Advanced past unavailable page {} for '{}'", page, query);
            } else {
                tracing::info!(
                    "Page {} for '{}': {} cards, {} entries, {} saved, {} discarded, {} unclassified, {} failed",
                    page,
                    query,
                    stats.cards,
                    stats.entries,
                    stats.saved,
                    stats.discarded,
                    stats.unclassified,
                    stats.failed
                );
            }

            if self.show_progress {
                print_progress(&ProgressReport::from_state(
                    &self.state,
                    &self.classes,
                    &self.subclasses,
                    limit,
                ));
            }

            if !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }
        };

        tracing::info!(
            "Crawl finished ({:?}): {} pages processed, {} images saved this run",
            outcome,
            pages_processed,
            images_saved
        );

        Ok(CrawlReport {
            outcome,
            pages_processed,
            images_saved,
        })
    }

    /// Processes one search page
    ///
    /// A search page that cannot be fetched counts as empty; the caller still
    /// advances past it.
    async fn process_page(&mut self, query: &str, page: u32) -> PageStats {
        let url = self.search_url(query, page);
        tracing::info!("Scraping page {} for query '{}'", page, query);

        let policy = RetryPolicy::for_search(&self.config.retry);
        let Some(html) = fetch_with_retry(&self.client, &url, policy).await.into_text() else {
            tracing::warn!("Skipping page {} for '{}': search page unavailable", page, query);
            return PageStats {
                page_skipped: true,
                ..PageStats::default()
            };
        };

        let links = extract_detail_links(&html, &self.base_url);
        let cards = links.len();
        let entries = self.extract_entries(links).await;

        let mut stats = self.consume_entries(entries).await;
        stats.cards = cards;
        stats
    }

    /// Fetches and parses detail pages with bounded concurrency
    ///
    /// All tasks are joined before returning. Results come back in card order.
    async fn extract_entries(&self, links: Vec<String>) -> Vec<DetailEntry> {
        let semaphore = Arc::new(Semaphore::new(
            self.config.crawler.max_concurrent_details as usize,
        ));
        let policy = RetryPolicy::for_detail(&self.config.retry);
        let mut tasks = JoinSet::new();

        for (index, link) in links.into_iter().enumerate() {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                fetch_detail(&client, &link, policy)
                    .await
                    .map(|entry| (index, entry))
            });
        }

        let mut found = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(entry)) => found.push(entry),
                Ok(None) => {}
                Err(e) => tracing::warn!("Detail page task failed: {}", e),
            }
        }

        found.sort_by_key(|(index, _)| *index);
        found.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Classifies, quota-checks, downloads, and records entries in order
    async fn consume_entries(&mut self, entries: Vec<DetailEntry>) -> PageStats {
        let limit = self.config.quota.limit_per_class;
        let policy = RetryPolicy::for_detail(&self.config.retry);
        let mut stats = PageStats {
            entries: entries.len(),
            ..PageStats::default()
        };

        for entry in entries {
            let Some(classification) = self.classes.map_aircraft_type(&entry.plane_type) else {
                tracing::debug!("No class for '{}', skipping", entry.plane_type);
                stats.unclassified += 1;
                continue;
            };

            // Re-checked per entry, so duplicates within a page are caught too
            let decision = check_quota(
                &self.state,
                &entry.image_url,
                &classification,
                &self.subclasses,
                limit,
            );

            let subclass = match &decision {
                QuotaDecision::Discard(reason) => {
                    match reason {
                        DiscardReason::AlreadyDownloaded => {
                            tracing::trace!("Already downloaded: {}", entry.image_url)
                        }
                        other => tracing::debug!(
                            "Dropping {} ({}): {:?}",
                            entry.image_url,
                            classification.label,
                            other
                        ),
                    }
                    stats.discarded += 1;
                    continue;
                }
                QuotaDecision::SaveSubclass(found) => Some(found.subclass.clone()),
                QuotaDecision::SaveClass => None,
            };

            let Some(bytes) = fetch_with_retry(&self.client, &entry.image_url, policy)
                .await
                .into_body()
            else {
                stats.failed += 1;
                continue;
            };

            match self.store.save(
                &bytes,
                &entry.image_url,
                &classification.label,
                subclass.as_deref(),
            ) {
                Ok(path) => {
                    record_save(&mut self.state, &entry.image_url, &classification, &decision);
                    stats.saved += 1;
                    tracing::debug!("Saved {} -> {}", entry.image_url, path.display());
                }
                Err(e) => {
                    tracing::warn!("Error saving image {}: {}", entry.image_url, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Writes the checkpoint
    fn persist(&mut self) -> Result<(), StateError> {
        self.state.updated_at = Some(Utc::now());
        if let Some(hash) = &self.config_hash {
            self.state.config_hash = Some(hash.clone());
        }
        save_state(&self.state_path, &self.state)
    }
}

/// Fetches one detail page and extracts its entry
async fn fetch_detail(client: &Client, url: &str, policy: RetryPolicy) -> Option<DetailEntry> {
    let FetchOutcome::Success { final_url, body } = fetch_with_retry(client, url, policy).await
    else {
        return None;
    };

    let page_url = Url::parse(&final_url).ok()?;
    let html = String::from_utf8_lossy(&body);
    let entry = parse_detail_page(&html, &page_url);
    if entry.is_none() {
        tracing::debug!("Detail page {} lacks a type or image", url);
    }
    entry
}

/// Runs a harvest with the given configuration, resuming from the checkpoint
///
/// # Example
///
/// ```no_run
/// use plane_harvest::config::Config;
/// use plane_harvest::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(Config::default(), false).await?;
/// println!("Saved {} images", report.images_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlReport, HarvestError> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    coordinator.run().await
}
