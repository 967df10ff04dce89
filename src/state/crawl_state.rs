//! Crawl progress record persisted between runs
//!
//! All counters only ever grow. Ordered collections keep the serialized form
//! stable, so saving an unchanged state rewrites identical bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Checkpoint schema written by this version
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Resumable crawl position plus per-class and per-subclass counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Checkpoint layout version; 0 marks a file written before versioning
    #[serde(default)]
    pub schema_version: u32,

    /// Index into the configured query list
    #[serde(default)]
    pub query_index: usize,

    /// Page within the active query, starting at 1
    #[serde(default = "first_page")]
    pub page: u32,

    /// Image URLs already saved, across all queries
    #[serde(default)]
    pub downloaded: BTreeSet<String>,

    /// Saved images per class label
    #[serde(default)]
    pub progress: BTreeMap<String, u32>,

    /// Saved images per `"<group>:<subclass>"` key
    #[serde(default)]
    pub subclass_counts: BTreeMap<String, u32>,

    /// Accumulated seconds spent processing pages
    #[serde(default)]
    pub elapsed: f64,

    /// Hash of the configuration the last run used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,

    /// When the checkpoint was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn first_page() -> u32 {
    1
}

impl CrawlState {
    /// Creates the zero state: first query, first page, nothing downloaded
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            query_index: 0,
            page: 1,
            downloaded: BTreeSet::new(),
            progress: BTreeMap::new(),
            subclass_counts: BTreeMap::new(),
            elapsed: 0.0,
            config_hash: None,
            updated_at: None,
        }
    }

    /// Number of images saved for a class
    pub fn class_count(&self, label: &str) -> u32 {
        self.progress.get(label).copied().unwrap_or(0)
    }

    /// Number of images saved for a `"<group>:<subclass>"` key
    pub fn subclass_count(&self, key: &str) -> u32 {
        self.subclass_counts.get(key).copied().unwrap_or(0)
    }

    /// Returns true if the image URL has already been saved
    pub fn is_downloaded(&self, url: &str) -> bool {
        self.downloaded.contains(url)
    }

    /// Records an image saved under its class only
    pub fn record_class_save(&mut self, url: &str, label: &str) {
        self.downloaded.insert(url.to_string());
        *self.progress.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Records an image saved under a subclass; the class counter advances too
    pub fn record_subclass_save(&mut self, url: &str, label: &str, subclass_key: &str) {
        self.record_class_save(url, label);
        *self
            .subclass_counts
            .entry(subclass_key.to_string())
            .or_insert(0) += 1;
    }

    /// Moves to the next page, rolling over to the next query after `max_pages`
    pub fn advance_page(&mut self, max_pages: u32) {
        self.page += 1;
        if self.page > max_pages {
            self.query_index += 1;
            self.page = 1;
        }
    }

    /// Returns true once every class that has started filling has reached `limit`
    ///
    /// Classes still at zero are ignored. A state with no saved images at all is
    /// not considered satisfied, otherwise a fresh crawl would stop before its
    /// first page.
    pub fn quotas_satisfied(&self, limit: u32) -> bool {
        let mut started = self.progress.values().filter(|count| **count > 0).peekable();
        started.peek().is_some() && started.all(|count| *count >= limit)
    }

    /// Total images saved across all classes
    pub fn total_saved(&self) -> u64 {
        self.progress.values().map(|c| *c as u64).sum()
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
