//! Plane-Harvest: a resumable, quota-aware aircraft photo harvester
//!
//! This crate walks the search results of an aviation photo site, classifies
//! each photo by aircraft family, and stores a class-balanced image set on disk.
//! Progress is checkpointed after every page so a crawl can be resumed at any time.

pub mod classify;
pub mod config;
pub mod crawler;
pub mod dataset;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Plane-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    State(#[from] state::StateError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Plane-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use classify::{ClassTable, Classification, SubclassMatch, SubclassTable};
pub use config::Config;
pub use state::{load_state, save_state, CrawlState};
pub use storage::{DirectoryStore, ImageStore};
