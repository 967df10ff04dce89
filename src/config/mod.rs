//! Configuration module for Plane-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file (or no file at all) reproduces the
//! stock airliners.net crawl.
//!
//! # Example
//!
//! ```no_run
//! use plane_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("planes.toml")).unwrap();
//! println!("Crawling {} queries", config.search.queries.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_class_rules, default_subclass_groups, ClassRule, Config, CrawlerConfig, OutputConfig,
    QuotaConfig, RetryConfig, SearchConfig, SplitConfig, SubclassGroup, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_split_ratios};
