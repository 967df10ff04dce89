//! Crawl state management
//!
//! This module defines the resumable crawl record and its checkpoint file:
//! - CrawlState: pagination cursor, dedup set, quota counters
//! - load_state / save_state: JSON persistence with atomic replacement

mod checkpoint;
mod crawl_state;

pub use checkpoint::{load_state, save_state, StateError, StateResult};
pub use crawl_state::{CrawlState, CURRENT_SCHEMA_VERSION};
