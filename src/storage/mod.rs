//! Storage module for downloaded images
//!
//! This module handles writing image bytes to disk:
//! - The `ImageStore` trait the crawler saves through
//! - A directory-tree implementation partitioned by class and subclass
//! - Deterministic, URL-derived file names

mod directory;
mod traits;

pub use directory::{url_digest, DirectoryStore};
pub use traits::{ImageStore, StorageError, StorageResult};
