//! Storage traits and error types
//!
//! This module defines the trait interface for image sinks and the
//! associated error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while storing an image
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write image {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for downloaded images
///
/// Implementations decide where an image lands given its source URL and
/// classification; the crawler only needs the resulting path for logging.
pub trait ImageStore: Send + Sync {
    /// Stores image bytes under a class, and optionally a subclass
    ///
    /// # Arguments
    ///
    /// * `bytes` - The encoded image
    /// * `image_url` - Source URL, used to derive a stable file name
    /// * `class_label` - Coarse class, e.g. "B737 NG"
    /// * `subclass` - Optional subclass, e.g. "737-7"
    fn save(
        &self,
        bytes: &[u8],
        image_url: &str,
        class_label: &str,
        subclass: Option<&str>,
    ) -> StorageResult<PathBuf>;
}
