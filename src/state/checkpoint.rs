//! Checkpoint file persistence
//!
//! The checkpoint is a single JSON document. Saves go to a sibling temp file
//! which is synced and then renamed over the checkpoint, so a crash mid-write
//! leaves the previous checkpoint intact.

use super::crawl_state::{CrawlState, CURRENT_SCHEMA_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing the checkpoint
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error on checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed checkpoint {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Checkpoint {path} has schema version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
}

/// Result type for checkpoint operations
pub type StateResult<T> = Result<T, StateError>;

/// Loads the crawl state, or the zero state if no checkpoint exists
///
/// Legacy checkpoints without a schema version are accepted and upgraded in
/// memory; the next save writes the current version.
pub fn load_state(path: &Path) -> StateResult<CrawlState> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No checkpoint at {}, starting from scratch", path.display());
            return Ok(CrawlState::new());
        }
        Err(source) => {
            return Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut state: CrawlState =
        serde_json::from_str(&content).map_err(|source| StateError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if state.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(StateError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: state.schema_version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if state.schema_version < CURRENT_SCHEMA_VERSION {
        tracing::info!(
            "Upgrading checkpoint schema from v{} to v{}",
            state.schema_version,
            CURRENT_SCHEMA_VERSION
        );
        state.schema_version = CURRENT_SCHEMA_VERSION;
    }

    // A hand-edited page of 0 would otherwise never address a real page
    if state.page == 0 {
        state.page = 1;
    }

    tracing::debug!(
        "Loaded checkpoint: query {} page {}, {} images downloaded",
        state.query_index,
        state.page,
        state.downloaded.len()
    );

    Ok(state)
}

/// Writes the crawl state atomically (temp file + rename)
pub fn save_state(path: &Path, state: &CrawlState) -> StateResult<()> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_vec(state).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = temp_path_for(path);
    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(source) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(source));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
