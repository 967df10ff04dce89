//! Output module for progress reporting
//!
//! This module handles:
//! - Class and subclass progress bars
//! - Elapsed time and ETA formatting

pub mod stats;

pub use stats::{
    estimate_remaining, format_elapsed, print_progress, ProgressReport, ProgressRow,
};
