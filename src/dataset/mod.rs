//! Dataset preparation
//!
//! Splits the harvested image tree into train/validation/test partitions,
//! stratified by class and subclass directory.

mod split;

pub use split::{collect_images, split_dataset, Split, SplitRatios, SplitSummary};
