//! Aircraft classification
//!
//! This module maps the free-text aircraft type found on a photo's detail page
//! to a coarse class label, and locates the finer subclass used for balanced
//! sampling. Both lookups are ordered substring scans over configurable tables.

mod mapper;
mod subclass;

pub use mapper::{ClassTable, Classification, MAX_LABEL, NG_LABEL};
pub use subclass::{SubclassMatch, SubclassTable};

use crate::config::Config;

/// Builds both lookup tables from the configuration
pub fn tables_from_config(config: &Config) -> (ClassTable, SubclassTable) {
    (
        ClassTable::new(config.classes.clone()),
        SubclassTable::new(config.subclass_groups.clone()),
    )
}
