//! Quota decisions for classified entries
//!
//! Pure logic: given the current counters and an entry's classification,
//! decide whether (and under which partition) the image may be saved.

use crate::classify::{Classification, SubclassMatch, SubclassTable};
use crate::state::CrawlState;

/// Why an entry was not saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// The image URL is already in the checkpoint's dedup set
    AlreadyDownloaded,

    /// The matched subclass has reached its share of the class quota
    SubclassFull { key: String },

    /// The class has reached its quota
    ClassFull { label: String },
}

/// Outcome of a quota check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Save under `<class>/<subclass>/` and count against the subclass
    SaveSubclass(SubclassMatch),

    /// Save under `<class>/` and count against the class only
    SaveClass,

    /// Do not save
    Discard(DiscardReason),
}

/// Decides what to do with a classified image
///
/// # Rules
///
/// 1. A URL already downloaded is discarded.
/// 2. If the type text contains a known subclass (first match wins, see
///    [`SubclassTable::find_subclass`]), that subclass's target applies. A full
///    subclass drops the entry outright; it is never counted against the
///    coarse class instead.
/// 3. Otherwise the coarse class limit applies.
///
/// The class limit is also checked for subclass saves so that no class can
/// exceed `limit_per_class` whatever the configured tables look like.
pub fn check_quota(
    state: &CrawlState,
    image_url: &str,
    classification: &Classification,
    subclasses: &SubclassTable,
    limit_per_class: u32,
) -> QuotaDecision {
    if state.is_downloaded(image_url) {
        return QuotaDecision::Discard(DiscardReason::AlreadyDownloaded);
    }

    let class_full = state.class_count(&classification.label) >= limit_per_class;

    match subclasses.find_subclass(&classification.raw_type) {
        Some(found) => {
            let key = found.key();
            let target = subclasses
                .target(&found.group, limit_per_class)
                .unwrap_or(limit_per_class);

            if state.subclass_count(&key) >= target {
                QuotaDecision::Discard(DiscardReason::SubclassFull { key })
            } else if class_full {
                QuotaDecision::Discard(DiscardReason::ClassFull {
                    label: classification.label.clone(),
                })
            } else {
                QuotaDecision::SaveSubclass(found)
            }
        }
        None if class_full => QuotaDecision::Discard(DiscardReason::ClassFull {
            label: classification.label.clone(),
        }),
        None => QuotaDecision::SaveClass,
    }
}

/// Applies a save decision to the counters
///
/// Call only after the image has actually been written.
pub fn record_save(
    state: &mut CrawlState,
    image_url: &str,
    classification: &Classification,
    decision: &QuotaDecision,
) {
    match decision {
        QuotaDecision::SaveSubclass(found) => {
            state.record_subclass_save(image_url, &classification.label, &found.key())
        }
        QuotaDecision::SaveClass => state.record_class_save(image_url, &classification.label),
        QuotaDecision::Discard(_) => {}
    }
}
