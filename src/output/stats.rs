//! Progress reporting from crawl state
//!
//! This module turns the checkpoint counters into per-class and per-subclass
//! progress rows and draws them as `indicatif` bars.

use crate::classify::{ClassTable, SubclassTable};
use crate::state::CrawlState;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Layout of one progress row
const BAR_TEMPLATE: &str = "  {msg:<24} [{bar:30}] {pos}/{len}";

/// One progress row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRow {
    pub name: String,
    pub count: u32,
    pub cap: u32,
}

impl ProgressRow {
    pub fn is_complete(&self) -> bool {
        self.count >= self.cap
    }
}

/// Snapshot of crawl progress
#[derive(Debug, Clone)]
pub struct ProgressReport {
    /// One row per class label, in table order
    pub classes: Vec<ProgressRow>,

    /// One row per `"<group>:<subclass>"` key, in table order
    pub subclasses: Vec<ProgressRow>,

    /// Query cursor
    pub query_index: usize,
    pub page: u32,

    /// Distinct images downloaded so far
    pub downloaded: usize,

    /// Accumulated processing time
    pub elapsed: Duration,

    /// Estimated time to fill the classes in progress, if known
    pub remaining: Option<Duration>,
}

impl ProgressReport {
    /// Builds a report from the checkpoint and the classification tables
    ///
    /// Labels present in the state but no longer in the tables are appended,
    /// so nothing counted is hidden after a configuration change.
    pub fn from_state(
        state: &CrawlState,
        classes: &ClassTable,
        subclasses: &SubclassTable,
        limit_per_class: u32,
    ) -> Self {
        let mut class_rows: Vec<ProgressRow> = classes
            .labels()
            .into_iter()
            .map(|label| ProgressRow {
                name: label.to_string(),
                count: state.class_count(label),
                cap: limit_per_class,
            })
            .collect();
        for (label, count) in &state.progress {
            if !class_rows.iter().any(|row| row.name == *label) {
                class_rows.push(ProgressRow {
                    name: label.clone(),
                    count: *count,
                    cap: limit_per_class,
                });
            }
        }

        let mut subclass_rows = Vec::new();
        for group in subclasses.groups() {
            let cap = subclasses
                .target(&group.group, limit_per_class)
                .unwrap_or(limit_per_class);
            for subclass in &group.subclasses {
                let key = format!("{}:{}", group.group, subclass);
                subclass_rows.push(ProgressRow {
                    count: state.subclass_count(&key),
                    name: key,
                    cap,
                });
            }
        }
        for (key, count) in &state.subclass_counts {
            if !subclass_rows.iter().any(|row| row.name == *key) {
                let group = key.split(':').next().unwrap_or(key);
                subclass_rows.push(ProgressRow {
                    name: key.clone(),
                    count: *count,
                    cap: subclasses
                        .target(group, limit_per_class)
                        .unwrap_or(limit_per_class),
                });
            }
        }

        Self {
            classes: class_rows,
            subclasses: subclass_rows,
            query_index: state.query_index,
            page: state.page,
            downloaded: state.downloaded.len(),
            // Saturates for absurd hand-edited values
            elapsed: Duration::try_from_secs_f64(state.elapsed.max(0.0))
                .unwrap_or(Duration::MAX),
            remaining: estimate_remaining(state, limit_per_class),
        }
    }
}

/// Formats a duration as `DD:HH:MM:SS`
pub fn format_elapsed(duration: Duration) -> String {
    let mut seconds = duration.as_secs();
    let days = seconds / 86_400;
    seconds %= 86_400;
    let hours = seconds / 3_600;
    seconds %= 3_600;
    let minutes = seconds / 60;
    seconds %= 60;
    format!("{:02}:{:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// Estimates the time needed to fill every class that has started filling
///
/// Uses the average time per saved image so far. Returns `None` before the
/// first image is saved.
pub fn estimate_remaining(state: &CrawlState, limit_per_class: u32) -> Option<Duration> {
    let saved = state.total_saved();
    if saved == 0 || state.elapsed <= 0.0 {
        return None;
    }

    let missing: u64 = state
        .progress
        .values()
        .filter(|count| **count > 0)
        .map(|count| limit_per_class.saturating_sub(*count) as u64)
        .sum();

    let per_image = state.elapsed / saved as f64;
    Duration::try_from_secs_f64(per_image * missing as f64).ok()
}

fn row_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Adds one finished bar per row that has images, and returns them
fn add_row_bars(multi: &MultiProgress, rows: &[ProgressRow]) -> Vec<ProgressBar> {
    let style = row_style();

    rows.iter()
        .filter(|row| row.count > 0)
        .map(|row| {
            let bar = multi.add(ProgressBar::new(row.cap as u64));
            bar.set_style(style.clone());
            bar.set_message(row.name.clone());
            bar.set_position(row.count as u64);
            // Leaves the bar drawn at its current position
            bar.abandon();
            bar
        })
        .collect()
}

/// Prints the report to stdout
///
/// Classes with no images yet are omitted from the bars to keep the output short.
pub fn print_progress(report: &ProgressReport) {
    println!("\nClass Progress:");
    let classes = MultiProgress::with_draw_target(ProgressDrawTarget::stdout());
    add_row_bars(&classes, &report.classes);

    println!("\nSubclass Progress:");
    let subclasses = MultiProgress::with_draw_target(ProgressDrawTarget::stdout());
    add_row_bars(&subclasses, &report.subclasses);

    println!(
        "\nQuery {} page {} | {} images | elapsed {}",
        report.query_index,
        report.page,
        report.downloaded,
        format_elapsed(report.elapsed)
    );
    if let Some(remaining) = report.remaining {
        println!("Estimated time remaining: {}", format_elapsed(remaining));
    }
}
