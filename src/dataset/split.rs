use crate::config::{validate_split_ratios, SplitConfig};
use crate::{ConfigError, HarvestError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions treated as images
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Train/validation/test fractions, validated to sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    train: f64,
    val: f64,
    test: f64,
}

impl SplitRatios {
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self, ConfigError> {
        validate_split_ratios(train, val, test)?;
        Ok(Self { train, val, test })
    }

    pub fn from_config(config: &SplitConfig) -> Result<Self, ConfigError> {
        Self::new(config.train, config.val, config.test)
    }

    /// Number of train and validation items for a group of `n`; the rest is test
    fn cut_points(&self, n: usize) -> (usize, usize) {
        let n_train = ((n as f64) * self.train).floor() as usize;
        let n_val = ((n as f64) * self.val).floor() as usize;
        let n_train = n_train.min(n);
        (n_train, n_val.min(n - n_train))
    }
}

/// Dataset partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }
}

/// Counts produced by a split
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Partition directories (`<class>` or `<class>/<subclass>`) found
    pub groups: usize,
    pub train: usize,
    pub val: usize,
    pub test: usize,
    /// Images outside any class directory, left untouched
    pub skipped: usize,
}

impl SplitSummary {
    pub fn total(&self) -> usize {
        self.train + self.val + self.test
    }

    fn add(&mut self, split: Split, count: usize) {
        match split {
            Split::Train => self.train += count,
            Split::Val => self.val += count,
            Split::Test => self.test += count,
        }
    }
}

/// Splits a harvested image tree into `train/val/test`
///
/// Images are grouped by their partition directory, so every subclass is
/// split in the same proportions. Each group is sorted, shuffled with a
/// seeded RNG, and cut at `floor(n * train)` and `floor(n * val)`; the
/// remainder goes to test. Files are copied to
/// `<output>/<split>/<class>/<file name>`.
pub fn split_dataset(
    source: &Path,
    output: &Path,
    ratios: SplitRatios,
    seed: u64,
) -> Result<SplitSummary, HarvestError> {
    if !source.is_dir() {
        return Err(HarvestError::Dataset(format!(
            "Source directory {} does not exist",
            source.display()
        )));
    }

    tracing::debug!(
        "Splitting {} with ratios {:.2}/{:.2}/{:.2}, seed {}",
        source.display(),
        ratios.train,
        ratios.val,
        ratios.test,
        seed
    );

    let (groups, skipped) = collect_images(source)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut summary = SplitSummary {
        groups: groups.len(),
        skipped,
        ..SplitSummary::default()
    };

    for (partition, mut images) in groups {
        // The class is the top-level directory of the partition
        let Some(class_dir) = partition.components().next() else {
            continue;
        };

        images.sort();
        images.shuffle(&mut rng);

        let (n_train, n_val) = ratios.cut_points(images.len());
        let (train, rest) = images.split_at(n_train);
        let (val, test) = rest.split_at(n_val);

        for (split, paths) in [(Split::Train, train), (Split::Val, val), (Split::Test, test)] {
            if paths.is_empty() {
                continue;
            }

            let dest_dir = output.join(split.dir_name()).join(class_dir);
            fs::create_dir_all(&dest_dir)?;

            for path in paths {
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                fs::copy(path, dest_dir.join(file_name))?;
            }
            summary.add(split, paths.len());
        }

        tracing::debug!(
            "{}: {} train, {} val, {} test",
            partition.display(),
            train.len(),
            val.len(),
            test.len()
        );
    }

    tracing::info!(
        "Split {} images from {} groups: {} train, {} val, {} test",
        summary.total(),
        summary.groups,
        summary.train,
        summary.val,
        summary.test
    );

    Ok(summary)
}

/// Collects images under `source`, keyed by their directory relative to it
///
/// Returns the groups and the number of images sitting directly in `source`.
pub fn collect_images(source: &Path) -> std::io::Result<(BTreeMap<PathBuf, Vec<PathBuf>>, usize)> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    let mut skipped = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }

        let path = entry.into_path();
        let partition = path
            .parent()
            .and_then(|dir| dir.strip_prefix(source).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if partition.as_os_str().is_empty() {
            skipped += 1;
        } else {
            groups.entry(partition).or_default().push(path);
        }
    }

    Ok((groups, skipped))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn populate(root: &Path, partition: &str, prefix: &str, count: usize) {
        let dir = root.join(partition);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            fs::write(dir.join(format!("{}_{:08x}.jpg", prefix, i)), b"img").unwrap();
        }
    }

    fn files_under(root: &Path) -> BTreeSet<PathBuf> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn test_ratios_validation() {
        assert!(SplitRatios::new(0.7, 0.2, 0.1).is_ok());
        assert!(SplitRatios::new(0.5, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_cut_points() {
        let ratios = SplitRatios::new(0.7, 0.2, 0.1).unwrap();
        assert_eq!(ratios.cut_points(10), (7, 2));
        assert_eq!(ratios.cut_points(20), (14, 4));
        assert_eq!(ratios.cut_points(1), (0, 0));
        assert_eq!(ratios.cut_points(0), (0, 0));
    }

    #[test]
    fn test_split_per_partition() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        populate(source.path(), "A320", "A320", 10);
        populate(source.path(), "B737 NG/737-7", "B737 NG", 20);
        fs::write(source.path().join("stray.jpg"), b"img").unwrap();
        fs::write(source.path().join("A320").join("notes.txt"), b"x").unwrap();

        let ratios = SplitRatios::new(0.7, 0.2, 0.1).unwrap();
        let summary = split_dataset(source.path(), output.path(), ratios, 42).unwrap();

        assert_eq!(summary.groups, 2);
        assert_eq!((summary.train, summary.val, summary.test), (21, 6, 3));
        assert_eq!(summary.skipped, 1);

        let ng_train = fs::read_dir(output.path().join("train").join("B737 NG"))
            .unwrap()
            .count();
        assert_eq!(ng_train, 14);
        let a320_test = fs::read_dir(output.path().join("test").join("A320"))
            .unwrap()
            .count();
        assert_eq!(a320_test, 1);
    }

    #[test]
    fn test_collect_groups_by_partition() {
        let source = TempDir::new().unwrap();
        populate(source.path(), "B737 NG/737-8", "B737 NG", 3);
        populate(source.path(), "B737 NG", "B737 NG", 2);
        fs::write(source.path().join("loose.PNG"), b"img").unwrap();

        let (groups, skipped) = collect_images(source.path()).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[Path::new("B737 NG/737-8")].len(), 3);
        assert_eq!(groups[Path::new("B737 NG")].len(), 2);
    }

    #[test]
    fn test_same_seed_same_split() {
        let source = TempDir::new().unwrap();
        populate(source.path(), "B747", "B747", 15);
        let ratios = SplitRatios::new(0.6, 0.2, 0.2).unwrap();

        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        split_dataset(source.path(), first.path(), ratios, 7).unwrap();
        split_dataset(source.path(), second.path(), ratios, 7).unwrap();

        assert_eq!(files_under(first.path()), files_under(second.path()));
    }

    #[test]
    fn test_missing_source() {
        let output = TempDir::new().unwrap();
        let ratios = SplitRatios::new(0.7, 0.2, 0.1).unwrap();
        let result = split_dataset(Path::new("/nonexistent/planes"), output.path(), ratios, 1);
        assert!(matches!(result, Err(HarvestError::Dataset(_))));
    }
}
