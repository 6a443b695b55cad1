//! Whole-tree statistics and the streaming accumulator that builds them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::record::FileRecord;

/// Aggregate statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySummary {
    /// Root path that was scanned.
    pub root: PathBuf,
    /// Total number of files.
    pub total_files: u64,
    /// Total number of directories below the root.
    pub total_dirs: u64,
    /// Total size in bytes.
    pub total_size: u64,
    /// Mean file size in bytes.
    pub mean_size: f64,
    /// Median file size in bytes.
    pub median_size: f64,
    /// Largest file (path, size).
    pub largest_file: Option<(PathBuf, u64)>,
    /// Smallest non-empty file (path, size).
    pub smallest_file: Option<(PathBuf, u64)>,
    /// Oldest file by modification time.
    pub oldest_file: Option<(PathBuf, SystemTime)>,
    /// Newest file by modification time.
    pub newest_file: Option<(PathBuf, SystemTime)>,
    /// Deepest directory depth reached.
    pub max_depth: u32,
    /// File count per category.
    pub categories: BTreeMap<Category, u64>,
    /// File count per non-empty extension.
    pub extensions: BTreeMap<String, u64>,
    /// File count per owner identity.
    pub owners: BTreeMap<String, u64>,
}

impl DirectorySummary {
    /// Create an empty summary for `root`.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            total_files: 0,
            total_dirs: 0,
            total_size: 0,
            mean_size: 0.0,
            median_size: 0.0,
            largest_file: None,
            smallest_file: None,
            oldest_file: None,
            newest_file: None,
            max_depth: 0,
            categories: BTreeMap::new(),
            extensions: BTreeMap::new(),
            owners: BTreeMap::new(),
        }
    }

    /// Count of files in `category`.
    pub fn category_count(&self, category: Category) -> u64 {
        self.categories.get(&category).copied().unwrap_or(0)
    }

    /// Count of files with `extension` (e.g. `.txt`).
    pub fn extension_count(&self, extension: &str) -> u64 {
        self.extensions.get(extension).copied().unwrap_or(0)
    }

    /// Categories sorted by count descending, then by category order.
    pub fn categories_by_count(&self) -> Vec<(Category, u64)> {
        let mut entries: Vec<_> = self.categories.iter().map(|(c, n)| (*c, *n)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }

    /// The `limit` most common extensions.
    pub fn top_extensions(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self
            .extensions
            .iter()
            .map(|(e, n)| (e.as_str(), *n))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }
}

/// Streaming accumulator fed one record at a time.
///
/// Everything except the median is maintained incrementally; the median needs
/// the full size multiset, so sizes are retained until [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct SummaryAccumulator {
    summary: DirectorySummary,
    sizes: Vec<u64>,
}

impl SummaryAccumulator {
    /// Create an empty accumulator.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            summary: DirectorySummary::empty(root),
            sizes: Vec::new(),
        }
    }

    /// Update stats with a file record. Ties keep the first record seen.
    pub fn record_file(&mut self, record: &FileRecord) {
        let s = &mut self.summary;
        let size = record.size;
        let modified = record.timestamps.modified;

        s.total_files += 1;
        s.total_size += size;
        self.sizes.push(size);

        if s.largest_file.as_ref().is_none_or(|(_, max)| size > *max) {
            s.largest_file = Some((record.path.clone(), size));
        }

        if size > 0 && s.smallest_file.as_ref().is_none_or(|(_, min)| size < *min) {
            s.smallest_file = Some((record.path.clone(), size));
        }

        if s.oldest_file.as_ref().is_none_or(|(_, t)| modified < *t) {
            s.oldest_file = Some((record.path.clone(), modified));
        }

        if s.newest_file.as_ref().is_none_or(|(_, t)| modified > *t) {
            s.newest_file = Some((record.path.clone(), modified));
        }

        *s.categories.entry(record.category).or_default() += 1;
        if !record.extension.is_empty() {
            *s.extensions.entry(record.extension.to_string()).or_default() += 1;
        }
        if let Some(owner) = &record.owner {
            *s.owners.entry(owner.to_string()).or_default() += 1;
        }
    }

    /// Record a directory at `depth` below the root.
    pub fn record_dir(&mut self, depth: u32) {
        self.summary.total_dirs += 1;
        self.summary.max_depth = self.summary.max_depth.max(depth);
    }

    pub fn total_files(&self) -> u64 {
        self.summary.total_files
    }

    pub fn total_dirs(&self) -> u64 {
        self.summary.total_dirs
    }

    pub fn total_size(&self) -> u64 {
        self.summary.total_size
    }

    /// Compute mean and median and freeze the summary.
    pub fn finish(mut self) -> DirectorySummary {
        let s = &mut self.summary;
        if s.total_files > 0 {
            s.mean_size = s.total_size as f64 / s.total_files as f64;
            s.median_size = median(&mut self.sizes);
        }
        self.summary
    }
}

/// True median of `values`; 0 for an empty slice. Sorts in place.
pub fn median(values: &mut [u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid] as f64
    } else {
        (values[mid - 1] as f64 + values[mid] as f64) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Timestamps;
    use std::time::{Duration, UNIX_EPOCH};

    fn record(seq: u64, path: &str, size: u64, mtime_secs: u64) -> FileRecord {
        FileRecord::new(
            seq,
            path,
            size,
            Timestamps::with_modified(UNIX_EPOCH + Duration::from_secs(mtime_secs)),
        )
    }

    #[test]
    fn test_empty_accumulator() {
        let summary = SummaryAccumulator::new("/root").finish();
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.mean_size, 0.0);
        assert_eq!(summary.median_size, 0.0);
        assert!(summary.largest_file.is_none());
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_extremes_and_histograms() {
        let mut acc = SummaryAccumulator::new("/r");
        acc.record_file(&record(0, "/r/empty.txt", 0, 50));
        acc.record_file(&record(1, "/r/a.png", 300, 10));
        acc.record_file(&record(2, "/r/b.txt", 20, 90));
        acc.record_file(&record(3, "/r/c", 300, 10));
        acc.record_dir(1);
        let summary = acc.finish();

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.total_dirs, 1);
        assert_eq!(summary.total_size, 620);
        assert_eq!(summary.largest_file, Some((PathBuf::from("/r/a.png"), 300)));
        assert_eq!(summary.smallest_file, Some((PathBuf::from("/r/b.txt"), 20)));
        assert_eq!(summary.oldest_file.as_ref().unwrap().0, PathBuf::from("/r/a.png"));
        assert_eq!(summary.newest_file.as_ref().unwrap().0, PathBuf::from("/r/b.txt"));
        assert_eq!(summary.category_count(Category::Text), 2);
        assert_eq!(summary.category_count(Category::Other), 1);
        assert_eq!(summary.extension_count(".txt"), 2);
        assert!(!summary.extensions.contains_key(""));
        assert_eq!(summary.categories.values().sum::<u64>(), summary.total_files);
        assert_eq!(summary.mean_size, 155.0);
        assert_eq!(summary.median_size, 160.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), 0.0);
        assert_eq!(median(&mut [9, 1, 5]), 5.0);
        assert_eq!(median(&mut [4, 1, 3, 2]), 2.5);
    }

    #[test]
    fn test_categories_by_count() {
        let mut acc = SummaryAccumulator::new("/r");
        acc.record_file(&record(0, "/r/a.rs", 1, 0));
        acc.record_file(&record(1, "/r/b.txt", 1, 0));
        acc.record_file(&record(2, "/r/c.txt", 1, 0));
        let summary = acc.finish();

        let ordered = summary.categories_by_count();
        assert_eq!(ordered[0], (Category::Text, 2));
        assert_eq!(ordered[1], (Category::Code, 1));
        assert_eq!(summary.top_extensions(1), vec![(".txt", 2)]);
    }
}
