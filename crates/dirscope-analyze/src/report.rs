//! The immutable result of one analysis run.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use dirscope_core::{AnalysisMode, DirectorySummary, ErrorRecord, FileRecord};

use crate::duplicates::DuplicateGroup;

/// Total size above which a run recommends archiving (10 GiB).
pub const LARGE_TREE_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Duplicate group count above which a run recommends deduplication.
pub const MANY_DUPLICATE_GROUPS: usize = 10;

/// Everything one run produced, plus run metadata.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", setter(into))]
pub struct AnalysisResult {
    /// Canonical root path.
    pub root: PathBuf,

    pub mode: AnalysisMode,

    /// Wall-clock start of the run.
    #[builder(default = "Utc::now()")]
    pub started_at: DateTime<Utc>,

    #[builder(default)]
    pub elapsed: Duration,

    pub summary: DirectorySummary,

    /// Records in discovery order.
    #[builder(default)]
    pub files: Vec<FileRecord>,

    /// Groups sorted by total size descending.
    #[builder(default)]
    pub duplicates: Vec<DuplicateGroup>,

    #[builder(default)]
    pub errors: Vec<ErrorRecord>,

    /// False when the run was cancelled.
    #[builder(default = "true")]
    pub complete: bool,

    /// Whether duplicate detection ran.
    #[builder(default)]
    pub duplicates_checked: bool,
}

impl AnalysisResult {
    /// Create a new result builder.
    pub fn builder() -> AnalysisResultBuilder {
        AnalysisResultBuilder::default()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Space freed by keeping one copy of every duplicate group.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.duplicates.iter().map(DuplicateGroup::reclaimable_bytes).sum()
    }

    /// Number of files that belong to some duplicate group.
    pub fn duplicate_file_count(&self) -> usize {
        self.duplicates.iter().map(|g| g.count).sum()
    }

    pub fn is_partial(&self) -> bool {
        !self.complete
    }

    /// The `limit` largest files, largest first. Equal sizes keep discovery
    /// order.
    pub fn largest_files(&self, limit: usize) -> Vec<&FileRecord> {
        let mut files: Vec<&FileRecord> = self.files.iter().collect();
        files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.seq.cmp(&b.seq)));
        files.truncate(limit);
        files
    }

    /// Housekeeping suggestions derived from the result.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.summary.total_size > LARGE_TREE_BYTES {
            out.push("Consider archiving or compressing old files to save space".to_string());
        }
        if self.duplicates.len() > MANY_DUPLICATE_GROUPS {
            out.push("Many duplicate files found - consider deduplication".to_string());
        }
        if !self.errors.is_empty() {
            out.push("Some files could not be accessed - check permissions".to_string());
        }
        if !self.complete {
            out.push("Analysis was interrupted - results cover only part of the tree".to_string());
        }
        out
    }
}
