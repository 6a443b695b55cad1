//! Orchestration of a full run: walk, detect duplicates, assemble.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use dirscope_core::{ScanConfig, ScanError};
use dirscope_scan::Walker;

use crate::duplicates::DuplicateDetector;
use crate::report::AnalysisResult;

/// Runs the walker and the duplicate detector and builds the result.
pub struct Analyzer {
    walker: Walker,
    detector: DuplicateDetector,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_walker(Walker::new())
    }

    /// Use a preconfigured walker (custom filter, shared cancel flag).
    pub fn with_walker(walker: Walker) -> Self {
        Self {
            walker,
            detector: DuplicateDetector::new(),
        }
    }

    pub fn walker(&self) -> &Walker {
        &self.walker
    }

    /// Run one analysis.
    ///
    /// Fails only for an unusable root. A cancelled walk yields a result with
    /// `complete == false` and no duplicate detection.
    pub fn run(&self, config: &ScanConfig) -> Result<AnalysisResult, ScanError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let outcome = self.walker.scan(config)?;
        let mut errors = outcome.errors;

        let run_detection = config.check_duplicates && !outcome.interrupted;
        if config.check_duplicates && outcome.interrupted {
            warn!("skipping duplicate detection for an interrupted scan");
        }

        let duplicates = if run_detection {
            // Files the walk failed to hash already have an error record.
            let found = self
                .detector
                .with_hash_missing(!config.hash_files)
                .detect(&outcome.records);
            errors.extend(found.errors);
            found.groups
        } else {
            Vec::new()
        };

        let elapsed = start.elapsed();
        info!(
            root = %outcome.root.display(),
            files = outcome.summary.total_files,
            duplicate_groups = duplicates.len(),
            errors = errors.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "analysis finished"
        );

        AnalysisResult::builder()
            .root(outcome.root)
            .mode(config.mode)
            .started_at(started_at)
            .elapsed(elapsed)
            .summary(outcome.summary)
            .files(outcome.records)
            .duplicates(duplicates)
            .errors(errors)
            .complete(!outcome.interrupted)
            .duplicates_checked(run_detection)
            .build()
            .map_err(|e| ScanError::Other {
                message: e.to_string(),
            })
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
