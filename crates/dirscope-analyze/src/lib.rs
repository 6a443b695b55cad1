//! Analysis stage for dirscope.
//!
//! - **Duplicate detection** - size buckets first, then fast and strong
//!   digests for the surviving candidates only
//! - **Result assembly** - the immutable [`AnalysisResult`] handed to exporters
//! - **Engine** - [`Analyzer`] runs walk, detection and assembly in one call
//!
//! ```rust,no_run
//! use dirscope_analyze::{AnalysisMode, Analyzer, ScanConfig};
//!
//! let config = ScanConfig::for_mode("/path/to/scan", AnalysisMode::Standard);
//! let result = Analyzer::new().run(&config).unwrap();
//!
//! println!("Found {} duplicate groups", result.duplicates.len());
//! println!("Reclaimable: {} bytes", result.reclaimable_bytes());
//! ```

mod duplicates;
mod engine;
mod report;

pub use duplicates::{DuplicateDetector, DuplicateGroup, DuplicateOutcome};
pub use engine::Analyzer;
pub use report::{
    AnalysisResult, AnalysisResultBuilder, AnalysisResultBuilderError, LARGE_TREE_BYTES,
    MANY_DUPLICATE_GROUPS,
};

// Re-export core types
pub use dirscope_core::{AnalysisMode, ContentHash, DirectorySummary, ScanConfig, ScanError};
