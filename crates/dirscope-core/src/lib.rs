//! Core types for dirscope.
//!
//! This crate provides the data model shared by the scanning and analysis
//! crates: per-file records, the extension classifier, analysis modes and
//! their configuration table, the streaming summary accumulator, and the
//! error taxonomy.

mod category;
mod config;
mod error;
mod record;
mod summary;

pub use category::{Category, classify, extension_of};
pub use config::{
    AnalysisMode, ModeProfile, ScanConfig, ScanConfigBuilder, ScanConfigBuilderError,
};
pub use error::{ErrorKind, ErrorRecord, ScanError};
pub use record::{
    ContentHash, DEFAULT_MIME_TYPE, Digests, FileRecord, TextMetrics, Timestamps, epoch_secs,
};
pub use summary::{DirectorySummary, SummaryAccumulator, median};
