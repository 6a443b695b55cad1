//! File system walking engine for dirscope.
//!
//! This crate traverses a directory tree in parallel using jwalk and turns
//! each regular file into a [`FileRecord`], optionally hashed and with text
//! metrics, while feeding a running [`DirectorySummary`].
//!
//! # Example
//!
//! ```rust,no_run
//! use dirscope_scan::{ScanConfig, Walker};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let outcome = Walker::new().scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", outcome.summary.total_size);
//! println!("Total files: {}", outcome.summary.total_files);
//! ```
//!
//! # Progress Monitoring
//!
//! Subscribe before scanning; a snapshot is broadcast every thousand files
//! and once more when the walk ends.
//!
//! ```rust,no_run
//! use dirscope_scan::{ScanConfig, Walker};
//!
//! let walker = Walker::new();
//! let mut progress_rx = walker.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Scanned {} files", progress.files_scanned);
//!         if progress.finished {
//!             break;
//!         }
//!     }
//! });
//!
//! walker.scan(&ScanConfig::new(".")).unwrap();
//! ```

mod filter;
mod hasher;
mod progress;
mod text;
mod walker;

pub use filter::{EntryFilter, FilterPolicy, PlatformFilter, SYSTEM_FILE_NAMES};
pub use hasher::{
    CHUNK_SIZE, ContentError, ContentReport, DigestAlgorithm, digest_file, hash_file,
    read_content,
};
pub use progress::ScanProgress;
pub use text::{TextCounter, TextTally, count_text};
pub use walker::{ScanOutcome, Walker};

// Re-export core types for convenience
pub use dirscope_core::{
    AnalysisMode, DirectorySummary, ErrorKind, ErrorRecord, FileRecord, ScanConfig, ScanError,
};
