//! Error types for analysis runs.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Fatal errors that abort a run before or outside traversal.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path is missing, unreadable or not a directory.
    #[error("Invalid root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an invalid-root error.
    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Kind of a non-fatal, per-entry failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ErrorKind {
    /// Permission was denied.
    AccessDenied,
    /// Reading metadata failed.
    StatFailed,
    /// Reading a directory or file content failed.
    ReadFailed,
    /// Reading content for digests failed.
    HashFailed,
    /// Text content was not valid UTF-8.
    DecodeFailed,
}

/// Non-fatal failure recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Path where the failure occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of failure.
    pub kind: ErrorKind,
}

impl ErrorRecord {
    /// Create a new error record.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Classify an I/O error. Permission errors always become
    /// [`ErrorKind::AccessDenied`]; anything else takes `fallback`.
    pub fn from_io(path: impl Into<PathBuf>, error: &io::Error, fallback: ErrorKind) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::PermissionDenied => ErrorKind::AccessDenied,
            _ => fallback,
        };
        Self::new(path, error.to_string(), kind)
    }

    /// Metadata could not be read.
    pub fn stat_failed(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        Self::from_io(path, error, ErrorKind::StatFailed)
    }

    /// Content could not be read for hashing.
    pub fn hash_failed(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        Self::from_io(path, error, ErrorKind::HashFailed)
    }

    /// Content or a directory listing could not be read.
    pub fn read_failed(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        Self::from_io(path, error, ErrorKind::ReadFailed)
    }

    /// Text content contained invalid UTF-8.
    pub fn decode_failed(path: impl Into<PathBuf>, invalid_bytes: u64) -> Self {
        Self::new(
            path,
            format!("{invalid_bytes} byte(s) of invalid UTF-8"),
            ErrorKind::DecodeFailed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_maps_to_access_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let record = ErrorRecord::hash_failed("/test/path", &err);
        assert_eq!(record.kind, ErrorKind::AccessDenied);
        assert!(record.message.contains("denied"));
    }

    #[test]
    fn test_fallback_kind() {
        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        assert_eq!(ErrorRecord::hash_failed("/a", &err).kind, ErrorKind::HashFailed);
        assert_eq!(ErrorRecord::stat_failed("/a", &err).kind, ErrorKind::StatFailed);
        assert_eq!(ErrorRecord::read_failed("/a", &err).kind, ErrorKind::ReadFailed);
    }

    #[test]
    fn test_invalid_root_message() {
        let err = ScanError::invalid_root("/nope", "not a directory");
        assert_eq!(err.to_string(), "Invalid root /nope: not a directory");
    }
}
