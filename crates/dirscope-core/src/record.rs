//! Per-file record types.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::category::{Category, classify, extension_of};

/// MIME type used when nothing better is known.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// BLAKE3 content hash used as the strong digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Both content digests of a file. They are always computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digests {
    /// XxHash64, used for bucketing.
    pub fast: u64,
    /// BLAKE3, used for confirmation.
    pub strong: ContentHash,
}

impl Digests {
    pub fn new(fast: u64, strong: ContentHash) -> Self {
        Self { fast, strong }
    }

    /// Fast digest as 16 hex digits.
    pub fn fast_hex(&self) -> String {
        format!("{:016x}", self.fast)
    }

    /// Strong digest as 64 hex digits.
    pub fn strong_hex(&self) -> String {
        self.strong.to_hex()
    }
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: None,
            created: None,
        }
    }

    /// Create timestamps with all available times.
    pub fn new(
        modified: SystemTime,
        accessed: Option<SystemTime>,
        created: Option<SystemTime>,
    ) -> Self {
        Self {
            modified,
            accessed,
            created,
        }
    }

    /// Modification time as seconds since the Unix epoch.
    pub fn modified_secs(&self) -> f64 {
        epoch_secs(self.modified)
    }
}

/// Seconds since the Unix epoch; negative for times before it.
pub fn epoch_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Line, word and character counts of a text file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub lines: u64,
    pub words: u64,
    pub chars: u64,
}

/// One scanned file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Discovery sequence number assigned by the walker.
    pub seq: u64,

    /// Absolute path.
    pub path: PathBuf,

    /// File name (not full path).
    pub name: CompactString,

    /// Lowercased extension including the dot; empty if none.
    pub extension: CompactString,

    /// Size in bytes.
    pub size: u64,

    /// Category derived from the extension.
    pub category: Category,

    /// Depth of the containing directory below the root.
    pub depth: u32,

    pub timestamps: Timestamps,

    /// Guessed MIME type.
    pub mime_type: CompactString,

    /// Owner identity (numeric uid on Unix).
    pub owner: Option<CompactString>,

    /// Permission bits (Unix only).
    pub permissions: Option<u32>,

    /// Content digests, when hashing ran and succeeded.
    pub digests: Option<Digests>,

    /// Text metrics; zero unless counted.
    pub text: TextMetrics,
}

impl FileRecord {
    /// Create a record; name, extension and category are derived from `path`.
    pub fn new(seq: u64, path: impl Into<PathBuf>, size: u64, timestamps: Timestamps) -> Self {
        let path = path.into();
        let name: CompactString = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        let extension = extension_of(&name);
        let category = classify(&extension);

        Self {
            seq,
            path,
            name,
            extension: extension.into(),
            size,
            category,
            depth: 0,
            timestamps,
            mime_type: CompactString::new(DEFAULT_MIME_TYPE),
            owner: None,
            permissions: None,
            digests: None,
            text: TextMetrics::default(),
        }
    }

    /// Set the depth of the containing directory.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Zero-byte files are never duplicate candidates.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn has_digests(&self) -> bool {
        self.digests.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
    }

    #[test]
    fn test_fast_hex_is_zero_padded() {
        let digests = Digests::new(0xff, ContentHash::new([0; 32]));
        assert_eq!(digests.fast_hex(), "00000000000000ff");
    }

    #[test]
    fn test_record_derives_classification() {
        let record = FileRecord::new(
            7,
            "/data/Notes.MD",
            12,
            Timestamps::with_modified(UNIX_EPOCH),
        );
        assert_eq!(record.name, "Notes.MD");
        assert_eq!(record.extension, ".md");
        assert_eq!(record.category, Category::Text);
        assert_eq!(record.mime_type, DEFAULT_MIME_TYPE);
        assert!(!record.has_digests());
        assert_eq!(record.text, TextMetrics::default());
    }

    #[test]
    fn test_epoch_secs() {
        let t = UNIX_EPOCH + Duration::from_millis(1500);
        assert_eq!(epoch_secs(t), 1.5);
        assert_eq!(epoch_secs(UNIX_EPOCH - Duration::from_secs(2)), -2.0);
    }
}
