//! Chunked content hashing.
//!
//! Files are streamed in fixed-size chunks so memory use does not depend on
//! file size. Every requested digest (and optionally the text counter) is fed
//! from the same read pass.

use std::collections::BTreeMap;
use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use twox_hash::XxHash64;

use dirscope_core::{ContentHash, Digests, ErrorRecord};

use crate::text::{TextCounter, TextTally};

/// Read buffer size.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    /// XxHash64 with seed 0. Cheap, used for bucketing.
    Fast,
    /// BLAKE3-256. Used for confirmation.
    Strong,
}

impl DigestAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Fast => "xxh64",
            Self::Strong => "blake3",
        }
    }
}

/// Failure while reading file content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Read failed for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } => path,
        }
    }

    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => source,
        }
    }

    /// Convert into an error record. `hashing` selects `HashFailed` over
    /// `ReadFailed` for non-permission failures.
    pub fn to_record(&self, hashing: bool) -> ErrorRecord {
        if hashing {
            ErrorRecord::hash_failed(self.path(), self.io_error())
        } else {
            ErrorRecord::read_failed(self.path(), self.io_error())
        }
    }
}

/// What a single content pass produced.
#[derive(Debug, Clone, Copy)]
pub struct ContentReport {
    /// Present when digests were requested.
    pub digests: Option<Digests>,
    /// Present when text counting was requested.
    pub text: Option<TextTally>,
    pub bytes_read: u64,
}

#[derive(Default)]
struct DigestState {
    fast: Option<XxHash64>,
    strong: Option<blake3::Hasher>,
}

impl DigestState {
    fn for_algorithms(algorithms: &[DigestAlgorithm]) -> Self {
        let mut state = Self::default();
        for algorithm in algorithms {
            match algorithm {
                DigestAlgorithm::Fast => state.fast = Some(XxHash64::with_seed(0)),
                DigestAlgorithm::Strong => state.strong = Some(blake3::Hasher::new()),
            }
        }
        state
    }

    fn update(&mut self, chunk: &[u8]) {
        if let Some(fast) = self.fast.as_mut() {
            fast.write(chunk);
        }
        if let Some(strong) = self.strong.as_mut() {
            strong.update(chunk);
        }
    }

    fn finish_fast(&self) -> Option<u64> {
        self.fast.as_ref().map(|h| h.finish())
    }

    fn finish_strong(&self) -> Option<ContentHash> {
        self.strong
            .as_ref()
            .map(|h| ContentHash::new(*h.finalize().as_bytes()))
    }
}

/// Stream `path` through `sink` in [`CHUNK_SIZE`] chunks.
fn stream_file(path: &Path, mut sink: impl FnMut(&[u8])) -> Result<u64, ContentError> {
    let mut file = File::open(path).map_err(|source| ContentError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ContentError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        sink(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }
    Ok(total)
}

/// Compute the requested digests of a file as lowercase hex, in one pass.
pub fn hash_file(
    path: &Path,
    algorithms: &[DigestAlgorithm],
) -> Result<BTreeMap<DigestAlgorithm, String>, ContentError> {
    let mut state = DigestState::for_algorithms(algorithms);
    stream_file(path, |chunk| state.update(chunk))?;

    let mut out = BTreeMap::new();
    if let Some(fast) = state.finish_fast() {
        out.insert(DigestAlgorithm::Fast, format!("{fast:016x}"));
    }
    if let Some(strong) = state.finish_strong() {
        out.insert(DigestAlgorithm::Strong, strong.to_hex());
    }
    Ok(out)
}

/// Compute both digests of a file.
pub fn digest_file(path: &Path) -> Result<Digests, ContentError> {
    let mut fast = XxHash64::with_seed(0);
    let mut strong = blake3::Hasher::new();
    stream_file(path, |chunk| {
        fast.write(chunk);
        strong.update(chunk);
    })?;
    Ok(Digests::new(
        fast.finish(),
        ContentHash::new(*strong.finalize().as_bytes()),
    ))
}

/// Read a file once, computing both digests and/or text metrics.
pub fn read_content(
    path: &Path,
    digests: bool,
    count_text: bool,
) -> Result<ContentReport, ContentError> {
    let algorithms: &[DigestAlgorithm] = if digests {
        &[DigestAlgorithm::Fast, DigestAlgorithm::Strong]
    } else {
        &[]
    };
    let mut state = DigestState::for_algorithms(algorithms);
    let mut counter = count_text.then(TextCounter::new);

    let bytes_read = stream_file(path, |chunk| {
        state.update(chunk);
        if let Some(counter) = counter.as_mut() {
            counter.update(chunk);
        }
    })?;

    let digests = match (state.finish_fast(), state.finish_strong()) {
        (Some(fast), Some(strong)) => Some(Digests::new(fast, strong)),
        _ => None,
    };

    Ok(ContentReport {
        digests,
        text: counter.map(TextCounter::finish),
        bytes_read,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_same_content_same_digests() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "duplicate content here").unwrap();
        fs::write(temp.path().join("b"), "duplicate content here").unwrap();
        fs::write(temp.path().join("c"), "unique content").unwrap();

        let a = digest_file(&temp.path().join("a")).unwrap();
        let b = digest_file(&temp.path().join("b")).unwrap();
        let c = digest_file(&temp.path().join("c")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.strong, c.strong);
        assert_ne!(a.fast, c.fast);
    }

    #[test]
    fn test_strong_digest_matches_blake3() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f");
        let content = vec![7u8; CHUNK_SIZE * 3 + 17];
        fs::write(&path, &content).unwrap();

        let digests = digest_file(&path).unwrap();
        assert_eq!(digests.strong.0, *blake3::hash(&content).as_bytes());
    }

    #[test]
    fn test_hash_file_returns_requested_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f");
        fs::write(&path, "abc").unwrap();

        let only_strong = hash_file(&path, &[DigestAlgorithm::Strong]).unwrap();
        assert_eq!(only_strong.len(), 1);
        assert_eq!(only_strong[&DigestAlgorithm::Strong].len(), 64);

        let both = hash_file(&path, &[DigestAlgorithm::Fast, DigestAlgorithm::Strong]).unwrap();
        assert_eq!(both[&DigestAlgorithm::Fast].len(), 16);
        assert_eq!(both[&DigestAlgorithm::Strong], only_strong[&DigestAlgorithm::Strong]);
    }

    #[test]
    fn test_single_pass_digests_and_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "one two\nthree\n").unwrap();

        let report = read_content(&path, true, true).unwrap();
        assert!(report.digests.is_some());
        assert_eq!(report.bytes_read, 14);
        let text = report.text.unwrap();
        assert_eq!(text.metrics.lines, 2);
        assert_eq!(text.metrics.words, 3);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let temp = TempDir::new().unwrap();
        let err = digest_file(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, ContentError::Open { .. }));
        assert_eq!(err.to_record(true).kind, dirscope_core::ErrorKind::HashFailed);
        assert_eq!(err.to_record(false).kind, dirscope_core::ErrorKind::ReadFailed);
    }
}
