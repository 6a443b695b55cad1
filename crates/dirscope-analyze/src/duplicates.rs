//! Duplicate file detection over scanned records.
//!
//! Two phases:
//! 1. Group non-empty files by size and keep buckets with 2+ files
//! 2. For those candidates only, bucket by fast digest and confirm by strong
//!    digest (computing digests here if the walk did not)
//!
//! Group members and groups are ordered by discovery sequence, so the output
//! does not depend on how the walk was scheduled.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dirscope_core::{ContentHash, Digests, ErrorRecord, FileRecord};
use dirscope_scan::digest_file;

/// A group of files sharing the same content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Strong digest shared by all files in this group.
    pub digest: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Paths in discovery order.
    pub paths: Vec<PathBuf>,

    /// Number of files, always at least 2.
    pub count: usize,
}

impl DuplicateGroup {
    /// Space freed by keeping a single copy: size * (count - 1).
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.deletable_count() as u64
    }

    /// Space taken by all copies together.
    pub fn total_bytes(&self) -> u64 {
        self.size * self.count as u64
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.count.saturating_sub(1)
    }
}

/// Result of a detection pass.
#[derive(Debug, Clone, Default)]
pub struct DuplicateOutcome {
    /// Groups sorted by total size descending.
    pub groups: Vec<DuplicateGroup>,

    /// Failures from digests computed during detection.
    pub errors: Vec<ErrorRecord>,

    /// Files that shared their size with another file.
    pub candidates: u64,
}

impl DuplicateOutcome {
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Total number of files across all groups.
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::reclaimable_bytes).sum()
    }
}

/// A file sharing its size with at least one other file.
#[derive(Debug, Clone)]
struct Candidate<'a> {
    seq: u64,
    path: &'a Path,
    size: u64,
    digests: Option<Digests>,
}

/// A candidate with both digests known.
#[derive(Debug)]
struct Hashed<'a> {
    seq: u64,
    path: &'a Path,
    size: u64,
    digests: Digests,
}

/// Size-then-digest duplicate finder.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    hash_missing: bool,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self { hash_missing: true }
    }

    /// Whether candidates without digests are hashed here. When off they are
    /// left out, since the walk already tried and recorded the failure.
    pub fn with_hash_missing(mut self, hash_missing: bool) -> Self {
        self.hash_missing = hash_missing;
        self
    }

    /// Find duplicate groups among `records`.
    pub fn detect(&self, records: &[FileRecord]) -> DuplicateOutcome {
        // Phase 1: size buckets
        let mut by_size: IndexMap<u64, Vec<Candidate<'_>>> = IndexMap::new();
        for record in records.iter().filter(|r| !r.is_empty()) {
            by_size.entry(record.size).or_default().push(Candidate {
                seq: record.seq,
                path: &record.path,
                size: record.size,
                digests: record.digests,
            });
        }
        by_size.retain(|_, bucket| bucket.len() > 1);

        let mut candidates: Vec<Candidate<'_>> = by_size.into_values().flatten().collect();
        let candidate_count = candidates.len() as u64;
        debug!(candidates = candidate_count, "size bucketing done");

        if candidates.is_empty() {
            return DuplicateOutcome::default();
        }

        // Phase 2: digests for candidates the walk did not hash
        let hash_missing = self.hash_missing;
        let errors: Vec<ErrorRecord> = candidates
            .par_iter_mut()
            .filter(|c| hash_missing && c.digests.is_none())
            .filter_map(|c| match digest_file(c.path) {
                Ok(digests) => {
                    c.digests = Some(digests);
                    None
                }
                Err(err) => Some(err.to_record(true)),
            })
            .collect();

        for error in &errors {
            debug!(path = %error.path.display(), kind = %error.kind, "{}", error.message);
        }

        let hashed = candidates.into_iter().filter_map(|c| {
            c.digests.map(|digests| Hashed {
                seq: c.seq,
                path: c.path,
                size: c.size,
                digests,
            })
        });

        let mut by_fast: IndexMap<(u64, u64), Vec<Hashed<'_>>> = IndexMap::new();
        for file in hashed {
            by_fast
                .entry((file.size, file.digests.fast))
                .or_default()
                .push(file);
        }

        // (first seq, group) so ties sort by discovery order
        let mut found: Vec<(u64, DuplicateGroup)> = Vec::new();
        for ((size, _), bucket) in by_fast {
            if bucket.len() < 2 {
                continue;
            }

            let mut by_strong: IndexMap<ContentHash, Vec<Hashed<'_>>> = IndexMap::new();
            for file in bucket {
                by_strong.entry(file.digests.strong).or_default().push(file);
            }

            for (digest, mut members) in by_strong {
                if members.len() < 2 {
                    continue;
                }
                members.sort_by_key(|m| m.seq);
                let first_seq = members[0].seq;
                let paths: Vec<PathBuf> = members.iter().map(|m| m.path.to_path_buf()).collect();
                found.push((
                    first_seq,
                    DuplicateGroup {
                        digest,
                        size,
                        count: paths.len(),
                        paths,
                    },
                ));
            }
        }

        found.sort_by(|(a_seq, a), (b_seq, b)| {
            b.total_bytes()
                .cmp(&a.total_bytes())
                .then_with(|| a_seq.cmp(b_seq))
        });
        let groups: Vec<DuplicateGroup> = found.into_iter().map(|(_, g)| g).collect();

        info!(
            candidates = candidate_count,
            groups = groups.len(),
            hash_errors = errors.len(),
            "duplicate detection finished"
        );

        DuplicateOutcome {
            groups,
            errors,
            candidates: candidate_count,
        }
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}
