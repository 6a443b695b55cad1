//! JWalk-based directory walker.
//!
//! Directory reads run in parallel on the rayon pool, but jwalk yields entries
//! in sorted depth-first order, so the sequence numbers handed out here are
//! stable across runs. Per-file work (stat, hashing, text counting) is done in
//! bounded parallel batches; the results are applied to the accumulator in
//! sequence order by the calling thread only.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, UNIX_EPOCH};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use dirscope_core::{
    Category, DirectorySummary, ErrorKind, ErrorRecord, FileRecord, ScanConfig, ScanError,
    SummaryAccumulator, Timestamps,
};

use crate::filter::{EntryFilter, FilterPolicy, PlatformFilter};
use crate::hasher::read_content;
use crate::progress::ScanProgress;

/// Files enriched per parallel batch.
const BATCH_SIZE: usize = 256;

/// Files between progress snapshots.
const PROGRESS_INTERVAL: u64 = 1000;

/// Parallel directory walker producing file records and running statistics.
pub struct Walker {
    progress_tx: broadcast::Sender<ScanProgress>,
    filter: Arc<dyn EntryFilter>,
    cancel: Arc<AtomicBool>,
}

/// Everything a walk produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Canonical root path.
    pub root: PathBuf,
    /// Records in discovery order.
    pub records: Vec<FileRecord>,
    /// Frozen statistics over `records`.
    pub summary: DirectorySummary,
    /// Per-entry failures, in the order they were recorded.
    pub errors: Vec<ErrorRecord>,
    /// The walk was cancelled before the tree was exhausted.
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        !self.interrupted
    }
}

impl Walker {
    /// Create a walker using the platform hidden/system filter.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            filter: Arc::new(PlatformFilter),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the hidden/system predicate.
    pub fn with_filter(mut self, filter: Arc<dyn EntryFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Handle that cancels the walk when set to `true`.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Request cancellation. The current walk returns a partial outcome.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `config.root` and collect records, statistics and errors.
    ///
    /// Fails only if the root is unusable; every per-entry failure is
    /// recorded in [`ScanOutcome::errors`] instead.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let root = resolve_root(&config.root)?;
        info!(root = %root.display(), mode = %config.mode, "starting scan");

        let pool = build_pool(config.threads);
        let mut state = ScanState::new(&root);

        for entry_result in self.walk_dir(config, &root) {
            if self.is_cancelled() {
                break;
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    state.push_error(walk_error_record(&root, &err));
                    continue;
                }
            };

            // jwalk depth counts the root as 0, so root's children are at 1.
            let depth = entry.depth as u32;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                state.acc.record_dir(depth);
            } else if file_type.is_file() {
                state.enqueue(entry.path(), depth.saturating_sub(1));
                if state.batch.len() >= BATCH_SIZE {
                    self.flush(&mut state, config, pool.as_ref(), start);
                }
            } else {
                debug!(path = %entry.path().display(), "skipping non-regular entry");
            }
        }

        let interrupted = self.is_cancelled();
        if interrupted {
            warn!(
                pending = state.batch.len(),
                files = state.acc.total_files(),
                "scan cancelled, returning partial results"
            );
            state.batch.clear();
        } else {
            self.flush(&mut state, config, pool.as_ref(), start);
        }

        self.send_progress(&state, start, true);

        let ScanState {
            acc,
            records,
            errors,
            ..
        } = state;
        let summary = acc.finish();
        let elapsed = start.elapsed();

        info!(
            files = summary.total_files,
            dirs = summary.total_dirs,
            bytes = summary.total_size,
            errors = errors.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "scan finished"
        );

        Ok(ScanOutcome {
            root,
            records,
            summary,
            errors,
            interrupted,
            elapsed,
        })
    }

    /// Configure jwalk for this run.
    fn walk_dir(&self, config: &ScanConfig, root: &Path) -> WalkDir {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let policy = FilterPolicy {
            skip_hidden: config.skip_hidden,
            skip_system: config.skip_system,
        };
        let filter = Arc::clone(&self.filter);
        let cancel = Arc::clone(&self.cancel);

        // Directories at depth `max_depth` are still read, so their files
        // (one jwalk level deeper) are yielded; nothing below is read.
        let max_depth = config
            .max_depth
            .map(|d| d as usize + 1)
            .unwrap_or(usize::MAX);

        WalkDir::new(root)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .min_depth(1)
            .max_depth(max_depth)
            .process_read_dir(move |depth, _dir, _state, children| {
                if cancel.load(Ordering::Relaxed) {
                    children.clear();
                    return;
                }
                // The root itself arrives with no depth and is never filtered.
                if depth.is_none() || !policy.is_active() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => {
                        let name = entry.file_name.to_string_lossy();
                        let path = entry.path();
                        let excluded = policy.excludes(filter.as_ref(), &path, &name);
                        if excluded && entry.file_type().is_dir() {
                            debug!(path = %path.display(), "pruning filtered directory");
                        }
                        !excluded
                    }
                    Err(_) => true,
                });
            })
    }

    /// Enrich the pending batch in parallel and apply results in order.
    fn flush(
        &self,
        state: &mut ScanState,
        config: &ScanConfig,
        pool: Option<&rayon::ThreadPool>,
        start: Instant,
    ) {
        if state.batch.is_empty() {
            return;
        }

        let batch = std::mem::take(&mut state.batch);
        let enrich = move || {
            batch
                .into_par_iter()
                .map(|pending| visit_file(pending, config))
                .collect::<Vec<_>>()
        };
        let visits = match pool {
            Some(pool) => pool.install(enrich),
            None => enrich(),
        };

        for visit in visits {
            if state.apply(visit) && state.acc.total_files() % PROGRESS_INTERVAL == 0 {
                self.send_progress(state, start, false);
            }
        }
    }

    fn send_progress(&self, state: &ScanState, start: Instant, finished: bool) {
        // No subscribers is not an error.
        let _ = self.progress_tx.send(ScanProgress {
            files_scanned: state.acc.total_files(),
            dirs_scanned: state.acc.total_dirs(),
            bytes_scanned: state.acc.total_size(),
            current_path: state
                .records
                .last()
                .map(|r| r.path.clone())
                .unwrap_or_default(),
            errors_count: state.errors.len() as u64,
            elapsed: start.elapsed(),
            finished,
        });
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

/// A file seen by the walker but not yet stat'ed.
struct PendingFile {
    seq: u64,
    path: PathBuf,
    depth: u32,
}

/// Result of enriching one pending file.
struct Visit {
    record: Option<FileRecord>,
    errors: Vec<ErrorRecord>,
}

impl Visit {
    fn failed(error: ErrorRecord) -> Self {
        Self {
            record: None,
            errors: vec![error],
        }
    }
}

/// Mutable state owned by the walking thread.
struct ScanState {
    acc: SummaryAccumulator,
    records: Vec<FileRecord>,
    errors: Vec<ErrorRecord>,
    batch: Vec<PendingFile>,
    next_seq: u64,
}

impl ScanState {
    fn new(root: &Path) -> Self {
        Self {
            acc: SummaryAccumulator::new(root),
            records: Vec::new(),
            errors: Vec::new(),
            batch: Vec::with_capacity(BATCH_SIZE),
            next_seq: 0,
        }
    }

    fn enqueue(&mut self, path: PathBuf, depth: u32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.batch.push(PendingFile { seq, path, depth });
    }

    /// Returns whether a record was added.
    fn apply(&mut self, visit: Visit) -> bool {
        for error in visit.errors {
            self.push_error(error);
        }
        match visit.record {
            Some(record) => {
                self.acc.record_file(&record);
                self.records.push(record);
                true
            }
            None => false,
        }
    }

    fn push_error(&mut self, error: ErrorRecord) {
        debug!(path = %error.path.display(), kind = %error.kind, "{}", error.message);
        self.errors.push(error);
    }
}

/// Stat, classify, hash and count a single file.
fn visit_file(pending: PendingFile, config: &ScanConfig) -> Visit {
    let PendingFile { seq, path, depth } = pending;

    let metadata = match fs::metadata(&path) {
        Ok(m) => m,
        Err(err) => return Visit::failed(ErrorRecord::stat_failed(&path, &err)),
    };

    let mut record =
        FileRecord::new(seq, path, metadata.len(), timestamps_of(&metadata)).with_depth(depth);
    if let Some(mime) = mime_guess::from_path(&record.path).first_raw() {
        record.mime_type = CompactString::new(mime);
    }
    record.owner = owner_of(&metadata);
    record.permissions = permissions_of(&metadata);

    let mut errors = Vec::new();
    let count_text = config.count_text_content && record.category == Category::Text;

    if config.hash_files || count_text {
        match read_content(&record.path, config.hash_files, count_text) {
            Ok(report) => {
                record.digests = report.digests;
                match report.text {
                    Some(tally) if tally.is_clean() => record.text = tally.metrics,
                    Some(tally) => errors.push(ErrorRecord::decode_failed(
                        &record.path,
                        tally.invalid_bytes,
                    )),
                    None => {}
                }
            }
            Err(err) => errors.push(err.to_record(config.hash_files)),
        }
    }

    Visit {
        record: Some(record),
        errors,
    }
}

/// Canonicalize the root and check it is a directory.
fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let resolved = root
        .canonicalize()
        .map_err(|e| ScanError::invalid_root(root, e.to_string()))?;
    if !resolved.is_dir() {
        return Err(ScanError::invalid_root(resolved, "not a directory"));
    }
    Ok(resolved)
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            warn!("falling back to the global thread pool: {err}");
            None
        }
    }
}

fn walk_error_record(root: &Path, err: &jwalk::Error) -> ErrorRecord {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.io_error() {
        Some(io) => ErrorRecord::read_failed(path, io),
        None => ErrorRecord::new(path, err.to_string(), ErrorKind::ReadFailed),
    }
}

fn timestamps_of(metadata: &Metadata) -> Timestamps {
    Timestamps::new(
        metadata.modified().unwrap_or(UNIX_EPOCH),
        metadata.accessed().ok(),
        metadata.created().ok(),
    )
}

// Cross-platform metadata helpers

/// Numeric owner uid.
#[cfg(unix)]
fn owner_of(metadata: &Metadata) -> Option<CompactString> {
    Some(CompactString::from(metadata.uid().to_string()))
}

#[cfg(not(unix))]
fn owner_of(_metadata: &Metadata) -> Option<CompactString> {
    None
}

/// Permission bits.
#[cfg(unix)]
fn permissions_of(metadata: &Metadata) -> Option<u32> {
    Some(metadata.mode() & 0o7777)
}

#[cfg(not(unix))]
fn permissions_of(_metadata: &Metadata) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.rs"), "fn main() {}").unwrap();

        temp
    }

    fn deep_config(root: &Path) -> ScanConfig {
        ScanConfig::for_mode(root, dirscope_core::AnalysisMode::Deep)
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let outcome = Walker::new().scan(&deep_config(temp.path())).unwrap();

        assert_eq!(outcome.summary.total_files, 4);
        assert_eq!(outcome.summary.total_dirs, 3);
        assert_eq!(outcome.summary.max_depth, 2);
        assert!(outcome.errors.is_empty());
        assert!(outcome.is_complete());
        assert!(outcome.records.iter().all(|r| r.has_digests()));
    }

    #[test]
    fn test_sequence_numbers_are_dense_and_ordered() {
        let temp = create_test_tree();
        let outcome = Walker::new().scan(&deep_config(temp.path())).unwrap();

        let seqs: Vec<u64> = outcome.records.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..4).collect::<Vec<_>>());
    }

    #[test]
    fn test_record_depths() {
        let temp = create_test_tree();
        let outcome = Walker::new().scan(&deep_config(temp.path())).unwrap();

        let depth_of = |name: &str| {
            outcome
                .records
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.depth)
                .unwrap()
        };
        assert_eq!(depth_of("file1.txt"), 0);
        assert_eq!(depth_of("file2.txt"), 1);
        assert_eq!(depth_of("file3.txt"), 2);
    }

    #[test]
    fn test_text_metrics_only_for_text() {
        let temp = create_test_tree();
        let outcome = Walker::new().scan(&deep_config(temp.path())).unwrap();

        let file2 = outcome.records.iter().find(|r| r.name == "file2.txt").unwrap();
        assert_eq!(file2.text.words, 3);
        assert_eq!(file2.text.chars, 17);

        let code = outcome.records.iter().find(|r| r.name == "file4.rs").unwrap();
        assert_eq!(code.text, dirscope_core::TextMetrics::default());
    }

    #[test]
    fn test_invalid_utf8_text_records_decode_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.txt"), b"abc \xff\xfe").unwrap();

        let outcome = Walker::new().scan(&deep_config(temp.path())).unwrap();

        assert_eq!(outcome.summary.total_files, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::DecodeFailed);
        assert_eq!(outcome.records[0].text, dirscope_core::TextMetrics::default());
        assert!(outcome.records[0].has_digests());
    }

    #[test]
    fn test_quick_mode_skips_content() {
        let temp = create_test_tree();
        let config = ScanConfig::for_mode(temp.path(), dirscope_core::AnalysisMode::Quick);
        let outcome = Walker::new().scan(&config).unwrap();

        assert_eq!(outcome.summary.total_files, 4);
        assert!(outcome.records.iter().all(|r| !r.has_digests()));
        assert!(outcome.records.iter().all(|r| r.text.lines == 0 && r.text.words == 0));
    }

    #[test]
    fn test_invalid_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = Walker::new().scan(&deep_config(&file)).unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));

        let err = Walker::new()
            .scan(&deep_config(&temp.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
    }

    #[test]
    fn test_cancelled_before_start_returns_partial() {
        let temp = create_test_tree();
        let walker = Walker::new();
        walker.cancel();

        let outcome = walker.scan(&deep_config(temp.path())).unwrap();
        assert!(outcome.interrupted);
        assert_eq!(outcome.summary.total_files, 0);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_cancelled_partway_keeps_summary_consistent() {
        use std::sync::atomic::AtomicUsize;

        /// Raises the cancel flag once it has been asked about `limit` entries.
        #[derive(Debug)]
        struct CancelAfter {
            calls: AtomicUsize,
            limit: usize,
            flag: Arc<AtomicBool>,
        }

        impl EntryFilter for CancelAfter {
            fn is_hidden(&self, _path: &Path, name: &str) -> bool {
                if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
                    self.flag.store(true, Ordering::SeqCst);
                }
                name.starts_with('.')
            }

            fn is_system(&self, _path: &Path, _name: &str) -> bool {
                false
            }
        }

        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tree");
        for d in 0..5 {
            let dir = root.join(format!("dir{d}"));
            fs::create_dir_all(&dir).unwrap();
            for f in 0..20 {
                fs::write(dir.join(format!("f{f}.txt")), format!("{d}-{f}")).unwrap();
            }
        }

        let flag = Arc::new(AtomicBool::new(false));
        let filter = CancelAfter {
            calls: AtomicUsize::new(0),
            limit: 30,
            flag: Arc::clone(&flag),
        };
        let walker = Walker::new()
            .with_filter(Arc::new(filter))
            .with_cancel_flag(flag);

        let config = ScanConfig::for_mode(&root, dirscope_core::AnalysisMode::Standard);
        let outcome = walker.scan(&config).unwrap();

        assert!(outcome.interrupted);
        assert!(!outcome.is_complete());
        assert!(outcome.records.len() < 100);
        assert_eq!(outcome.summary.total_files, outcome.records.len() as u64);
        let seqs: Vec<u64> = outcome.records.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..outcome.records.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_vanished_file_yields_stat_error() {
        let temp = TempDir::new().unwrap();
        let pending = PendingFile {
            seq: 0,
            path: temp.path().join("gone.txt"),
            depth: 0,
        };

        let visit = visit_file(pending, &deep_config(temp.path()));

        assert!(visit.record.is_none());
        assert_eq!(visit.errors.len(), 1);
        assert_eq!(visit.errors[0].kind, ErrorKind::StatFailed);
        assert_eq!(visit.errors[0].path, temp.path().join("gone.txt"));
    }

    #[test]
    fn test_hidden_root_is_walked_in_quick_mode() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join(".cache");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join(".b.txt"), "b").unwrap();

        let config = ScanConfig::for_mode(&root, dirscope_core::AnalysisMode::Quick);
        let outcome = Walker::new().scan(&config).unwrap();

        assert_eq!(outcome.summary.total_files, 1);
        assert_eq!(outcome.records[0].name, "a.txt");
    }

    #[test]
    fn test_final_progress_snapshot() {
        let temp = create_test_tree();
        let walker = Walker::new();
        let mut rx = walker.subscribe();

        walker.scan(&deep_config(temp.path())).unwrap();

        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.files_scanned, 4);
        assert_eq!(last.dirs_scanned, 3);
    }
}
