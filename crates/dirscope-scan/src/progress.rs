//! Snapshots broadcast by the walker while it runs.

use std::path::PathBuf;
use std::time::Duration;

/// Running totals at one point of a walk.
///
/// Snapshots are sent every few hundred files and once more, with
/// `finished` set, when the walk ends (normally or by cancellation).
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    pub files_scanned: u64,
    pub dirs_scanned: u64,
    pub bytes_scanned: u64,
    /// Most recently recorded file.
    pub current_path: PathBuf,
    pub errors_count: u64,
    /// Wall time since the walk started.
    pub elapsed: Duration,
    /// Last snapshot of the walk.
    pub finished: bool,
}

impl ScanProgress {
    /// Files and directories seen so far.
    pub fn entries_seen(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }

    pub fn files_per_second(&self) -> f64 {
        self.rate(self.files_scanned)
    }

    pub fn bytes_per_second(&self) -> f64 {
        self.rate(self.bytes_scanned)
    }

    fn rate(&self, count: u64) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { count as f64 / secs } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_are_zero_before_time_passes() {
        let progress = ScanProgress {
            files_scanned: 10,
            bytes_scanned: 512,
            ..Default::default()
        };
        assert_eq!(progress.files_per_second(), 0.0);
        assert_eq!(progress.bytes_per_second(), 0.0);
    }

    #[test]
    fn test_rates_and_entry_count() {
        let progress = ScanProgress {
            files_scanned: 100,
            dirs_scanned: 5,
            bytes_scanned: 4096,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(progress.files_per_second(), 50.0);
        assert_eq!(progress.bytes_per_second(), 2048.0);
        assert_eq!(progress.entries_seen(), 105);
    }
}
