//! Hidden and system entry detection.
//!
//! The walker only asks an [`EntryFilter`] two questions per entry, so all
//! platform-specific attribute handling lives behind this trait.

use std::fmt::Debug;
use std::path::Path;

/// File names treated as system metadata on every platform (compared
/// case-insensitively).
pub const SYSTEM_FILE_NAMES: &[&str] = &["thumbs.db", ".ds_store", "desktop.ini"];

/// Predicate deciding whether an entry is hidden or a system entry.
pub trait EntryFilter: Debug + Send + Sync {
    /// Whether the entry is hidden.
    fn is_hidden(&self, path: &Path, name: &str) -> bool;

    /// Whether the entry is a platform/system entry.
    fn is_system(&self, path: &Path, name: &str) -> bool;
}

/// Which filters the walker applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterPolicy {
    pub skip_hidden: bool,
    pub skip_system: bool,
}

impl FilterPolicy {
    /// Whether an entry should be excluded. Applies to files and directories
    /// alike; an excluded directory is never descended into.
    pub fn excludes(&self, filter: &dyn EntryFilter, path: &Path, name: &str) -> bool {
        (self.skip_hidden && filter.is_hidden(path, name))
            || (self.skip_system && filter.is_system(path, name))
    }

    pub fn is_active(&self) -> bool {
        self.skip_hidden || self.skip_system
    }
}

/// Default filter for the host platform.
///
/// Hidden means a leading `.` everywhere, plus the hidden attribute on
/// Windows. System means a well-known metadata file name, plus the system
/// attribute on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformFilter;

impl EntryFilter for PlatformFilter {
    fn is_hidden(&self, path: &Path, name: &str) -> bool {
        name.starts_with('.') || attributes::is_hidden(path)
    }

    fn is_system(&self, path: &Path, name: &str) -> bool {
        SYSTEM_FILE_NAMES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(name))
            || attributes::is_system(path)
    }
}

#[cfg(windows)]
mod attributes {
    use std::os::windows::fs::MetadataExt;
    use std::path::Path;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;

    fn has_attribute(path: &Path, mask: u32) -> bool {
        std::fs::symlink_metadata(path)
            .map(|m| m.file_attributes() & mask != 0)
            .unwrap_or(false)
    }

    pub fn is_hidden(path: &Path) -> bool {
        has_attribute(path, FILE_ATTRIBUTE_HIDDEN)
    }

    pub fn is_system(path: &Path) -> bool {
        has_attribute(path, FILE_ATTRIBUTE_SYSTEM)
    }
}

#[cfg(not(windows))]
mod attributes {
    use std::path::Path;

    pub fn is_hidden(_path: &Path) -> bool {
        false
    }

    pub fn is_system(_path: &Path) -> bool {
        false
    }
}
