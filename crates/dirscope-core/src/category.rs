//! Extension-based file classification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Semantic file-type class derived from a file's extension.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum Category {
    Text,
    Image,
    Video,
    Audio,
    Archive,
    Document,
    Code,
    Executable,
    System,
    Other,
}

const TEXT: &[&str] = &[
    ".txt", ".md", ".rtf", ".log", ".csv", ".json", ".xml", ".yaml", ".yml", ".ini", ".cfg",
    ".conf",
];
const IMAGE: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".svg", ".webp", ".ico", ".psd",
];
const VIDEO: &[&str] = &[
    ".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm", ".m4v", ".mpg", ".mpeg",
];
const AUDIO: &[&str] = &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".aiff"];
const ARCHIVE: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz", ".tbz2"];
const DOCUMENT: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp",
];
const CODE: &[&str] = &[
    ".py", ".js", ".java", ".cpp", ".c", ".h", ".cs", ".php", ".html", ".css", ".rb", ".go",
    ".rs", ".swift",
];
const EXECUTABLE: &[&str] = &[
    ".exe", ".dll", ".so", ".dylib", ".sh", ".bat", ".cmd", ".app", ".msi",
];
const SYSTEM: &[&str] = &[
    ".sys", ".dll", ".drv", ".vxd", ".ocx", ".cpl", ".tmp", ".temp", ".log", ".bak",
];

/// Lookup table in precedence order. Some extensions appear in more than one
/// set (`.log`, `.dll`); the first matching set wins.
static EXTENSION_SETS: [(Category, &[&str]); 9] = [
    (Category::Text, TEXT),
    (Category::Image, IMAGE),
    (Category::Video, VIDEO),
    (Category::Audio, AUDIO),
    (Category::Archive, ARCHIVE),
    (Category::Document, DOCUMENT),
    (Category::Code, CODE),
    (Category::Executable, EXECUTABLE),
    (Category::System, SYSTEM),
];

impl Category {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Map an extension (with leading dot, e.g. `.txt`) to its category.
///
/// Matching is ASCII case-insensitive. An empty or unknown extension maps to
/// [`Category::Other`].
pub fn classify(extension: &str) -> Category {
    if extension.is_empty() {
        return Category::Other;
    }

    EXTENSION_SETS
        .iter()
        .find(|(_, set)| set.iter().any(|ext| ext.eq_ignore_ascii_case(extension)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Derive the lowercased extension (including the dot) from a file name.
///
/// Names without a dot, and dotfiles such as `.bashrc`, have no extension.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) if idx + 1 == name.len() => String::new(),
        Some(idx) => name[idx..].to_ascii_lowercase(),
    }
}
