//! Analysis modes and scan configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::ScanError;

/// Named configuration preset controlling traversal depth and feature toggles.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AnalysisMode {
    Quick,
    #[default]
    Standard,
    Detailed,
    Deep,
}

/// Fixed feature set a mode expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeProfile {
    pub hash_files: bool,
    pub count_text_content: bool,
    pub check_duplicates: bool,
    /// `None` means unlimited.
    pub max_depth: Option<u32>,
    pub skip_hidden: bool,
    pub skip_system: bool,
}

/// Indexed by `AnalysisMode as usize`.
static MODE_PROFILES: [ModeProfile; 4] = [
    // quick
    ModeProfile {
        hash_files: false,
        count_text_content: false,
        check_duplicates: false,
        max_depth: Some(3),
        skip_hidden: true,
        skip_system: true,
    },
    // standard
    ModeProfile {
        hash_files: true,
        count_text_content: true,
        check_duplicates: true,
        max_depth: Some(10),
        skip_hidden: true,
        skip_system: true,
    },
    // detailed
    ModeProfile {
        hash_files: true,
        count_text_content: true,
        check_duplicates: true,
        max_depth: Some(20),
        skip_hidden: false,
        skip_system: false,
    },
    // deep
    ModeProfile {
        hash_files: true,
        count_text_content: true,
        check_duplicates: true,
        max_depth: None,
        skip_hidden: false,
        skip_system: false,
    },
];

impl AnalysisMode {
    /// The configuration tuple this mode expands to.
    pub fn profile(self) -> &'static ModeProfile {
        &MODE_PROFILES[self as usize]
    }
}

/// Configuration for a single analysis run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to analyze.
    pub root: PathBuf,

    /// Mode the remaining flags were derived from. Informational once built.
    #[builder(default)]
    #[serde(default)]
    pub mode: AnalysisMode,

    /// Compute fast and strong content digests while walking.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub hash_files: bool,

    /// Count lines, words and characters of text files.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub count_text_content: bool,

    /// Run duplicate detection after traversal.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub check_duplicates: bool,

    /// Maximum directory depth below the root (None = unlimited).
    #[builder(default = "Some(10)")]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Skip hidden files and directories.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub skip_hidden: bool,

    /// Skip platform/system files and directories.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub skip_system: bool,

    /// Follow symbolic links. When false, symlinks are skipped.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Number of worker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    /// Set every mode-controlled flag from the mode table.
    pub fn apply_mode(&mut self, mode: AnalysisMode) -> &mut Self {
        let profile = mode.profile();
        self.mode = Some(mode);
        self.hash_files = Some(profile.hash_files);
        self.count_text_content = Some(profile.count_text_content);
        self.check_duplicates = Some(profile.check_duplicates);
        self.max_depth = Some(profile.max_depth);
        self.skip_hidden = Some(profile.skip_hidden);
        self.skip_system = Some(profile.skip_system);
        self
    }

    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config for `root` with every flag taken from `mode`.
    pub fn for_mode(root: impl Into<PathBuf>, mode: AnalysisMode) -> Self {
        let profile = mode.profile();
        Self {
            root: root.into(),
            mode,
            hash_files: profile.hash_files,
            count_text_content: profile.count_text_content,
            check_duplicates: profile.check_duplicates,
            max_depth: profile.max_depth,
            skip_hidden: profile.skip_hidden,
            skip_system: profile.skip_system,
            follow_symlinks: false,
            threads: 0,
        }
    }

    /// Create a standard-mode config for a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::for_mode(root, AnalysisMode::Standard)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl From<ScanConfigBuilderError> for ScanError {
    fn from(err: ScanConfigBuilderError) -> Self {
        ScanError::InvalidConfig {
            message: err.to_string(),
        }
    }
}
