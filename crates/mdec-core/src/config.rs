//! Inspection configuration.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::record::DigestKind;

/// Directories never descended into.
pub const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", ".git", "venv"];

/// Configuration for an inspection walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct InspectConfig {
    /// Directory or zip archive to walk.
    pub root: PathBuf,

    /// Only hash files of this category (None = every file).
    #[builder(default)]
    #[serde(default)]
    pub category: Option<Category>,

    /// Directory names pruned from the walk.
    #[builder(default = "default_skip_dirs()")]
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Glob patterns (matched against the path relative to the root) to exclude.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Also walk the entries of zip archives found in the tree.
    #[builder(default = "false")]
    #[serde(default)]
    pub scan_archives: bool,

    /// Digest used for content fingerprints.
    #[builder(default)]
    #[serde(default)]
    pub digest: DigestKind,

    /// Number of hashing threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

fn default_skip_dirs() -> Vec<String> {
    DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect()
}

impl InspectConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl InspectConfig {
    /// Create a new config builder.
    pub fn builder() -> InspectConfigBuilder {
        InspectConfigBuilder::default()
    }

    /// Create a simple config for walking a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            category: None,
            skip_dirs: default_skip_dirs(),
            exclude_patterns: Vec::new(),
            include_hidden: true,
            follow_symlinks: false,
            max_depth: None,
            scan_archives: false,
            digest: DigestKind::default(),
            threads: 0,
        }
    }

    /// Check if a directory name is pruned.
    pub fn should_skip_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check if a file of the given category passes the filter.
    pub fn accepts(&self, category: Category) -> bool {
        self.category.is_none_or(|wanted| wanted == category)
    }

    /// Whether a path names a zip archive.
    pub fn is_zip(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = InspectConfig::builder()
            .root("/archive")
            .category(Category::Code)
            .scan_archives(true)
            .threads(4usize)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/archive"));
        assert_eq!(config.category, Some(Category::Code));
        assert!(config.scan_archives);
        assert_eq!(config.threads, 4);
        assert!(config.should_skip_dir("node_modules"));
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(InspectConfig::builder().build().is_err());
        assert!(InspectConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_category_filter() {
        let mut config = InspectConfig::new("/test");
        assert!(config.accepts(Category::Media));

        config.category = Some(Category::Uncategorized);
        assert!(config.accepts(Category::Uncategorized));
        assert!(!config.accepts(Category::Documents));
    }

    #[test]
    fn test_is_zip() {
        assert!(InspectConfig::is_zip(Path::new("a/b/Backup.ZIP")));
        assert!(!InspectConfig::is_zip(Path::new("a/b/backup.tar")));
    }
}
