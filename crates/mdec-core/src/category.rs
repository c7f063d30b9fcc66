//! The universal category table.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error;

/// One of the ten universal category pillars.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Category {
    Documents,
    Media,
    Data,
    Code,
    Archives,
    Assets,
    Communications,
    References,
    Uncategorized,
    System,
}

/// Returned when a category code is not in the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category code: {0}")]
pub struct ParseCategoryError(pub String);

impl Category {
    /// Two-digit category code.
    pub fn code(self) -> &'static str {
        match self {
            Category::Documents => "01",
            Category::Media => "02",
            Category::Data => "03",
            Category::Code => "04",
            Category::Archives => "05",
            Category::Assets => "06",
            Category::Communications => "07",
            Category::References => "08",
            Category::Uncategorized => "09",
            Category::System => "99",
        }
    }

    /// Extensions (without the leading dot) mapped to this category.
    ///
    /// `Uncategorized` owns no extensions; it is the fallback.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Category::Documents => &["txt", "md", "pdf", "doc", "docx", "epub", "h", "c"],
            Category::Media => &["jpg", "png", "gif", "mp4", "wav", "mp3", "flac"],
            Category::Data => &["json", "csv", "xml", "yaml", "sql"],
            Category::Code => &["py", "js", "ts", "ps1", "sh", "bat", "html", "css"],
            Category::Archives => &["zip", "tar", "gz", "rar", "7z", "iso"],
            Category::Assets => &["psd", "ai", "obj", "fbx", "blend", "unitypackage"],
            Category::Communications => &["eml", "msg", "vcf"],
            Category::References => &["lnk", "url"],
            Category::Uncategorized => &[],
            Category::System => &["dll", "sys", "dat", "db", "exe", "bin"],
        }
    }

    /// Look up a category by its code.
    pub fn from_code(code: &str) -> Result<Self, ParseCategoryError> {
        let code = code.trim();
        Category::iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| ParseCategoryError(code.to_string()))
    }

    /// Map a file extension to its category.
    ///
    /// Case-insensitive, the leading dot is optional. Empty or unknown
    /// extensions map to [`Category::Uncategorized`].
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            return Category::Uncategorized;
        }
        Category::iter()
            .find(|c| c.extensions().contains(&ext.as_str()))
            .unwrap_or(Category::Uncategorized)
    }

    /// Categorize a path by its extension.
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Category::Uncategorized)
    }

    /// All categories in code order.
    pub fn all() -> impl Iterator<Item = Category> {
        Category::iter()
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        assert_eq!(Category::from_extension(".PDF"), Category::Documents);
        assert_eq!(Category::from_extension("Mp3"), Category::Media);
        assert_eq!(Category::from_extension(".blend"), Category::Assets);
    }

    #[test]
    fn test_unknown_extension_is_uncategorized() {
        assert_eq!(Category::from_extension(".xyz"), Category::Uncategorized);
        assert_eq!(Category::from_extension(""), Category::Uncategorized);
        assert_eq!(Category::for_path(Path::new("Makefile")), Category::Uncategorized);
    }

    #[test]
    fn test_for_path_uses_last_extension() {
        assert_eq!(Category::for_path(Path::new("backup.tar.gz")), Category::Archives);
        assert_eq!(Category::for_path(Path::new("/a/b/lib.c")), Category::Documents);
    }

    #[test]
    fn test_code_round_trip() {
        for category in Category::all() {
            assert_eq!(Category::from_code(category.code()).unwrap(), category);
        }
        assert!(Category::from_code("42").is_err());
        assert_eq!("99".parse::<Category>().unwrap(), Category::System);
    }
}
