//! File records and content hashes.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Digest algorithm used to fingerprint file content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    /// SHA-256, the archive's integrity standard.
    #[default]
    Sha256,
    /// BLAKE3, faster on large trees.
    Blake3,
}

/// 32-byte content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Get the hash as an uppercase hex string (sidecar checksum format).
    pub fn to_hex_upper(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Creation and modification times of a file or archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Birth time where the platform records one, otherwise the mtime.
    pub created: DateTime<Utc>,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl Timestamps {
    pub fn new(created: DateTime<Utc>, modified: DateTime<Utc>) -> Self {
        Self { created, modified }
    }

    /// Build timestamps from filesystem metadata times.
    pub fn from_system(created: Option<SystemTime>, modified: SystemTime) -> Self {
        let modified = DateTime::<Utc>::from(modified);
        let created = created.map(DateTime::<Utc>::from).unwrap_or(modified);
        Self { created, modified }
    }

    /// Same instant for both (archive entries only carry one time).
    pub fn single(at: DateTime<Utc>) -> Self {
        Self {
            created: at,
            modified: at,
        }
    }

    /// Creation time in local time, `YYYY-MM-DD HH:MM:SS`.
    pub fn created_display(&self) -> String {
        self.created
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// A file found during a walk, either on disk or inside a zip archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File name (not full path).
    pub name: CompactString,

    /// Path on disk. For archive entries this is the archive itself.
    pub path: PathBuf,

    /// Entry name inside the archive, if this record lives in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<CompactString>,

    /// Size in bytes (uncompressed for archive entries).
    pub size: u64,

    pub timestamps: Timestamps,

    pub category: Category,
}

impl FileRecord {
    /// Record for a plain file on disk.
    pub fn on_disk(path: impl Into<PathBuf>, size: u64, timestamps: Timestamps) -> Self {
        let path = path.into();
        let name = file_name_of(&path);
        let category = Category::for_path(&path);
        Self {
            name,
            path,
            entry: None,
            size,
            timestamps,
            category,
        }
    }

    /// Record for an entry inside an archive.
    pub fn in_archive(
        archive: impl Into<PathBuf>,
        entry: impl Into<CompactString>,
        size: u64,
        timestamps: Timestamps,
    ) -> Self {
        let entry = entry.into();
        let entry_path = Path::new(entry.as_str());
        let name = file_name_of(entry_path);
        let category = Category::for_path(entry_path);
        Self {
            name,
            path: archive.into(),
            entry: Some(entry),
            size,
            timestamps,
            category,
        }
    }

    /// Whether the record lives inside an archive.
    pub fn is_archive_entry(&self) -> bool {
        self.entry.is_some()
    }

    /// Human-readable location: the path, or `archive!entry`.
    pub fn location(&self) -> String {
        match &self.entry {
            Some(entry) => format!("{}!{}", self.path.display(), entry),
            None => self.path.display().to_string(),
        }
    }
}

fn file_name_of(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}
