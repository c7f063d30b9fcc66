//! Hashed inventory produced by a walk.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::InspectConfig;
use crate::error::ScanWarning;
use crate::record::{ContentHash, FileRecord};

/// A file record together with its content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedFile {
    pub record: FileRecord,
    pub hash: ContentHash,
}

impl HashedFile {
    pub fn new(record: FileRecord, hash: ContentHash) -> Self {
        Self { record, hash }
    }
}

/// Summary statistics for a walk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryStats {
    /// Files visited, before category filtering.
    pub files_seen: u64,
    /// Files that matched the filter and were hashed.
    pub files_hashed: u64,
    /// Bytes fed through the digest.
    pub bytes_hashed: u64,
    /// Directories visited.
    pub dirs_seen: u64,
    /// Zip archives whose entries were walked.
    pub archives_opened: u64,
}

impl InventoryStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hashed file.
    pub fn record_hashed(&mut self, size: u64) {
        self.files_hashed += 1;
        self.bytes_hashed += size;
    }
}

/// The result of walking a directory tree or archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// Canonical root that was walked.
    pub root: PathBuf,

    /// Hashed files, sorted by location.
    pub files: Vec<HashedFile>,

    pub stats: InventoryStats,

    /// Configuration used for the walk.
    pub config: InspectConfig,

    /// How long the walk took.
    pub scan_duration: Duration,

    /// Non-fatal problems encountered.
    pub warnings: Vec<ScanWarning>,
}

impl Inventory {
    /// Create a new inventory.
    pub fn new(
        root: PathBuf,
        mut files: Vec<HashedFile>,
        stats: InventoryStats,
        config: InspectConfig,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        files.sort_by(|a, b| {
            a.record
                .path
                .cmp(&b.record.path)
                .then_with(|| a.record.entry.cmp(&b.record.entry))
        });
        Self {
            root,
            files,
            stats,
            config,
            scan_duration,
            warnings,
        }
    }

    /// Number of hashed files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was hashed.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
