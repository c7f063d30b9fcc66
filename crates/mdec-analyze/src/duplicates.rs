//! Duplicate grouping and provenance ranking.
//!
//! Records from an [`Inventory`] are grouped by content hash. Within a group
//! the oldest copy (by creation time) is the primary; the rest are copies.
//! Groups are ordered by their primary's creation time so the oldest lineage
//! comes first.

use std::collections::HashMap;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use mdec_core::{ContentHash, FileRecord, HashedFile, Inventory};

/// Configuration for duplicate grouping.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Drop groups with a single member.
    #[builder(default = "false")]
    #[serde(default)]
    pub duplicates_only: bool,

    /// Ignore files smaller than this.
    #[builder(default = "0")]
    #[serde(default)]
    pub min_size: u64,

    /// Maximum number of groups to return (0 = unlimited).
    #[builder(default = "0")]
    #[serde(default)]
    pub max_groups: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            duplicates_only: false,
            min_size: 0,
            max_groups: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// Files sharing the same content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all members.
    pub hash: ContentHash,

    /// Size of each member in bytes.
    pub size: u64,

    /// Members, oldest first. The first is the primary.
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// The oldest member.
    pub fn primary(&self) -> &FileRecord {
        &self.members[0]
    }

    /// Every member after the primary.
    pub fn copies(&self) -> &[FileRecord] {
        &self.members[1..]
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Whether the content exists more than once.
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }

    /// Bytes held by the copies.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.copies().len() as u64
    }
}

/// Results of duplicate grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups ordered by their primary's creation time.
    pub groups: Vec<DuplicateGroup>,

    /// Files considered.
    pub total_objects: u64,

    /// Distinct content hashes.
    pub unique_signatures: u64,

    /// `total_objects - unique_signatures`.
    pub redundant_copies: u64,

    /// Bytes that removing every copy would free.
    pub reclaimable_bytes: u64,
}

impl DuplicateReport {
    /// Check if any content exists more than once.
    pub fn has_duplicates(&self) -> bool {
        self.redundant_copies > 0
    }

    /// Groups with more than one member.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|g| g.is_duplicate())
    }
}

/// Groups an inventory by content.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Group and rank the files of an inventory.
    pub fn find_duplicates(&self, inventory: &Inventory) -> DuplicateReport {
        self.group(inventory.files.iter())
    }

    /// Group and rank any set of hashed files.
    pub fn group<'a>(&self, files: impl IntoIterator<Item = &'a HashedFile>) -> DuplicateReport {
        let mut by_hash: HashMap<ContentHash, Vec<FileRecord>> = HashMap::new();
        let mut total_objects = 0u64;
        for file in files {
            if file.record.size < self.config.min_size {
                continue;
            }
            total_objects += 1;
            by_hash.entry(file.hash).or_default().push(file.record.clone());
        }

        let unique_signatures = by_hash.len() as u64;
        let redundant_copies = total_objects - unique_signatures;

        let mut groups: Vec<DuplicateGroup> = by_hash
            .into_iter()
            .map(|(hash, mut members)| {
                members.sort_by(|a, b| {
                    a.timestamps
                        .created
                        .cmp(&b.timestamps.created)
                        .then_with(|| a.location().cmp(&b.location()))
                });
                let size = members[0].size;
                DuplicateGroup {
                    hash,
                    size,
                    members,
                }
            })
            .collect();

        let reclaimable_bytes = groups.iter().map(DuplicateGroup::wasted_bytes).sum();

        if self.config.duplicates_only {
            groups.retain(DuplicateGroup::is_duplicate);
        }

        groups.sort_by(|a, b| {
            a.primary()
                .timestamps
                .created
                .cmp(&b.primary().timestamps.created)
                .then_with(|| a.hash.cmp(&b.hash))
        });

        if self.config.max_groups > 0 {
            groups.truncate(self.config.max_groups);
        }

        DuplicateReport {
            groups,
            total_objects,
            unique_signatures,
            redundant_copies,
            reclaimable_bytes,
        }
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mdec_core::Timestamps;

    fn file(path: &str, content: u8, size: u64, year: i32) -> HashedFile {
        let at = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        HashedFile::new(
            FileRecord::on_disk(path, size, Timestamps::single(at)),
            ContentHash::new([content; 32]),
        )
    }

    #[test]
    fn test_primary_is_oldest() {
        let files = vec![
            file("/b/copy.txt", 1, 10, 2020),
            file("/a/original.txt", 1, 10, 2001),
            file("/c/later.txt", 1, 10, 2015),
        ];
        let report = DuplicateFinder::new().group(&files);

        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.primary().name, "original.txt");
        let copies: Vec<&str> = group.copies().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(copies, ["later.txt", "copy.txt"]);
        assert_eq!(group.wasted_bytes(), 20);
    }

    #[test]
    fn test_groups_ordered_by_primary_age() {
        let files = vec![
            file("/new.txt", 1, 5, 2022),
            file("/old.txt", 2, 5, 1999),
            file("/old-copy.txt", 2, 5, 2023),
            file("/mid.txt", 3, 5, 2010),
        ];
        let report = DuplicateFinder::new().group(&files);

        let primaries: Vec<&str> = report.groups.iter().map(|g| g.primary().name.as_str()).collect();
        assert_eq!(primaries, ["old.txt", "mid.txt", "new.txt"]);
        assert_eq!(report.total_objects, 4);
        assert_eq!(report.unique_signatures, 3);
        assert_eq!(report.redundant_copies, 1);
        assert_eq!(report.reclaimable_bytes, 5);
    }

    #[test]
    fn test_tie_breaks_on_location() {
        let files = vec![file("/z.txt", 1, 5, 2000), file("/a.txt", 1, 5, 2000)];
        let report = DuplicateFinder::new().group(&files);
        assert_eq!(report.groups[0].primary().name, "a.txt");
    }

    #[test]
    fn test_config_filters() {
        let files = vec![
            file("/tiny.txt", 1, 1, 2000),
            file("/tiny-copy.txt", 1, 1, 2001),
            file("/big.txt", 2, 100, 2000),
            file("/big-copy.txt", 2, 100, 2001),
            file("/solo.txt", 3, 100, 2002),
        ];

        let config = DuplicateConfig::builder()
            .duplicates_only(true)
            .min_size(10u64)
            .build()
            .unwrap();
        let report = DuplicateFinder::with_config(config).group(&files);

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].primary().name, "big.txt");
        assert_eq!(report.total_objects, 3);
        assert_eq!(report.unique_signatures, 2);

        let capped = DuplicateConfig::builder().max_groups(2usize).build().unwrap();
        let report = DuplicateFinder::with_config(capped).group(&files);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.total_objects, 5);
    }

    #[test]
    fn test_empty() {
        let report = DuplicateFinder::new().group(&Vec::<HashedFile>::new());
        assert!(report.groups.is_empty());
        assert!(!report.has_duplicates());
        assert_eq!(report.total_objects, 0);
    }
}
