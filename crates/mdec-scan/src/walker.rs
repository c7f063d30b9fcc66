//! JWalk-based directory walker.

use std::path::{Path, PathBuf};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use mdec_core::{
    FileRecord, HashedFile, InspectConfig, Inventory, InventoryStats, ScanError, ScanWarning,
    Timestamps, WarningKind,
};

use crate::archive::{self, ArchiveWalk};
use crate::hasher::hash_file;
use crate::progress::{ProgressTracker, ScanProgress};

/// Send a progress snapshot every this many visited files.
const PROGRESS_EVERY: u64 = 1000;

/// Walks a directory tree or zip archive and fingerprints matching files.
pub struct Walker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Walker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk the configured root and hash every file that passes the filters.
    pub fn walk(&self, config: &InspectConfig) -> Result<Inventory, ScanError> {
        let start = Instant::now();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;
        let filters = Filters::new(config, &root)?;

        let mut stats = InventoryStats::new();
        let mut warnings = Vec::new();
        let mut tracker = ProgressTracker::new();

        info!(root = %root.display(), category = ?config.category, "Walk started");

        let files = if root.is_dir() {
            let (candidates, archives) =
                self.collect_candidates(&filters, &root, &mut stats, &mut warnings, &mut tracker);

            let mut files = hash_candidates(candidates, config, &mut warnings)?;

            for archive_path in archives {
                match archive::walk_zip(&archive_path, &filters) {
                    Ok(walk) => {
                        tracker.record_archive();
                        absorb_archive(walk, &mut files, &mut stats, &mut warnings);
                    }
                    Err(err) => {
                        warn!(archive = %archive_path.display(), error = %err, "Skipping unreadable archive");
                        warnings.push(ScanWarning::from_error(&err, WarningKind::ArchiveError));
                    }
                }
            }
            files
        } else if root.is_file() && InspectConfig::is_zip(&root) {
            let walk = archive::walk_zip(&root, &filters)?;
            tracker.record_archive();
            let mut files = Vec::new();
            absorb_archive(walk, &mut files, &mut stats, &mut warnings);
            files
        } else {
            return Err(ScanError::InvalidRoot { path: root });
        };

        for file in &files {
            stats.record_hashed(file.record.size);
            tracker.record_hashed(file.record.size);
        }
        tracker.set_warnings(warnings.len());
        let _ = self.progress_tx.send(tracker.snapshot());

        let scan_duration = start.elapsed();
        info!(
            files_seen = stats.files_seen,
            files_hashed = stats.files_hashed,
            warnings = warnings.len(),
            elapsed_ms = scan_duration.as_millis() as u64,
            "Walk complete"
        );

        Ok(Inventory::new(
            root,
            files,
            stats,
            config.clone(),
            scan_duration,
            warnings,
        ))
    }

    /// Collect matching files and nested archives using jwalk.
    fn collect_candidates(
        &self,
        filters: &Filters<'_>,
        root: &Path,
        stats: &mut InventoryStats,
        warnings: &mut Vec<ScanWarning>,
        tracker: &mut ProgressTracker,
    ) -> (Vec<FileRecord>, Vec<PathBuf>) {
        let config = filters.config;
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let skip_dirs = config.skip_dirs.clone();
        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .sort(true)
            .min_depth(1)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|entry| match entry {
                    Ok(e) => {
                        !(e.file_type().is_dir()
                            && e.file_name()
                                .to_str()
                                .is_some_and(|n| skip_dirs.iter().any(|d| d == n)))
                    }
                    Err(_) => true,
                });
            });

        let mut candidates = Vec::new();
        let mut archives = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                stats.dirs_seen += 1;
                continue;
            }
            if !file_type.is_file() && !(config.follow_symlinks && path.is_file()) {
                continue;
            }
            if filters.is_excluded(&path) {
                debug!(path = %path.display(), "Excluded by pattern");
                continue;
            }

            stats.files_seen += 1;
            if tracker.record_seen(path.clone()) % PROGRESS_EVERY == 0 {
                tracker.set_warnings(warnings.len());
                let _ = self.progress_tx.send(tracker.snapshot());
            }

            if config.scan_archives && InspectConfig::is_zip(&path) {
                archives.push(path.clone());
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            let timestamps = Timestamps::from_system(
                metadata.created().ok(),
                metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
            );
            let record = FileRecord::on_disk(path, metadata.len(), timestamps);

            if config.accepts(record.category) {
                candidates.push(record);
            }
        }

        (candidates, archives)
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters shared by the directory and archive walks.
pub(crate) struct Filters<'a> {
    pub config: &'a InspectConfig,
    root: &'a Path,
    excludes: GlobSet,
}

impl<'a> Filters<'a> {
    fn new(config: &'a InspectConfig, root: &'a Path) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("Bad exclude pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let excludes = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;
        Ok(Self {
            config,
            root,
            excludes,
        })
    }

    /// Match a disk path (relative to the root) against the exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.excludes.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(self.root).unwrap_or(path);
        self.excludes.is_match(relative)
            || path
                .file_name()
                .is_some_and(|name| self.excludes.is_match(Path::new(name)))
    }

    /// Whether an archive entry path should be skipped.
    pub fn skips_entry(&self, entry: &str) -> bool {
        let components: Vec<&str> = entry.split('/').filter(|c| !c.is_empty()).collect();
        let Some((_, dirs)) = components.split_last() else {
            return true;
        };
        if dirs.iter().any(|d| self.config.should_skip_dir(d)) {
            return true;
        }
        if components.iter().any(|c| self.config.should_skip_hidden(c)) {
            return true;
        }
        !self.excludes.is_empty()
            && (self.excludes.is_match(entry)
                || components
                    .last()
                    .is_some_and(|name| self.excludes.is_match(name)))
    }
}

/// Hash candidate files in parallel. Files that fail to hash become warnings.
fn hash_candidates(
    candidates: Vec<FileRecord>,
    config: &InspectConfig,
    warnings: &mut Vec<ScanWarning>,
) -> Result<Vec<HashedFile>, ScanError> {
    let digest = config.digest;
    let run = move || -> Vec<Result<HashedFile, ScanError>> {
        candidates
            .into_par_iter()
            .map(|record| {
                let (hash, _) = hash_file(&record.path, digest)?;
                Ok(HashedFile::new(record, hash))
            })
            .collect()
    };

    let results = match config.threads {
        0 => run(),
        n => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| ScanError::InvalidConfig {
                message: e.to_string(),
            })?
            .install(run),
    };

    let mut files = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(file) => files.push(file),
            Err(err) => {
                warn!(error = %err, "Skipping file that could not be hashed");
                warnings.push(ScanWarning::from_error(&err, WarningKind::HashError));
            }
        }
    }
    Ok(files)
}

fn absorb_archive(
    walk: ArchiveWalk,
    files: &mut Vec<HashedFile>,
    stats: &mut InventoryStats,
    warnings: &mut Vec<ScanWarning>,
) {
    stats.archives_opened += 1;
    stats.files_seen += walk.entries_seen;
    files.extend(walk.files);
    warnings.extend(walk.warnings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdec_core::Category;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("docs/sub")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        fs::write(root.join("readme.md"), "hello").unwrap();
        fs::write(root.join("docs/notes.txt"), "hello").unwrap();
        fs::write(root.join("docs/sub/script.py"), "print(1)").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::write(root.join("photo.jpg"), [0xffu8, 0xd8, 0xff]).unwrap();

        temp
    }

    #[test]
    fn test_walk_prunes_noise_directories() {
        let temp = create_test_tree();
        let inventory = Walker::new().walk(&InspectConfig::new(temp.path())).unwrap();

        assert_eq!(inventory.len(), 4);
        assert!(inventory
            .files
            .iter()
            .all(|f| !f.record.location().contains("node_modules") && !f.record.location().contains(".git")));
    }

    #[test]
    fn test_walk_filters_by_category() {
        let temp = create_test_tree();
        let config = InspectConfig::builder()
            .root(temp.path())
            .category(Category::Documents)
            .build()
            .unwrap();

        let inventory = Walker::new().walk(&config).unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.stats.files_seen, 4);
        assert_eq!(inventory.files[0].hash, inventory.files[1].hash);
    }

    #[test]
    fn test_exclude_patterns() {
        let temp = create_test_tree();
        let config = InspectConfig::builder()
            .root(temp.path())
            .exclude_patterns(vec!["*.py".to_string(), "docs/*.txt".to_string()])
            .build()
            .unwrap();

        let inventory = Walker::new().walk(&config).unwrap();
        let names: Vec<&str> = inventory.files.iter().map(|f| f.record.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"readme.md"));
        assert!(names.contains(&"photo.jpg"));
    }

    #[test]
    fn test_invalid_root() {
        let temp = create_test_tree();
        let config = InspectConfig::new(temp.path().join("readme.md"));
        let err = Walker::new().walk(&config).unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
    }

    #[test]
    fn test_bad_exclude_pattern() {
        let temp = create_test_tree();
        let config = InspectConfig::builder()
            .root(temp.path())
            .exclude_patterns(vec!["a[".to_string()])
            .build()
            .unwrap();
        let err = Walker::new().walk(&config).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig { .. }));
    }

    #[test]
    fn test_progress_snapshot_sent() {
        let temp = create_test_tree();
        let walker = Walker::new();
        let mut rx = walker.subscribe();
        walker.walk(&InspectConfig::new(temp.path())).unwrap();

        let progress = rx.try_recv().unwrap();
        assert_eq!(progress.files_hashed, 4);
    }
}
