//! Walk progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress information during a walk.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Files visited so far.
    pub files_seen: u64,
    /// Files hashed so far.
    pub files_hashed: u64,
    /// Bytes hashed so far.
    pub bytes_hashed: u64,
    /// Archives whose entries were walked.
    pub archives_opened: u64,
    /// Current path being visited.
    pub current_path: PathBuf,
    /// Number of warnings encountered.
    pub warnings_count: u64,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_seen: 0,
            files_hashed: 0,
            bytes_hashed: 0,
            archives_opened: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Hashing throughput in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    files_seen: u64,
    files_hashed: u64,
    bytes_hashed: u64,
    archives_opened: u64,
    warnings_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            files_seen: 0,
            files_hashed: 0,
            bytes_hashed: 0,
            archives_opened: 0,
            warnings_count: 0,
            current_path: PathBuf::new(),
        }
    }

    /// Record a visited file; returns the running count.
    pub fn record_seen(&mut self, path: PathBuf) -> u64 {
        self.files_seen += 1;
        self.current_path = path;
        self.files_seen
    }

    pub fn record_hashed(&mut self, size: u64) {
        self.files_hashed += 1;
        self.bytes_hashed += size;
    }

    pub fn record_archive(&mut self) {
        self.archives_opened += 1;
    }

    pub fn set_warnings(&mut self, count: usize) {
        self.warnings_count = count as u64;
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            files_seen: self.files_seen,
            files_hashed: self.files_hashed,
            bytes_hashed: self.bytes_hashed,
            archives_opened: self.archives_opened,
            current_path: self.current_path.clone(),
            warnings_count: self.warnings_count,
            elapsed: self.start_time.elapsed(),
        }
    }
}
