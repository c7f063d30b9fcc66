//! Walking and content hashing for mdec.
//!
//! This crate traverses a directory tree (or a zip archive's entry list),
//! filters files by universal category and fingerprints their content.
//!
//! - **Pruned traversal** via jwalk, skipping noise directories
//! - **Zip archives** as a walk root or, optionally, nested in the tree
//! - **Streaming digests** (SHA-256 by default, BLAKE3 optional)
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use mdec_scan::{InspectConfig, Walker};
//!
//! let config = InspectConfig::new("/path/to/archive");
//! let inventory = Walker::new().walk(&config).unwrap();
//!
//! println!("Hashed {} files", inventory.len());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use mdec_scan::Walker;
//!
//! let walker = Walker::new();
//! let mut progress_rx = walker.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         eprintln!("Seen {} files", progress.files_seen);
//!     }
//! });
//! ```

mod archive;
mod hasher;
mod progress;
mod walker;

pub use hasher::{hash_bytes, hash_file, hash_reader};
pub use progress::ScanProgress;
pub use walker::Walker;

// Re-export core types for convenience
pub use mdec_core::{
    Category, ContentHash, DigestKind, FileRecord, HashedFile, InspectConfig, Inventory,
    InventoryStats, ScanError, ScanWarning, Timestamps, WarningKind,
};
