//! Error types for walking and hashing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during a walk.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip archive could not be read.
    #[error("Archive error at {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root is neither a directory nor a zip archive.
    #[error("Root path is not a directory or zip archive: {path}")]
    InvalidRoot { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an archive error with path context.
    pub fn archive(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory entry.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// A nested archive could not be opened or read.
    ArchiveError,
    /// File content could not be hashed.
    HashError,
}

/// Non-fatal warning encountered during a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning from a walk or hashing error.
    pub fn from_error(error: &ScanError, fallback: WarningKind) -> Self {
        let (path, kind) = match error {
            ScanError::PermissionDenied { path } => (path.clone(), WarningKind::PermissionDenied),
            ScanError::NotFound { path } | ScanError::Io { path, .. } => (path.clone(), fallback),
            ScanError::Archive { path, .. } | ScanError::InvalidRoot { path } => {
                (path.clone(), WarningKind::ArchiveError)
            }
            ScanError::InvalidConfig { .. } => (PathBuf::new(), fallback),
        };
        Self {
            path,
            message: error.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
    }

    #[test]
    fn test_warning_from_archive_error() {
        let err = ScanError::archive("/tmp/broken.zip", "invalid Zip archive");
        let warning = ScanWarning::from_error(&err, WarningKind::ReadError);
        assert_eq!(warning.kind, WarningKind::ArchiveError);
        assert!(warning.message.contains("broken.zip"));
    }
}
