//! Error types for minting, the ledger and engram emission.

use std::path::PathBuf;

use mdec_core::ScanError;
use thiserror::Error;

/// Errors from identity minting and ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Date of birth in none of the accepted layouts.
    #[error("Invalid date of birth {value:?} (expected YYYY-MM-DD, MM-DD-YYYY, MM/DD/YYYY or YYYY/MM/DD)")]
    InvalidDob { value: String },

    /// A file the operation needs does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger exists but is not a valid ledger document.
    #[error("Ledger {path} is corrupt: {source}")]
    CorruptLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest is not valid JSON or has the wrong shape.
    #[error("Invalid manifest {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest holds no items.
    #[error("Manifest {path} is empty")]
    EmptyManifest { path: PathBuf },

    /// Serializing a document failed.
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The integrity checksum could not be computed.
    #[error("Checksum failed: {0}")]
    Checksum(#[from] ScanError),
}

impl LedgerError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}
