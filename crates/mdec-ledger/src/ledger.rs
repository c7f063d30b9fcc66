//! The append-only M-ID ledger.
//!
//! The ledger is a JSON document `{"_meta": ..., "entries": {M-ID: record}}`
//! written with a four-space indent. Entries keep their insertion order and
//! are never overwritten once bound.

use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::io::{to_pretty_json, write_atomic};
use crate::signet::{Signet, SignetComponents};

/// Header written into a new ledger.
pub const LEDGER_META: &str = "MDEC IMMUTABLE LEDGER v1";

/// What an M-ID is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub signet: Option<String>,

    /// When the binding was made (or the manifest item generated).
    pub timestamp: Option<String>,

    /// Identity fields, for minted entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<SignetComponents>,

    /// Relative path of the asset, for ingested entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,

    /// Which process committed an ingested entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,

    /// Fields written by other tools, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerRecord {
    /// Record for a freshly minted Signet.
    pub fn minted(signet: &Signet, components: SignetComponents) -> Self {
        Self {
            signet: Some(signet.to_string()),
            timestamp: Some(Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
            components: Some(components),
            file_ref: None,
            provenance: None,
            extra: Map::new(),
        }
    }
}

/// Outcome of [`Ledger::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The M-ID was new and is now bound.
    Bound,
    /// The M-ID was already bound; the existing record is untouched.
    AlreadyBound { existing_signet: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerDocument {
    #[serde(rename = "_meta", default = "default_meta")]
    meta: String,

    #[serde(default)]
    entries: IndexMap<String, LedgerRecord>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn default_meta() -> String {
    LEDGER_META.to_string()
}

impl Default for LedgerDocument {
    fn default() -> Self {
        Self {
            meta: default_meta(),
            entries: IndexMap::new(),
            extra: Map::new(),
        }
    }
}

/// An M-ID ledger backed by a JSON file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    document: LedgerDocument,
}

impl Ledger {
    /// Open a ledger, starting empty when the file does not exist.
    ///
    /// A file that exists but cannot be parsed is an error; it is never
    /// replaced with an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let document = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| {
                LedgerError::CorruptLedger {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Starting new ledger");
                LedgerDocument::default()
            }
            Err(e) => return Err(LedgerError::io(&path, e)),
        };
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> &str {
        &self.document.meta
    }

    pub fn len(&self) -> usize {
        self.document.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.entries.is_empty()
    }

    pub fn contains(&self, mid: &str) -> bool {
        self.document.entries.contains_key(mid)
    }

    pub fn get(&self, mid: &str) -> Option<&LedgerRecord> {
        self.document.entries.get(mid)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LedgerRecord)> {
        self.document.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bind an M-ID to a record unless it is already bound.
    pub fn bind(&mut self, mid: impl Into<String>, record: LedgerRecord) -> Binding {
        let mid = mid.into();
        if let Some(existing) = self.document.entries.get(&mid) {
            debug!(mid = %mid, "M-ID already bound");
            return Binding::AlreadyBound {
                existing_signet: existing.signet.clone(),
            };
        }
        info!(mid = %mid, signet = ?record.signet, "Binding M-ID");
        self.document.entries.insert(mid, record);
        Binding::Bound
    }

    /// Write the ledger back to its file atomically.
    pub fn save(&self) -> Result<(), LedgerError> {
        let bytes = to_pretty_json(&self.document, &self.path)?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), entries = self.len(), "Ledger saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn components() -> SignetComponents {
        SignetComponents {
            name: "Ada Lovelace".into(),
            dob: "1815-12-10".into(),
            epoch: "18xx".into(),
            vocation: "mathematician".into(),
            origin: "uk".into(),
        }
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let ledger = Ledger::open(temp.path().join("ledger.json")).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.meta(), LEDGER_META);
    }

    #[test]
    fn test_bind_is_append_only() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::open(temp.path().join("ledger.json")).unwrap();
        let signet = components().mint().unwrap();
        let mid = signet.mid().to_string();

        assert_eq!(
            ledger.bind(&mid, LedgerRecord::minted(&signet, components())),
            Binding::Bound
        );

        let mut impostor = LedgerRecord::minted(&signet, components());
        impostor.signet = Some("someone-else".into());
        assert_eq!(
            ledger.bind(&mid, impostor),
            Binding::AlreadyBound {
                existing_signet: Some(signet.to_string())
            }
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(&mid).unwrap().signet.as_deref(), Some(signet.as_str()));
    }

    #[test]
    fn test_save_and_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/ledger.json");
        let mut ledger = Ledger::open(&path).unwrap();
        for name in ["zeta", "alpha", "mu"] {
            let mut record = LedgerRecord::minted(&components().mint().unwrap(), components());
            record.signet = Some(name.to_string());
            ledger.bind(name, record);
        }
        ledger.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"_meta\": "));

        let reopened = Ledger::open(&path).unwrap();
        let keys: Vec<&str> = reopened.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.json");
        std::fs::write(
            &path,
            r#"{"_meta": "LEGACY", "entries": {"abc": {"signet": "s", "timestamp": null, "quality_score": 91}}, "owner": "vault"}"#,
        )
        .unwrap();

        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.meta(), "LEGACY");
        assert_eq!(ledger.get("abc").unwrap().extra["quality_score"], 91);
        ledger.save().unwrap();

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["owner"], "vault");
        assert_eq!(saved["entries"]["abc"]["quality_score"], 91);
    }

    #[test]
    fn test_corrupt_ledger_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Ledger::open(&path),
            Err(LedgerError::CorruptLedger { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
