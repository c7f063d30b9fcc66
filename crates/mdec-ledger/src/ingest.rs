//! Committing an ingestion manifest to the ledger.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::LedgerError;
use crate::ledger::{Binding, Ledger, LedgerRecord};

/// Provenance recorded on entries committed from a manifest.
pub const INGEST_PROVENANCE: &str = "MDEC_INGESTION_WORKER";

/// One asset described by the ingestion manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestItem {
    #[serde(rename = "m-id", default, deserialize_with = "scalar_string")]
    pub mid: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub signet_creator: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub generated_at: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub relative_path: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub file_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept any JSON value as text: numbers and booleans are rendered, null is absent.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

impl ManifestItem {
    fn to_record(&self) -> LedgerRecord {
        LedgerRecord {
            signet: self.signet_creator.clone(),
            timestamp: self.generated_at.clone(),
            components: None,
            file_ref: self.relative_path.clone(),
            provenance: Some(INGEST_PROVENANCE.to_string()),
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestShape {
    Many(Vec<ManifestItem>),
    One(Box<ManifestItem>),
}

/// Read a manifest: a JSON list of items, or a single item object.
///
/// A missing or empty manifest is an error.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestItem>, LedgerError> {
    let text = std::fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
    let invalid = |source| LedgerError::InvalidManifest {
        path: path.to_path_buf(),
        source,
    };

    let raw: Value = serde_json::from_str(&text).map_err(invalid)?;
    let is_empty = match &raw {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(LedgerError::EmptyManifest {
            path: path.to_path_buf(),
        });
    }

    let items = match serde_json::from_value(raw).map_err(invalid)? {
        ManifestShape::Many(items) => items,
        ManifestShape::One(item) => vec![*item],
    };
    Ok(items)
}

/// Commit every item whose M-ID is not yet in the ledger.
///
/// Items without an M-ID are skipped. Returns the committed items.
pub fn ingest(ledger: &mut Ledger, items: &[ManifestItem]) -> Vec<ManifestItem> {
    let mut committed = Vec::new();
    for item in items {
        let Some(mid) = item.mid.as_deref().filter(|m| !m.is_empty()) else {
            continue;
        };
        if ledger.bind(mid, item.to_record()) == Binding::Bound {
            info!(
                mid = %mid,
                file = item.file_name.as_deref().unwrap_or("N/A"),
                "Ledger update"
            );
            committed.push(item.clone());
        }
    }
    committed
}

/// Read a manifest, commit it, and save the ledger.
pub fn ingest_manifest(manifest: &Path, ledger: &mut Ledger) -> Result<Vec<ManifestItem>, LedgerError> {
    let items = read_manifest(manifest)?;
    let committed = ingest(ledger, &items);
    ledger.save()?;
    info!(
        manifest = %manifest.display(),
        committed = committed.len(),
        "Manifest ingested"
    );
    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(mid: Option<&str>, name: &str) -> ManifestItem {
        ManifestItem {
            mid: mid.map(str::to_string),
            signet_creator: Some("Ada-12-10-1815-18xx-Poet-UK".into()),
            generated_at: Some("2024-05-01T10:00:00".into()),
            relative_path: Some(format!("vault/{name}")),
            file_name: Some(name.into()),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_ingest_skips_known_and_blank() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::open(temp.path().join("ledger.json")).unwrap();

        let items = vec![
            item(Some("m-1"), "a.txt"),
            item(None, "b.txt"),
            item(Some(""), "c.txt"),
            item(Some("m-1"), "a-again.txt"),
            item(Some("m-2"), "d.txt"),
        ];
        let committed = ingest(&mut ledger, &items);

        let names: Vec<&str> = committed
            .iter()
            .filter_map(|i| i.file_name.as_deref())
            .collect();
        assert_eq!(names, ["a.txt", "d.txt"]);

        let record = ledger.get("m-2").unwrap();
        assert_eq!(record.provenance.as_deref(), Some(INGEST_PROVENANCE));
        assert_eq!(record.file_ref.as_deref(), Some("vault/d.txt"));
        assert_eq!(record.timestamp.as_deref(), Some("2024-05-01T10:00:00"));
    }

    #[test]
    fn test_read_manifest_shapes() {
        let temp = TempDir::new().unwrap();
        let list = temp.path().join("list.json");
        std::fs::write(&list, r#"[{"m-id": "a"}, {"m-id": "b", "quality_score": 88}]"#).unwrap();
        let items = read_manifest(&list).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].extra["quality_score"], 88);

        let single = temp.path().join("single.json");
        std::fs::write(&single, r#"{"m-id": "solo", "file_name": "x.md"}"#).unwrap();
        let items = read_manifest(&single).unwrap();
        assert_eq!(items[0].mid.as_deref(), Some("solo"));
    }

    #[test]
    fn test_numeric_fields_are_read_as_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"[{"m-id": 1042, "signet_creator": 7, "file_name": null}, {"m-id": "b"}]"#,
        )
        .unwrap();

        let items = read_manifest(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].mid.as_deref(), Some("1042"));
        assert_eq!(items[0].signet_creator.as_deref(), Some("7"));
        assert_eq!(items[0].file_name, None);

        let mut ledger = Ledger::open(temp.path().join("ledger.json")).unwrap();
        let committed = ingest(&mut ledger, &items);
        assert_eq!(committed.len(), 2);
        assert_eq!(ledger.get("1042").unwrap().signet.as_deref(), Some("7"));
    }

    #[test]
    fn test_empty_or_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(matches!(
            read_manifest(&empty),
            Err(LedgerError::EmptyManifest { .. })
        ));
        assert!(matches!(
            read_manifest(&temp.path().join("absent.json")),
            Err(LedgerError::NotFound { .. })
        ));
    }
}
