//! JSON persistence shared by the ledger and engram sidecars.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::LedgerError;

/// Serialize with a four-space indent.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T, path: &Path) -> Result<Vec<u8>, LedgerError> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|source| LedgerError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(out)
}

/// Replace `path` with `bytes` via a sibling temp file and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    let tmp = parent.join(format!(".{file_name}.tmp.{}", std::process::id()));
    let result = write_then_rename(&tmp, path, bytes);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result?;

    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    {
        let mut file = File::create(tmp).map_err(|e| LedgerError::io(tmp, e))?;
        file.write_all(bytes).map_err(|e| LedgerError::io(tmp, e))?;
        file.sync_all().map_err(|e| LedgerError::io(tmp, e))?;
    }
    std::fs::rename(tmp, path).map_err(|e| LedgerError::io(path, e))
}
