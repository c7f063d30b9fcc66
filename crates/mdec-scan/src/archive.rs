//! Zip archive entry walker.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tracing::debug;
use zip::ZipArchive;

use mdec_core::{FileRecord, HashedFile, ScanError, ScanWarning, Timestamps, WarningKind};

use crate::hasher::hash_reader;
use crate::walker::Filters;

/// Entries hashed from one archive.
#[derive(Debug, Default)]
pub(crate) struct ArchiveWalk {
    pub files: Vec<HashedFile>,
    pub entries_seen: u64,
    pub warnings: Vec<ScanWarning>,
}

/// Walk the entry list of a zip archive, hashing entries that pass the filters.
///
/// Failing to open the archive is an error; a single unreadable entry is a warning.
pub(crate) fn walk_zip(path: &Path, filters: &Filters<'_>) -> Result<ArchiveWalk, ScanError> {
    let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    let fallback_time = file
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ScanError::archive(path, e))?;
    let mut walk = ArchiveWalk::default();
    let config = filters.config;

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                walk.warnings.push(ScanWarning::new(
                    path,
                    format!("Entry {index}: {err}"),
                    WarningKind::ArchiveError,
                ));
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if filters.skips_entry(&name) {
            continue;
        }
        walk.entries_seen += 1;

        let at = entry
            .last_modified()
            .and_then(dos_to_utc)
            .unwrap_or(fallback_time);
        let record = FileRecord::in_archive(path, name.as_str(), entry.size(), Timestamps::single(at));
        if !config.accepts(record.category) {
            continue;
        }

        match hash_reader(&mut entry, config.digest) {
            Ok((hash, _)) => {
                debug!(archive = %path.display(), entry = %name, "Hashed archive entry");
                walk.files.push(HashedFile::new(record, hash));
            }
            Err(err) => walk.warnings.push(ScanWarning::new(
                path,
                format!("{name}: {err}"),
                WarningKind::ArchiveError,
            )),
        }
    }

    Ok(walk)
}

/// Zip entries store local wall-clock time without a zone.
fn dos_to_utc(dt: zip::DateTime) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))?
        .and_hms_opt(u32::from(dt.hour()), u32::from(dt.minute()), u32::from(dt.second()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}
