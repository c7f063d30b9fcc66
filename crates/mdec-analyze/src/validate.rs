//! Metadata validation and automatic repair.
//!
//! [`AutoValidator`] checks JSON, Markdown and YAML documents for the
//! required fields, ISO 8601 dates, array tags, specific categories and
//! strong ids. In fix mode it backs each file up to `<file>.mdec_backup`
//! and rewrites the repaired metadata in place.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use jwalk::WalkDir;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AnalyzeError;
use crate::metadata::{
    DocumentFormat, Metadata, has_field, render_frontmatter, split_frontmatter, value_to_string,
};

/// Fields every validated document must carry.
pub const VALIDATED_FIELDS: &[&str] = &["id", "created", "modified", "category"];

/// Extensions picked up when validating a directory.
pub const VALIDATED_EXTENSIONS: &[&str] = &["json", "md", "yaml", "yml"];

/// Suffix appended to a file's name for its pre-fix backup.
pub const BACKUP_SUFFIX: &str = ".mdec_backup";

const GENERIC_CATEGORIES: &[&str] = &["unknown", "misc", "other", "na", "n/a", ""];
const DATE_FIELDS: &[&str] = &["created", "modified"];
const CONTEXT_FIELDS: &[&str] = &["file_path", "file_name", "file_extension"];
const MIN_ID_LEN: usize = 5;

/// What rule a violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    MissingField,
    InvalidDateFormat,
    InvalidTagsFormat,
    GenericCategory,
    WeakId,
    /// The file could not be read, parsed or rewritten.
    Error,
}

/// Automatic repair for a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    AddField,
    FixDateFormat,
    FixTagsFormat,
    GenerateId,
}

/// A single rule violation in one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub file: PathBuf,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub message: String,
    /// Repair to apply, or `None` when a human has to decide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixKind>,
    /// Whether the repair was written back.
    #[serde(default)]
    pub fixed: bool,
}

impl Violation {
    fn new(file: &Path, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            kind,
            field: None,
            value: None,
            message: message.into(),
            fix: None,
            fixed: false,
        }
    }

    fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    fn fix(mut self, fix: Option<FixKind>) -> Self {
        self.fix = fix;
        self
    }

    /// Whether the violation can be repaired automatically.
    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}

/// Counters for a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub files_checked: usize,
    pub violations_found: usize,
    pub fixes_applied: usize,
    pub files_fixed: usize,
}

/// Result of validating a file or directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// UTC time the report was produced.
    pub timestamp: String,
    pub stats: ValidationStats,
    pub violations: Vec<Violation>,
    /// Human-readable log of repairs.
    pub fixes_applied: Vec<String>,
    pub success: bool,
    pub fix_mode: bool,
}

/// Validates documents and optionally repairs them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoValidator {
    fix_mode: bool,
}

impl AutoValidator {
    pub fn new(fix_mode: bool) -> Self {
        Self { fix_mode }
    }

    pub fn fix_mode(&self) -> bool {
        self.fix_mode
    }

    /// Validate a single file, or every document under a directory.
    pub fn validate_path(&self, path: &Path) -> Result<ValidationReport, AnalyzeError> {
        if !path.exists() {
            return Err(AnalyzeError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut run = Run::default();
        if path.is_file() {
            self.validate_file(path, &mut run);
        } else {
            for entry in WalkDir::new(path).sort(true).skip_hidden(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "Skipping unreadable entry");
                        continue;
                    }
                };
                let file = entry.path();
                if entry.file_type().is_file() && should_validate(&file) {
                    self.validate_file(&file, &mut run);
                }
            }
        }

        info!(
            path = %path.display(),
            files = run.stats.files_checked,
            violations = run.stats.violations_found,
            fixes = run.stats.fixes_applied,
            "Validation complete"
        );
        Ok(run.finish(self.fix_mode))
    }

    fn validate_file(&self, path: &Path, run: &mut Run) {
        run.stats.files_checked += 1;
        if let Err(err) = self.process_file(path, run) {
            run.record_error(path, &err);
        }
    }

    fn process_file(&self, path: &Path, run: &mut Run) -> Result<(), AnalyzeError> {
        let mut document = Document::load(path)?;
        let mut violations = check_standards(path, &document.view(path), document.writable);
        if violations.is_empty() {
            return Ok(());
        }
        debug!(path = %path.display(), count = violations.len(), "Violations found");
        run.stats.violations_found += violations.len();

        let outcome = if self.fix_mode && violations.iter().any(Violation::is_fixable) {
            fix_document(path, &mut document, &mut violations)
        } else {
            Ok(Vec::new())
        };

        match outcome {
            Ok(applied) => {
                if !applied.is_empty() {
                    run.stats.fixes_applied += applied.len();
                    run.stats.files_fixed += 1;
                    run.fixes_applied.extend(applied);
                }
                run.violations.extend(violations);
                Ok(())
            }
            Err(err) => {
                // Write-back failed; nothing counts as fixed.
                for violation in &mut violations {
                    violation.fixed = false;
                }
                run.violations.extend(violations);
                Err(err)
            }
        }
    }
}

/// Back up, repair and write back one document. Returns the fix log.
fn fix_document(
    path: &Path,
    document: &mut Document,
    violations: &mut [Violation],
) -> Result<Vec<String>, AnalyzeError> {
    backup(path)?;
    let applied = apply_fixes(path, &mut document.fields, violations);
    document.save(path)?;
    Ok(applied)
}

#[derive(Debug, Default)]
struct Run {
    stats: ValidationStats,
    violations: Vec<Violation>,
    fixes_applied: Vec<String>,
}

impl Run {
    fn record_error(&mut self, path: &Path, err: &AnalyzeError) {
        self.stats.violations_found += 1;
        self.violations.push(Violation::new(
            path,
            ViolationKind::Error,
            format!("Failed to process: {err}"),
        ));
    }

    fn finish(self, fix_mode: bool) -> ValidationReport {
        let success =
            self.stats.violations_found == 0 || (fix_mode && self.stats.fixes_applied > 0);
        ValidationReport {
            timestamp: now_iso(),
            stats: self.stats,
            violations: self.violations,
            fixes_applied: self.fixes_applied,
            success,
            fix_mode,
        }
    }
}

/// A document's own metadata plus what is needed to write it back.
struct Document {
    format: DocumentFormat,
    fields: Metadata,
    /// Markdown text following the frontmatter (or the whole file when it has none).
    body: String,
    writable: bool,
}

impl Document {
    fn load(path: &Path) -> Result<Self, AnalyzeError> {
        let format = DocumentFormat::of(path);
        let mut document = Self {
            format,
            fields: Metadata::new(),
            body: String::new(),
            writable: false,
        };

        match format {
            DocumentFormat::Json => {
                let text = read(path)?;
                let parsed: Value = serde_json::from_str(&text).map_err(|source| {
                    AnalyzeError::Json {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                if let Value::Object(fields) = parsed {
                    document.fields = fields;
                    document.writable = true;
                }
            }
            DocumentFormat::Markdown => {
                let text = read(path)?;
                match split_frontmatter(&text) {
                    Some((fields, body)) => {
                        document.fields = fields;
                        document.body = body.to_string();
                    }
                    None => document.body = text,
                }
                document.writable = true;
            }
            DocumentFormat::Other => {}
        }
        Ok(document)
    }

    /// File context overlaid with the document's fields, as checked.
    fn view(&self, path: &Path) -> Metadata {
        let mut view = Metadata::new();
        view.insert("file_path".into(), Value::String(path.display().to_string()));
        view.insert(
            "file_name".into(),
            Value::String(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
        );
        view.insert(
            "file_extension".into(),
            Value::String(
                path.extension()
                    .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                    .unwrap_or_default(),
            ),
        );
        view.extend(self.fields.clone());
        view
    }

    fn save(&self, path: &Path) -> Result<(), AnalyzeError> {
        let content = match self.format {
            DocumentFormat::Json => {
                serde_json::to_string_pretty(&self.fields).map_err(|source| AnalyzeError::Json {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            DocumentFormat::Markdown => {
                let fields: Metadata = self
                    .fields
                    .iter()
                    .filter(|(key, _)| !CONTEXT_FIELDS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                render_frontmatter(&fields, &self.body)
            }
            DocumentFormat::Other => return Ok(()),
        };
        std::fs::write(path, content).map_err(|e| AnalyzeError::io(path, e))
    }
}

fn read(path: &Path) -> Result<String, AnalyzeError> {
    std::fs::read_to_string(path).map_err(|e| AnalyzeError::io(path, e))
}

fn should_validate(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VALIDATED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Path of the backup written before a file is repaired.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn backup(path: &Path) -> Result<(), AnalyzeError> {
    let target = backup_path(path);
    std::fs::copy(path, &target).map_err(|e| AnalyzeError::io(&target, e))?;
    Ok(())
}

/// Check one document's metadata against the rules.
fn check_standards(path: &Path, metadata: &Metadata, writable: bool) -> Vec<Violation> {
    let fix = |kind: FixKind| writable.then_some(kind);
    let mut violations = Vec::new();

    for field in VALIDATED_FIELDS {
        if !has_field(metadata, field) {
            violations.push(
                Violation::new(
                    path,
                    ViolationKind::MissingField,
                    format!("Required field \"{field}\" is missing"),
                )
                .field(field)
                .fix(fix(FixKind::AddField)),
            );
        }
    }

    for field in DATE_FIELDS {
        if let Some(value) = metadata.get(*field) {
            let text = value_to_string(value);
            if !is_iso8601(&text) {
                violations.push(
                    Violation::new(
                        path,
                        ViolationKind::InvalidDateFormat,
                        format!("Date \"{field}\" not in ISO8601 format"),
                    )
                    .field(field)
                    .value(Value::String(text))
                    .fix(fix(FixKind::FixDateFormat)),
                );
            }
        }
    }

    if let Some(tags) = metadata.get("tags").filter(|t| !t.is_array()) {
        violations.push(
            Violation::new(path, ViolationKind::InvalidTagsFormat, "Tags should be an array")
                .field("tags")
                .value(tags.clone())
                .fix(fix(FixKind::FixTagsFormat)),
        );
    }

    let generic = |c: &&Value| GENERIC_CATEGORIES.contains(&value_to_string(c).to_lowercase().as_str());
    if let Some(category) = metadata.get("category").filter(generic) {
        violations.push(
            Violation::new(
                path,
                ViolationKind::GenericCategory,
                "Category too generic, needs specific classification",
            )
            .field("category")
            .value(category.clone()),
        );
    }

    if let Some(id) = metadata.get("id") {
        let id = value_to_string(id);
        if id.chars().count() < MIN_ID_LEN {
            violations.push(
                Violation::new(path, ViolationKind::WeakId, "ID too short/simple")
                    .field("id")
                    .value(Value::String(id))
                    .fix(fix(FixKind::GenerateId)),
            );
        }
    }

    violations
}

/// Apply every fixable violation to `fields`, returning the repair log.
fn apply_fixes(path: &Path, fields: &mut Metadata, violations: &mut [Violation]) -> Vec<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut log = Vec::new();

    for violation in violations.iter_mut() {
        let (Some(fix), Some(field)) = (violation.fix, violation.field.clone()) else {
            continue;
        };
        match fix {
            FixKind::AddField => {
                let value = match field.as_str() {
                    "id" => generate_id(),
                    "category" => infer_category(path).to_string(),
                    _ => now_iso(),
                };
                fields.insert(field.clone(), Value::String(value));
                log.push(format!("Added {field} to {name}"));
            }
            FixKind::FixDateFormat => {
                let current = fields.get(&field).map(value_to_string).unwrap_or_default();
                fields.insert(field.clone(), Value::String(normalize_date(&current)));
                log.push(format!("Fixed {field} format in {name}"));
            }
            FixKind::FixTagsFormat => {
                if let Some(tags) = fields.get(&field) {
                    let tags = split_tags(tags);
                    fields.insert(field.clone(), tags);
                }
                log.push(format!("Fixed tags format in {name}"));
            }
            FixKind::GenerateId => {
                fields.insert(field.clone(), Value::String(generate_id()));
                log.push(format!("Generated new ID for {name}"));
            }
        }
        violation.fixed = true;
    }

    log
}

fn split_tags(tags: &Value) -> Value {
    match tags {
        Value::String(text) => Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Value::String(t.to_string()))
                .collect(),
        ),
        Value::Array(_) => tags.clone(),
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![Value::String(value_to_string(other))]),
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whether a value starts with `YYYY-MM-DDTHH:MM:SS`.
pub fn is_iso8601(text: &str) -> bool {
    let bytes = text.as_bytes();
    const PATTERN: &[u8; 19] = b"0000-00-00T00:00:00";
    bytes.len() >= PATTERN.len()
        && PATTERN.iter().zip(bytes).all(|(p, b)| match p {
            b'0' => b.is_ascii_digit(),
            sep => sep == b,
        })
}

/// Current UTC time as ISO 8601 with a `Z` suffix.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Rewrite a loosely formatted date as ISO 8601.
///
/// Unrecognized input becomes the current time.
pub fn normalize_date(text: &str) -> String {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
        .map(|date| date.format("%Y-%m-%dT00:00:00Z").to_string())
        .unwrap_or_else(now_iso)
}

/// Guess a category from the words in a path.
pub fn infer_category(path: &Path) -> &'static str {
    let text = path.to_string_lossy().to_lowercase();
    if text.contains("doc") || text.contains("note") {
        "documentation"
    } else if text.contains("code") || text.contains("src") {
        "source_code"
    } else if text.contains("data") {
        "dataset"
    } else if text.contains("test") {
        "test"
    } else {
        "general"
    }
}
