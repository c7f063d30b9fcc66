//! Metadata extraction from files, JSON documents and Markdown frontmatter.

use std::path::Path;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AnalyzeError;

/// A flat metadata mapping, key order preserved.
pub type Metadata = Map<String, Value>;

/// Frontmatter fence.
const FENCE: &str = "---";

/// How a document stores its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Top-level JSON object.
    Json,
    /// Markdown with a `---` frontmatter block.
    Markdown,
    /// Anything else; carries no embedded metadata.
    Other,
}

impl DocumentFormat {
    /// Detect the format from a path's extension.
    pub fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("md") => Self::Markdown,
            _ => Self::Other,
        }
    }

    /// Whether metadata can be written back to this format.
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Python-style truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Whether a field is present with a truthy value.
pub fn has_field(metadata: &Metadata, field: &str) -> bool {
    metadata.get(field).is_some_and(is_truthy)
}

/// Render a value as plain text: strings unquoted, everything else as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split a document into frontmatter fields and body.
///
/// The document must start with `---`; the block runs to the next `---`.
pub fn split_frontmatter(content: &str) -> Option<(Metadata, &str)> {
    let rest = content.strip_prefix(FENCE)?;
    let end = rest.find(FENCE)?;
    let block = &rest[..end];
    let body = &rest[end + FENCE.len()..];
    Some((parse_frontmatter_block(block), body))
}

fn parse_frontmatter_block(block: &str) -> Metadata {
    let mut fields = Metadata::new();
    for line in block.trim().lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), parse_scalar(value.trim()));
        }
    }
    fields
}

/// Frontmatter values are strings, except `[a, b]` flow lists.
fn parse_scalar(raw: &str) -> Value {
    match raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        Some(inner) => Value::Array(
            inner
                .split(',')
                .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\''))
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ),
        None => Value::String(raw.to_string()),
    }
}

/// Rebuild a Markdown document from frontmatter fields and a body.
pub fn render_frontmatter(fields: &Metadata, body: &str) -> String {
    let mut out = String::from(FENCE);
    out.push('\n');
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&render_scalar(value));
        out.push('\n');
    }
    out.push_str(FENCE);
    out.push('\n');
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    out.push_str(body);
    out
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_to_string).collect();
            format!("[{}]", items.join(", "))
        }
        other => value_to_string(other),
    }
}

/// Read the metadata embedded in a document.
///
/// JSON documents contribute their top-level object (other JSON shapes
/// contribute nothing); Markdown contributes its frontmatter.
pub fn read_document(path: &Path) -> Result<(DocumentFormat, Metadata), AnalyzeError> {
    let format = DocumentFormat::of(path);
    let fields = match format {
        DocumentFormat::Json => {
            let text = std::fs::read_to_string(path).map_err(|e| AnalyzeError::io(path, e))?;
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => Metadata::new(),
                Err(source) => {
                    return Err(AnalyzeError::Json {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
        DocumentFormat::Markdown => {
            let text = std::fs::read_to_string(path).map_err(|e| AnalyzeError::io(path, e))?;
            split_frontmatter(&text)
                .map(|(fields, _)| fields)
                .unwrap_or_default()
        }
        DocumentFormat::Other => Metadata::new(),
    };
    Ok((format, fields))
}

/// Local time as ISO 8601 with microseconds.
pub fn iso_local(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Filesystem facts about a file: name, path, size, times, extension.
pub fn file_facts(path: &Path) -> Result<Metadata, AnalyzeError> {
    let stat = std::fs::metadata(path).map_err(|e| AnalyzeError::io(path, e))?;
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let modified: DateTime<Local> = stat
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| DateTime::from(std::time::UNIX_EPOCH));
    let created: DateTime<Local> = stat.created().map(DateTime::from).unwrap_or(modified);
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let mut facts = Metadata::new();
    facts.insert(
        "name".into(),
        Value::String(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    );
    facts.insert("path".into(), Value::String(absolute.display().to_string()));
    facts.insert("size".into(), Value::from(stat.len()));
    facts.insert("created".into(), Value::String(iso_local(created)));
    facts.insert("modified".into(), Value::String(iso_local(modified)));
    facts.insert("extension".into(), Value::String(extension));
    Ok(facts)
}

/// Filesystem facts overlaid with the document's embedded metadata.
///
/// Unreadable or malformed embedded metadata is ignored.
pub fn extract_metadata(path: &Path) -> Result<Metadata, AnalyzeError> {
    let mut metadata = file_facts(path)?;
    match read_document(path) {
        Ok((_, fields)) => metadata.extend(fields),
        Err(err) => debug!(path = %path.display(), error = %err, "Ignoring embedded metadata"),
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_frontmatter() {
        let doc = "---\ntitle: Hello: World\ntags: [a, b]\n---\n# Body\n";
        let (fields, body) = split_frontmatter(doc).unwrap();
        assert_eq!(fields["title"], json!("Hello: World"));
        assert_eq!(fields["tags"], json!(["a", "b"]));
        assert_eq!(body, "\n# Body\n");
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(split_frontmatter("# Just a doc").is_none());
        assert!(split_frontmatter("---\nnever closed").is_none());
    }

    #[test]
    fn test_render_round_trip() {
        let doc = "---\nid: abc-123\ntags: [x, y]\n---\nBody text\n";
        let (fields, body) = split_frontmatter(doc).unwrap();
        assert_eq!(render_frontmatter(&fields, body), doc);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([1])));
    }

    #[test]
    fn test_extract_overlays_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("asset.JSON");
        fs::write(&path, r#"{"name": "Custom", "author": "Ada"}"#).unwrap();

        let metadata = extract_metadata(&path).unwrap();
        assert_eq!(metadata["name"], json!("Custom"));
        assert_eq!(metadata["author"], json!("Ada"));
        assert_eq!(metadata["extension"], json!(".json"));
        assert!(metadata["size"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_extract_tolerates_bad_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let metadata = extract_metadata(&path).unwrap();
        assert_eq!(metadata["name"], json!("broken.json"));
        assert!(read_document(&path).is_err());
    }
}
