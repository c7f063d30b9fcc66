//! Metadata quality scoring.
//!
//! A metadata mapping is graded on four axes, each 0-100:
//!
//! - **Completeness**: share of required fields present
//! - **Consistency**: date, id and tag formats
//! - **Accuracy**: logical checks (date order, empty files, vague categories)
//! - **Richness**: field count, tag count, description length
//!
//! The overall score is a weighted average of the four.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalyzeError;
use crate::metadata::{Metadata, extract_metadata, has_field, is_truthy, value_to_string};

/// Fields every well-described asset carries.
pub const REQUIRED_FIELDS: &[&str] = &[
    "id",
    "name",
    "created",
    "modified",
    "category",
    "tags",
    "author",
    "description",
];

/// Category values too vague to be useful.
const VAGUE_CATEGORIES: &[&str] = &["unknown", "misc", "other", "na"];

const WEIGHT_COMPLETENESS: f64 = 0.35;
const WEIGHT_CONSISTENCY: f64 = 0.25;
const WEIGHT_ACCURACY: f64 = 0.25;
const WEIGHT_RICHNESS: f64 = 0.15;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid ISO date pattern"));

fn starts_with_iso_date(text: &str) -> bool {
    ISO_DATE.is_match(text)
}

/// The four sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub completeness: f64,
    pub consistency: f64,
    pub accuracy: f64,
    pub richness: f64,
}

impl QualityScores {
    /// Weighted overall score, rounded to one decimal.
    pub fn overall(&self) -> f64 {
        round1(
            self.completeness * WEIGHT_COMPLETENESS
                + self.consistency * WEIGHT_CONSISTENCY
                + self.accuracy * WEIGHT_ACCURACY
                + self.richness * WEIGHT_RICHNESS,
        )
    }
}

/// Letter-style grade for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::Excellent
        } else if score >= 75.0 {
            Grade::Good
        } else if score >= 60.0 {
            Grade::NeedsImprovement
        } else {
            Grade::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "EXCELLENT",
            Grade::Good => "GOOD",
            Grade::NeedsImprovement => "NEEDS IMPROVEMENT",
            Grade::Poor => "POOR",
        }
    }

    /// Whether the grade clears the acceptance bar (75).
    pub fn is_passing(self) -> bool {
        matches!(self, Grade::Excellent | Grade::Good)
    }
}

/// Severity of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    Warning,
    Tip,
    Ok,
}

/// An actionable improvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub advice: Advice,
    pub message: String,
}

impl Recommendation {
    fn new(advice: Advice, message: impl Into<String>) -> Self {
        Self {
            advice,
            message: message.into(),
        }
    }
}

/// Full scoring result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// File that was scored, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub overall_score: f64,
    pub grade: Grade,
    pub scores: QualityScores,
    pub metadata: Metadata,
    pub recommendations: Vec<Recommendation>,
    /// UTC time of evaluation, ISO 8601.
    pub timestamp: String,
}

/// Grades metadata mappings.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    required_fields: Vec<String>,
}

impl QualityScorer {
    /// Create a scorer with the standard required fields.
    pub fn new() -> Self {
        Self {
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Extract a file's metadata and score it.
    pub fn score_file(&self, path: &Path) -> Result<QualityReport, AnalyzeError> {
        if !path.exists() {
            return Err(AnalyzeError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let metadata = extract_metadata(path)?;
        let mut report = self.score(metadata);
        report.file = Some(path.to_path_buf());
        Ok(report)
    }

    /// Score an arbitrary metadata mapping.
    pub fn score(&self, metadata: Metadata) -> QualityReport {
        let scores = self.scores(&metadata);
        let overall_score = scores.overall();
        let recommendations = self.recommendations(&metadata, &scores);
        QualityReport {
            file: None,
            overall_score,
            grade: Grade::from_score(overall_score),
            scores,
            metadata,
            recommendations,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
        }
    }

    /// Compute the four sub-scores.
    pub fn scores(&self, metadata: &Metadata) -> QualityScores {
        QualityScores {
            completeness: self.completeness(metadata),
            consistency: consistency(metadata),
            accuracy: accuracy(metadata),
            richness: richness(metadata),
        }
    }

    fn missing_fields<'a>(&'a self, metadata: &'a Metadata) -> impl Iterator<Item = &'a str> + 'a {
        self.required_fields
            .iter()
            .filter(|f| !has_field(metadata, f))
            .map(String::as_str)
    }

    fn completeness(&self, metadata: &Metadata) -> f64 {
        let missing = self.missing_fields(metadata).count();
        let present = self.required_fields.len() - missing;
        round1(present as f64 / self.required_fields.len() as f64 * 100.0)
    }

    fn recommendations(&self, metadata: &Metadata, scores: &QualityScores) -> Vec<Recommendation> {
        let mut recs = Vec::new();

        if scores.completeness < 80.0 {
            recs.push(Recommendation::new(
                Advice::Warning,
                format!(
                    "Add missing required fields: {}",
                    self.missing_fields(metadata).join(", ")
                ),
            ));
        }

        if scores.consistency < 80.0 {
            recs.push(Recommendation::new(
                Advice::Warning,
                "Fix date format inconsistencies (use ISO8601: YYYY-MM-DDTHH:MM:SS)",
            ));
            if metadata.get("tags").is_some_and(|t| !t.is_array()) {
                recs.push(Recommendation::new(Advice::Warning, "Convert tags to array format"));
            }
        }

        if scores.accuracy < 80.0 {
            recs.push(Recommendation::new(
                Advice::Warning,
                "Review date logic (modified should be >= created)",
            ));
            if metadata
                .get("category")
                .is_some_and(|c| value_to_string(c).chars().count() < 3)
            {
                recs.push(Recommendation::new(
                    Advice::Warning,
                    "Replace generic category with specific classification",
                ));
            }
        }

        if scores.richness < 60.0 {
            recs.push(Recommendation::new(
                Advice::Tip,
                "Add more descriptive tags (aim for 3-5 tags)",
            ));
            let description_len = metadata
                .get("description")
                .map(|d| value_to_string(d).chars().count())
                .unwrap_or(0);
            if description_len < 50 {
                recs.push(Recommendation::new(
                    Advice::Tip,
                    "Add detailed description (50+ characters)",
                ));
            }
        }

        if recs.is_empty() {
            recs.push(Recommendation::new(
                Advice::Ok,
                "Excellent metadata! No improvements needed.",
            ));
        }

        recs
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn consistency(metadata: &Metadata) -> f64 {
    let mut score: f64 = 100.0;

    for field in ["created", "modified"] {
        if let Some(value) = metadata.get(field) {
            if !starts_with_iso_date(&value_to_string(value)) {
                score -= 20.0;
            }
        }
    }

    if let Some(id) = metadata.get("id") {
        let id = value_to_string(id);
        let all_digits = !id.is_empty() && id.chars().all(|c| c.is_ascii_digit());
        if id.chars().count() < 5 || all_digits {
            score -= 15.0;
        }
    }

    if metadata.get("tags").is_some_and(|t| !t.is_array()) {
        score -= 15.0;
    }

    round1(score.max(0.0))
}

fn accuracy(metadata: &Metadata) -> f64 {
    let mut score: f64 = 100.0;

    if let (Some(created), Some(modified)) = (metadata.get("created"), metadata.get("modified")) {
        match (parse_iso(created), parse_iso(modified)) {
            (Some(created), Some(modified)) => {
                if modified < created {
                    score -= 30.0;
                }
            }
            _ => score -= 10.0,
        }
    }

    if metadata
        .get("size")
        .and_then(Value::as_f64)
        .is_some_and(|size| size == 0.0)
    {
        score -= 20.0;
    }

    if let Some(category) = metadata.get("category") {
        let category = value_to_string(category).to_lowercase();
        if category.chars().count() < 3 || VAGUE_CATEGORIES.contains(&category.as_str()) {
            score -= 15.0;
        }
    }

    round1(score.max(0.0))
}

fn richness(metadata: &Metadata) -> f64 {
    let mut score: f64 = 0.0;

    let field_count = metadata.values().filter(|v| is_truthy(v)).count();
    score += match field_count {
        n if n >= 15 => 40.0,
        n if n >= 10 => 30.0,
        n if n >= 8 => 20.0,
        _ => 10.0,
    };

    if let Some(Value::Array(tags)) = metadata.get("tags") {
        score += match tags.len() {
            n if n >= 5 => 30.0,
            n if n >= 3 => 20.0,
            n if n >= 1 => 10.0,
            _ => 0.0,
        };
    }

    if let Some(description) = metadata.get("description") {
        score += match value_to_string(description).chars().count() {
            n if n >= 100 => 30.0,
            n if n >= 50 => 20.0,
            n if n >= 20 => 10.0,
            _ => 0.0,
        };
    }

    round1(score.min(100.0))
}

/// Parse an ISO 8601 timestamp or date, ignoring any `Z` suffix.
///
/// Offset-carrying values are normalized to UTC.
fn parse_iso(value: &Value) -> Option<NaiveDateTime> {
    let text = value_to_string(value).replace('Z', "");
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One decimal, ties to even.
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test metadata must be an object"),
        }
    }

    fn rich() -> Metadata {
        meta(json!({
            "id": "6f1c2a9e-0b7d-4c1e-9a55-2d3f4b5c6d7e",
            "name": "Harvest Logbook",
            "created": "2021-03-01T08:00:00",
            "modified": "2022-03-01T08:00:00",
            "category": "agriculture_records",
            "tags": ["farm", "logbook", "harvest", "wheat", "mars"],
            "author": "Ada",
            "description": "Season-by-season harvest ledger for the northern greenhouse ring, with yields, seed lots and irrigation notes.",
            "size": 2048,
            "path": "/vault/logbook.json",
            "extension": ".json",
            "license": "CC-BY",
            "language": "en",
            "version": "3",
            "source": "scan"
        }))
    }

    #[test]
    fn test_rich_metadata_scores_excellent() {
        let report = QualityScorer::new().score(rich());

        assert_eq!(report.scores.completeness, 100.0);
        assert_eq!(report.scores.consistency, 100.0);
        assert_eq!(report.scores.accuracy, 100.0);
        assert_eq!(report.scores.richness, 100.0);
        assert_eq!(report.overall_score, 100.0);
        assert_eq!(report.grade, Grade::Excellent);
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].advice, Advice::Ok);
    }

    #[test]
    fn test_empty_metadata() {
        let report = QualityScorer::new().score(Metadata::new());

        assert_eq!(report.scores.completeness, 0.0);
        assert_eq!(report.scores.consistency, 100.0);
        assert_eq!(report.scores.accuracy, 100.0);
        assert_eq!(report.scores.richness, 10.0);
        // 0 * .35 + 100 * .25 + 100 * .25 + 10 * .15
        assert_eq!(report.overall_score, 51.5);
        assert_eq!(report.grade, Grade::Poor);
        assert!(report.recommendations[0]
            .message
            .contains("id, name, created, modified, category, tags, author, description"));
    }

    #[test]
    fn test_overall_rounds_ties_to_even() {
        let metadata = meta(json!({
            "tags": ["a", "b", "c", "d", "e"],
            "description": "d".repeat(120)
        }));
        let report = QualityScorer::new().score(metadata);

        assert_eq!(report.scores.completeness, 25.0);
        assert_eq!(report.scores.consistency, 100.0);
        assert_eq!(report.scores.accuracy, 100.0);
        assert_eq!(report.scores.richness, 70.0);
        // 25 * .35 + 100 * .25 + 100 * .25 + 70 * .15 = 69.25
        assert_eq!(report.overall_score, 69.2);
        assert_eq!(report.grade, Grade::NeedsImprovement);
    }

    #[test]
    fn test_round1_ties() {
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(12.5), 12.5);
        assert_eq!(round1(64.64), 64.6);
    }

    #[test]
    fn test_iso_date_prefix() {
        assert!(starts_with_iso_date("2021-03-01T08:00:00"));
        assert!(starts_with_iso_date("2021-03-01"));
        assert!(!starts_with_iso_date("03/01/2021"));
    }

    #[test]
    fn test_consistency_penalties() {
        let metadata = meta(json!({
            "created": "03/01/2021",
            "modified": "yesterday",
            "id": "12345",
            "tags": "a, b"
        }));
        assert_eq!(consistency(&metadata), 100.0 - 20.0 - 20.0 - 15.0 - 15.0);
    }

    #[test]
    fn test_accuracy_penalties() {
        let backwards = meta(json!({
            "created": "2022-01-01T00:00:00Z",
            "modified": "2021-01-01",
            "size": 0,
            "category": "misc"
        }));
        assert_eq!(accuracy(&backwards), 100.0 - 30.0 - 20.0 - 15.0);

        let unparsable = meta(json!({"created": "soon", "modified": "2021-01-01"}));
        assert_eq!(accuracy(&unparsable), 90.0);
    }

    #[test]
    fn test_richness_tiers() {
        let metadata = meta(json!({
            "tags": ["a", "b", "c"],
            "description": "exactly twenty chars"
        }));
        // 2 fields -> 10, 3 tags -> 20, 20 chars -> 10
        assert_eq!(richness(&metadata), 40.0);
    }

    #[test]
    fn test_completeness_ignores_falsy_values() {
        let metadata = meta(json!({"id": "", "name": "n", "tags": []}));
        assert_eq!(QualityScorer::new().completeness(&metadata), 12.5);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(90.0), Grade::Excellent);
        assert_eq!(Grade::from_score(89.9), Grade::Good);
        assert_eq!(Grade::from_score(75.0), Grade::Good);
        assert_eq!(Grade::from_score(60.0), Grade::NeedsImprovement);
        assert_eq!(Grade::from_score(59.9), Grade::Poor);
        assert!(!Grade::NeedsImprovement.is_passing());
    }

    #[test]
    fn test_vague_category_recommendation() {
        let metadata = meta(json!({
            "created": "2022-01-01",
            "modified": "2021-01-01",
            "size": 0,
            "category": "na"
        }));
        let report = QualityScorer::new().score(metadata);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.message.contains("generic category")));
    }
}
