//! Plain-text rendering of analysis reports.

use humansize::{BINARY, format_size};
use itertools::Itertools;

use crate::duplicates::DuplicateReport;
use crate::quality::{Advice, QualityReport};
use crate::validate::ValidationReport;

/// Default number of duplicate groups listed.
pub const DEFAULT_REPORT_LIMIT: usize = 50;

/// Violations and fixes shown in a validation report.
const VALIDATION_LISTING: usize = 10;

const RULE_WIDTH: usize = 64;

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

fn banner(title: &str) -> [String; 3] {
    let heavy = "=".repeat(RULE_WIDTH);
    [heavy.clone(), format!("  {title}"), heavy]
}

/// Render a duplicate report, listing at most `limit` groups.
pub fn render_duplicates(report: &DuplicateReport, limit: usize) -> String {
    let mut lines: Vec<String> = banner("INTELLIGENCE REPORT: DUPLICATE ANALYSIS").into();
    lines.push(format!("TOTAL OBJECTS DETECTED: {}", report.total_objects));
    lines.push(format!("UNIQUE SIGNATURES:      {}", report.unique_signatures));
    lines.push(format!("REDUNDANT COPIES:       {}", report.redundant_copies));
    lines.push(format!(
        "RECLAIMABLE SPACE:      {}",
        format_size(report.reclaimable_bytes, BINARY)
    ));
    lines.push(rule());
    lines.push(String::new());

    for (index, group) in report.groups.iter().take(limit).enumerate() {
        let primary = group.primary();
        lines.push(format!(
            "[{:03}] PRIMARY: {} ({})",
            index + 1,
            primary.name,
            primary.timestamps.created_display()
        ));
        lines.push(format!("      Location: {}", primary.location()));
        if group.is_duplicate() {
            lines.push(format!("      COPIES DETECTED ({}):", group.copies().len()));
            for (n, copy) in group.copies().iter().enumerate() {
                lines.push(format!(
                    "        -> Copy {}: {} ({})",
                    n + 1,
                    copy.location(),
                    copy.timestamps.created_display()
                ));
            }
        }
        lines.push(String::new());
    }

    let remaining = report.groups.len().saturating_sub(limit);
    if remaining > 0 {
        lines.push(format!("... (Listing truncated: {remaining} more groups) ..."));
    }

    lines.iter().join("\n")
}

/// Render a quality report.
pub fn render_quality(report: &QualityReport) -> String {
    let mut lines: Vec<String> = banner("MDEC METADATA QUALITY REPORT").into();
    if let Some(file) = &report.file {
        lines.push(format!("File: {}", file.display()));
    }
    lines.push(format!(
        "OVERALL SCORE: {:.1}/100 ({})",
        report.overall_score,
        report.grade.label()
    ));
    lines.push(rule());
    let scores = &report.scores;
    for (label, value) in [
        ("Completeness", scores.completeness),
        ("Consistency", scores.consistency),
        ("Accuracy", scores.accuracy),
        ("Richness", scores.richness),
    ] {
        lines.push(format!("  {label:<14}{value:>6.1}"));
    }
    lines.push(String::new());
    lines.push("RECOMMENDATIONS:".to_string());
    for rec in &report.recommendations {
        let tag = match rec.advice {
            Advice::Warning => "WARN",
            Advice::Tip => "TIP",
            Advice::Ok => "OK",
        };
        lines.push(format!("  [{tag}] {}", rec.message));
    }
    lines.push(rule());
    lines.push(format!("Evaluated {}", report.timestamp));

    lines.iter().join("\n")
}

/// Render a validation report.
pub fn render_validation(report: &ValidationReport) -> String {
    let stats = &report.stats;
    let mut lines: Vec<String> = banner("MDEC AUTO-VALIDATOR REPORT").into();
    lines.push(format!("Files Checked:      {}", stats.files_checked));
    lines.push(format!("Violations Found:   {}", stats.violations_found));
    lines.push(format!("Fixes Applied:      {}", stats.fixes_applied));
    lines.push(format!("Files Fixed:        {}", stats.files_fixed));
    lines.push(String::new());

    if !report.violations.is_empty() {
        lines.push("VIOLATIONS DETECTED:".to_string());
        lines.push(String::new());
        for violation in report.violations.iter().take(VALIDATION_LISTING) {
            let status = if violation.fixed {
                "FIXED"
            } else if violation.is_fixable() {
                "FIXABLE (run with --fix)"
            } else {
                "MANUAL FIX NEEDED"
            };
            let kind = serde_json::to_value(violation.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default();
            lines.push(format!("  {kind}: {}", violation.message));
            lines.push(format!("    File: {}", violation.file.display()));
            lines.push(format!("    Status: {status}"));
            lines.push(String::new());
        }
        let hidden = report.violations.len().saturating_sub(VALIDATION_LISTING);
        if hidden > 0 {
            lines.push(format!("  ... {hidden} more violations"));
            lines.push(String::new());
        }
    }

    if !report.fixes_applied.is_empty() {
        lines.push("FIXES APPLIED:".to_string());
        lines.push(String::new());
        for fix in report.fixes_applied.iter().take(VALIDATION_LISTING) {
            lines.push(format!("  + {fix}"));
        }
        lines.push(String::new());
    }

    lines.push(if report.success {
        "VALIDATION PASSED".to_string()
    } else {
        "VALIDATION FAILED - Manual fixes required".to_string()
    });
    lines.push(rule());
    lines.push(format!("MDEC Auto-Validator {}", report.timestamp));

    lines.iter().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::DuplicateFinder;
    use crate::quality::QualityScorer;
    use chrono::{TimeZone, Utc};
    use mdec_core::{ContentHash, FileRecord, HashedFile, Timestamps};

    fn files(groups: u8) -> Vec<HashedFile> {
        (0..groups)
            .flat_map(|g| {
                let at = Utc.with_ymd_and_hms(2000 + i32::from(g), 1, 1, 12, 0, 0).unwrap();
                [
                    HashedFile::new(
                        FileRecord::on_disk(format!("/vault/{g}.txt"), 4, Timestamps::single(at)),
                        ContentHash::new([g; 32]),
                    ),
                    HashedFile::new(
                        FileRecord::on_disk(
                            format!("/backup/{g}.txt"),
                            4,
                            Timestamps::single(at + chrono::Duration::days(1)),
                        ),
                        ContentHash::new([g; 32]),
                    ),
                ]
            })
            .collect()
    }

    #[test]
    fn test_duplicates_listing() {
        let report = DuplicateFinder::new().group(&files(2));
        let text = render_duplicates(&report, DEFAULT_REPORT_LIMIT);

        assert!(text.contains("TOTAL OBJECTS DETECTED: 4"));
        assert!(text.contains("REDUNDANT COPIES:       2"));
        assert!(text.contains("[001] PRIMARY: 0.txt"));
        assert!(text.contains("      Location: /vault/0.txt"));
        assert!(text.contains("COPIES DETECTED (1):"));
        assert!(text.contains("-> Copy 1: /backup/1.txt"));
        assert!(!text.contains("truncated"));
    }

    #[test]
    fn test_truncation_only_when_groups_remain() {
        let report = DuplicateFinder::new().group(&files(3));

        let exact = render_duplicates(&report, 3);
        assert!(!exact.contains("truncated"));

        let cut = render_duplicates(&report, 2);
        assert!(cut.contains("[002]"));
        assert!(!cut.contains("[003]"));
        assert!(cut.contains("truncated: 1 more groups"));
    }

    #[test]
    fn test_quality_rendering() {
        let report = QualityScorer::new().score(Default::default());
        let text = render_quality(&report);
        assert!(text.contains("OVERALL SCORE: 51.5/100 (POOR)"));
        assert!(text.contains("[WARN] Add missing required fields"));
        assert!(text.contains("[TIP]"));
    }
}
