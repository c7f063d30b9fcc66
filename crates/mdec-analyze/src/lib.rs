//! Analysis for mdec.
//!
//! This crate works on what the walker produced and on individual
//! metadata documents:
//!
//! - **Duplicate provenance** - group an inventory by content hash and rank
//!   each group oldest-first
//! - **Quality scoring** - grade a metadata mapping on completeness,
//!   consistency, accuracy and richness
//! - **Validation** - check documents against the metadata rules and repair
//!   what can be repaired
//!
//! ```rust,ignore
//! use mdec_analyze::{DuplicateFinder, render_duplicates};
//! use mdec_scan::{InspectConfig, Walker};
//!
//! let inventory = Walker::new().walk(&InspectConfig::new("/vault"))?;
//! let report = DuplicateFinder::new().find_duplicates(&inventory);
//! println!("{}", render_duplicates(&report, 50));
//! ```

mod duplicates;
mod error;
pub mod metadata;
mod quality;
mod report;
mod validate;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport,
};
pub use error::AnalyzeError;
pub use metadata::{DocumentFormat, Metadata, extract_metadata};
pub use quality::{
    Advice, Grade, QualityReport, QualityScorer, QualityScores, REQUIRED_FIELDS, Recommendation,
};
pub use report::{DEFAULT_REPORT_LIMIT, render_duplicates, render_quality, render_validation};
pub use validate::{
    AutoValidator, BACKUP_SUFFIX, FixKind, ValidationReport, ValidationStats, Violation,
    ViolationKind, backup_path, infer_category, is_iso8601, normalize_date,
};

// Re-export core types
pub use mdec_core::{ContentHash, FileRecord, Inventory};
