//! The Faktory: stamping an asset with an engram sidecar.
//!
//! Pipeline: ingest -> hash -> categorize -> score -> certify -> emit. The
//! engram lands next to the asset as `<asset>.engram.json`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::info;
use uuid::Uuid;

use mdec_core::{Category, DigestKind};
use mdec_scan::hash_file;

use crate::error::LedgerError;
use crate::io::{to_pretty_json, write_atomic};

/// Engram schema version.
pub const ENGRAM_VERSION: &str = "2.1";

/// Metadata standards version the engram conforms to.
pub const MDEC_STANDARDS_VERSION: &str = "1.0.0";

/// Category for assets without a recognized classification.
pub const UNASSIGNED: &str = "unassigned";

/// Classifications an engram may carry.
pub const VALID_CATEGORIES: &[&str] = &[
    "Neural_DevOps_Protocol",
    "Open_Data_Legacy",
    "Architectures",
    "Deployments",
    "User_Guides",
    "Protocols",
    "Technical_Reports",
    UNASSIGNED,
];

/// Suffix appended to an asset's path for its sidecar.
pub const ENGRAM_SUFFIX: &str = ".engram.json";

const DEFAULT_ORIGIN_VAULT: &str = "DATA_LEGACY_VAULT_PERSONAL";
const LEGACY_GRADE_PENDING: &str = "PENDING_VERIFICATION";
const PROCESSED_FLAG: &str = "faktory_processed";

const QUALITY_PENALTY: i32 = 15;
const ANNOTATION_BONUS: i32 = 10;
const LINKS_BONUS: i32 = 5;
const TAGS_BONUS: i32 = 5;

/// Certification tier derived from the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Certification {
    Gold,
    Silver,
    Bronze,
    Uncertified,
}

impl Certification {
    pub fn from_score(score: u8) -> Self {
        match score {
            95.. => Certification::Gold,
            80..=94 => Certification::Silver,
            50..=79 => Certification::Bronze,
            _ => Certification::Uncertified,
        }
    }
}

/// Annotation layer: who processed the asset and in what context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentientLayer {
    pub os_authority: String,
    pub context: String,
    pub legacy_grade: String,
    pub cognitive_flags: Vec<String>,
    pub sentiment_vector: Option<Vec<f64>>,
}

/// JSON sidecar describing one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engram {
    /// Random UUID v4.
    pub id: String,
    pub engram_version: String,
    pub mdec_standards_version: String,
    pub origin_vault: String,
    pub name: String,
    /// Absolute path of the asset.
    pub path: String,
    /// One of [`VALID_CATEGORIES`].
    pub category: String,
    /// Universal category code of the asset's extension.
    pub mdec_category: String,
    pub created: String,
    pub modified: String,
    /// Uppercase hex SHA-256 of the asset.
    pub checksum: String,
    pub tags: Vec<String>,
    pub neural_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentient_layer: Option<SentientLayer>,
    pub quality_score: u8,
    pub certification: Certification,
}

impl Engram {
    /// Score adherence to the engram standard, 0-100.
    ///
    /// Each empty or unassigned essential costs 15; the annotation layer,
    /// links and tags earn bonuses.
    pub fn quality(&self) -> u8 {
        let essentials = [
            &self.id,
            &self.name,
            &self.path,
            &self.category,
            &self.created,
            &self.modified,
            &self.checksum,
        ];
        let mut score: i32 = 100;
        for value in essentials {
            if value.is_empty() || value == UNASSIGNED {
                score -= QUALITY_PENALTY;
            }
        }
        if self.sentient_layer.is_some() {
            score += ANNOTATION_BONUS;
        }
        if !self.neural_links.is_empty() {
            score += LINKS_BONUS;
        }
        if !self.tags.is_empty() {
            score += TAGS_BONUS;
        }
        score.clamp(0, 100) as u8
    }

    /// Recompute the score and certification from the current fields.
    pub fn certify(&mut self) {
        self.quality_score = self.quality();
        self.certification = Certification::from_score(self.quality_score);
    }
}

/// Settings for the Faktory.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct FaktoryConfig {
    /// Vault recorded as the engram's origin.
    #[builder(default = "DEFAULT_ORIGIN_VAULT.to_string()")]
    pub origin_vault: String,

    /// Organization running the Faktory.
    #[builder(default = "\"Mars City Unity\".to_string()")]
    pub org_name: String,

    /// Context note used when a stamp request carries none.
    #[builder(default = "\"Cognitive ingestion via the MDEC Faktory.\".to_string()")]
    pub default_context: String,
}

impl Default for FaktoryConfig {
    fn default() -> Self {
        Self {
            origin_vault: DEFAULT_ORIGIN_VAULT.to_string(),
            org_name: "Mars City Unity".to_string(),
            default_context: "Cognitive ingestion via the MDEC Faktory.".to_string(),
        }
    }
}

impl FaktoryConfig {
    /// Create a new config builder.
    pub fn builder() -> FaktoryConfigBuilder {
        FaktoryConfigBuilder::default()
    }
}

/// Per-asset options for a stamp.
#[derive(Debug, Clone, Default)]
pub struct StampRequest {
    /// Requested classification; anything outside [`VALID_CATEGORIES`] is unassigned.
    pub category: Option<String>,
    pub context: Option<String>,
    pub tags: Vec<String>,
    pub neural_links: Vec<String>,
}

/// Path of the sidecar for an asset.
pub fn sidecar_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(ENGRAM_SUFFIX);
    PathBuf::from(name)
}

/// Builds and emits engrams.
#[derive(Debug, Clone, Default)]
pub struct Faktory {
    config: FaktoryConfig,
}

impl Faktory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FaktoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FaktoryConfig {
        &self.config
    }

    /// Build an engram for `source` without writing it.
    pub fn build(&self, source: &Path, request: &StampRequest) -> Result<Engram, LedgerError> {
        if !source.is_file() {
            return Err(LedgerError::NotFound {
                path: source.to_path_buf(),
            });
        }

        let (hash, _) = hash_file(source, DigestKind::Sha256)?;
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string();
        let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        let category = request
            .category
            .as_deref()
            .filter(|c| VALID_CATEGORIES.contains(c))
            .unwrap_or(UNASSIGNED);
        let context = request
            .context
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.config.default_context.clone());

        let mut engram = Engram {
            id: Uuid::new_v4().to_string(),
            engram_version: ENGRAM_VERSION.to_string(),
            mdec_standards_version: MDEC_STANDARDS_VERSION.to_string(),
            origin_vault: self.config.origin_vault.clone(),
            name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: absolute.display().to_string(),
            category: category.to_string(),
            mdec_category: Category::for_path(source).code().to_string(),
            created: now.clone(),
            modified: now,
            checksum: hash.to_hex_upper(),
            tags: request.tags.clone(),
            neural_links: request.neural_links.clone(),
            sentient_layer: Some(SentientLayer {
                os_authority: format!("MDEC Faktory - {}", self.config.org_name),
                context,
                legacy_grade: LEGACY_GRADE_PENDING.to_string(),
                cognitive_flags: vec![PROCESSED_FLAG.to_string()],
                sentiment_vector: None,
            }),
            quality_score: 0,
            certification: Certification::Uncertified,
        };
        engram.certify();
        Ok(engram)
    }

    /// Run the full pipeline and emit the sidecar. Returns the engram and its path.
    pub fn stamp(&self, source: &Path, request: &StampRequest) -> Result<(Engram, PathBuf), LedgerError> {
        info!(asset = %source.display(), "Faktory pipeline started");
        let engram = self.build(source, request)?;
        let target = sidecar_path(source);
        let bytes = to_pretty_json(&engram, &target)?;
        write_atomic(&target, &bytes)?;
        info!(
            certification = %engram.certification,
            score = engram.quality_score,
            sidecar = %target.display(),
            "Engram emitted"
        );
        Ok((engram, target))
    }
}
