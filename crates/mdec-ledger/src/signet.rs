//! Signet strings: `Name-DOB-Epoch-Vocations-Origin`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::mid::MId;

/// Layouts accepted for a date of birth, tried in order.
const DOB_FORMATS: &[&str] = &["%Y-%m-%d", "%m-%d-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Raw identity fields as entered; recorded verbatim in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignetComponents {
    pub name: String,
    pub dob: String,
    pub epoch: String,
    /// Comma- or space-separated vocations.
    pub vocation: String,
    pub origin: String,
}

impl SignetComponents {
    /// Build the Signet for these components.
    pub fn mint(&self) -> Result<Signet, LedgerError> {
        let name = sanitize(&self.name);
        let dob = format_dob(&self.dob)?;
        let epoch = sanitize(&self.epoch);
        let vocations = sanitize(&self.vocation)
            .split('-')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join("-");
        let origin = sanitize(&self.origin).to_uppercase();

        Ok(Signet(format!("{name}-{dob}-{epoch}-{vocations}-{origin}")))
    }
}

/// Human-readable identity string an M-ID is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signet(String);

impl Signet {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The deterministic M-ID for this Signet.
    pub fn mid(&self) -> MId {
        MId::from_signet(self.as_str())
    }
}

impl fmt::Display for Signet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce text to ASCII letters, digits and single dashes.
///
/// Commas separate words; whitespace runs become one dash; leading and
/// trailing dashes are trimmed.
pub fn sanitize(text: &str) -> String {
    let kept: String = text
        .replace(',', " ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .trim_matches('-')
        .to_string()
}

/// Normalize a date of birth to `MM-DD-YYYY`.
pub fn format_dob(dob: &str) -> Result<String, LedgerError> {
    let trimmed = dob.trim();
    DOB_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|date| date.format("%m-%d-%Y").to_string())
        .ok_or_else(|| LedgerError::InvalidDob {
            value: dob.to_string(),
        })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
