//! M-IDs: deterministic identifiers derived from Signets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace M-IDs are derived under (the RFC 4122 DNS namespace).
pub const MID_NAMESPACE: Uuid = Uuid::NAMESPACE_DNS;

/// UUID v5 of a Signet. The same Signet always yields the same M-ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MId(Uuid);

impl MId {
    pub fn from_signet(signet: &str) -> Self {
        Self(Uuid::new_v5(&MID_NAMESPACE, signet.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for MId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
