//! Identity and provenance for mdec.
//!
//! - **Signets** - `Name-DOB-Epoch-Vocations-Origin` strings built from
//!   sanitized identity fields
//! - **M-IDs** - UUID v5 of a Signet, so the same identity always mints the
//!   same key
//! - **Ledger** - append-only JSON mapping from M-ID to what it was bound to
//! - **Manifest ingest** - commit assets listed by the ingestion worker
//! - **Faktory** - hash, score and certify an asset, emitting an engram sidecar
//!
//! ```rust,no_run
//! use mdec_ledger::{Binding, Ledger, LedgerRecord, SignetComponents};
//!
//! let components = SignetComponents {
//!     name: "Ada Lovelace".into(),
//!     dob: "1815-12-10".into(),
//!     epoch: "18xx".into(),
//!     vocation: "mathematician,poet".into(),
//!     origin: "uk".into(),
//! };
//! let signet = components.mint()?;
//! let mid = signet.mid();
//!
//! let mut ledger = Ledger::open("MDEC_CENTRAL_LEDGER.json")?;
//! if ledger.bind(mid.to_string(), LedgerRecord::minted(&signet, components)) == Binding::Bound {
//!     ledger.save()?;
//! }
//! # Ok::<(), mdec_ledger::LedgerError>(())
//! ```

mod engram;
mod error;
mod ingest;
mod io;
mod ledger;
mod mid;
mod signet;

pub use engram::{
    Certification, ENGRAM_SUFFIX, ENGRAM_VERSION, Engram, Faktory, FaktoryConfig,
    FaktoryConfigBuilder, MDEC_STANDARDS_VERSION, SentientLayer, StampRequest, UNASSIGNED,
    VALID_CATEGORIES, sidecar_path,
};
pub use error::LedgerError;
pub use ingest::{INGEST_PROVENANCE, ManifestItem, ingest, ingest_manifest, read_manifest};
pub use ledger::{Binding, LEDGER_META, Ledger, LedgerRecord};
pub use mid::{MID_NAMESPACE, MId};
pub use signet::{Signet, SignetComponents, format_dob, sanitize};
