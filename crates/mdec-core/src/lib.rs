//! Core types for mdec.
//!
//! This crate provides the data structures shared across the mdec
//! workspace: the universal category table, content hashes, file records,
//! the hashed inventory produced by a walk, configuration and settings.

mod category;
mod config;
mod error;
mod inventory;
mod record;
mod settings;

pub use category::{Category, ParseCategoryError};
pub use config::{DEFAULT_SKIP_DIRS, InspectConfig, InspectConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use inventory::{HashedFile, Inventory, InventoryStats};
pub use record::{ContentHash, DigestKind, FileRecord, Timestamps};
pub use settings::{Settings, SettingsError, VAULT_PATH_ENV};
