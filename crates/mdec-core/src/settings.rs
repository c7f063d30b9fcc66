//! Application settings loaded from `config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_SKIP_DIRS;

/// Environment variable overriding [`Settings::vault_path`].
pub const VAULT_PATH_ENV: &str = "MDEC_VAULT_PATH";

/// Errors loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// User-level settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default root for `inspect`.
    pub workspace_root: PathBuf,

    /// Ledger file used by `mint` and `ingest`.
    pub ledger_path: PathBuf,

    /// Maximum groups listed in the text duplicate report.
    pub report_limit: usize,

    /// Directory names pruned from walks.
    pub skip_dirs: Vec<String>,

    /// Vault recorded in emitted engrams.
    pub vault_path: Option<PathBuf>,

    /// Organization recorded in emitted engrams.
    pub org_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            ledger_path: PathBuf::from("MDEC_CENTRAL_LEDGER.json"),
            report_limit: 50,
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            vault_path: None,
            org_name: "Mars City Unity".to_string(),
        }
    }
}

impl Settings {
    /// Default settings location: `<config_dir>/mdec/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mdec").join("config.toml"))
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file yields defaults. The vault path environment
    /// override is applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Some(vault) = std::env::var_os(VAULT_PATH_ENV) {
            settings.vault_path = Some(PathBuf::from(vault));
        }

        Ok(settings)
    }

    /// Parse a settings file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "report_limit = 10\nskip_dirs = [\"target\"]\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.report_limit, 10);
        assert_eq!(settings.skip_dirs, vec!["target".to_string()]);
        assert_eq!(settings.org_name, "Mars City Unity");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let err = Settings::from_file(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "report_limit = \"many\"").unwrap();
        assert!(matches!(
            Settings::from_file(&path).unwrap_err(),
            SettingsError::Parse { .. }
        ));
    }
}
