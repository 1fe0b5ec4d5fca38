// YAML configuration for the CLI

use crate::query::SortBy;
use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "todostore";
const CONFIG_FILE: &str = "config.yaml";
const FALLBACK_DATA_DIR: &str = ".todostore";

/// Browser local storage allows roughly this much per origin
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the SQLite key-value database
    pub data_dir: PathBuf,
    /// Where `export` writes CSV files
    pub export_dir: PathBuf,
    pub default_sort: SortBy,
    /// Largest stored blob in bytes; `null` disables the check
    pub quota_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: PathBuf::from("."),
            default_sort: SortBy::default(),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location if it exists
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Read and parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_yaml(&contents).wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Parse YAML config text; missing keys take their defaults
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }
}

/// `<config dir>/todostore/config.yaml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_sort, SortBy::CreatedAtDesc);
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.quota_bytes, Some(DEFAULT_QUOTA_BYTES));
        assert!(config.data_dir.ends_with(APP_DIR) || config.data_dir.ends_with(FALLBACK_DATA_DIR));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("default_sort: due_asc\nquota_bytes: null\n").unwrap();
        assert_eq!(config.default_sort, SortBy::DueAsc);
        assert_eq!(config.quota_bytes, None);
        assert_eq!(config.export_dir, Config::default().export_dir);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::from_yaml("colour: blue\n").is_err());
        assert!(Config::from_yaml("default_sort: newest\n").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "data_dir: /tmp/tasks\nexport_dir: exports\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tasks"));
        assert_eq!(config.export_dir, PathBuf::from("exports"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(Some(&temp.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
