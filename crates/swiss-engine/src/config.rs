//! Configuration file loading.
//!
//! Settings come from `swiss.toml` in the current directory unless a path is
//! given. A missing file yields the defaults.

use crate::pairing::PairingOptions;
use crate::rating::DEFAULT_K_FACTOR;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Rating settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RatingConfig {
    /// K-factor for players without a career record. Defaults to 20.
    #[serde(default = "default_k_factor")]
    pub default_k_factor: u32,
}

fn default_k_factor() -> u32 {
    DEFAULT_K_FACTOR
}

impl Default for RatingConfig {
    fn default() -> Self {
        RatingConfig {
            default_k_factor: default_k_factor(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SwissConfig {
    /// Directory holding `tournament.json`, `players.json` and `archive/`.
    /// Defaults to `data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub pairing: PairingOptions,
    #[serde(default)]
    pub rating: RatingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for SwissConfig {
    fn default() -> Self {
        SwissConfig {
            data_dir: default_data_dir(),
            pairing: PairingOptions::default(),
            rating: RatingConfig::default(),
        }
    }
}

impl SwissConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// Currently returns `swiss.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("swiss.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_toml_config() {
        let toml_content = r#"
data_dir = "/var/lib/swiss"

[pairing]
allow_forced_repeats = false

[rating]
default_k_factor = 40
"#;

        let config: SwissConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/swiss"));
        assert!(!config.pairing.allow_forced_repeats);
        assert_eq!(config.rating.default_k_factor, 40);
    }

    #[test]
    fn test_parse_toml_with_missing_optional_fields() {
        let toml_content = r#"
[pairing]

[rating]
"#;

        let config: SwissConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data")); // default
        assert!(config.pairing.allow_forced_repeats); // default
        assert_eq!(config.rating.default_k_factor, 20); // default
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: SwissConfig = toml::from_str("").unwrap();
        assert_eq!(config, SwissConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swiss.toml");
        std::fs::write(&path, "data_dir = [").unwrap();

        let result = SwissConfig::load_from(&path);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SwissConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SwissConfig::default());
    }

    #[test]
    fn test_config_path_returns_expected_path() {
        assert_eq!(SwissConfig::config_path(), PathBuf::from("swiss.toml"));
    }
}
