use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::Layout;
use crate::session::positions::DEFAULT_SECTION_SPACING;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_path: String,
    /// Layout applied to a brand-new draft
    #[serde(default = "default_layout")]
    pub default_layout: String,
    /// Vertical distance between custom sections when they are restacked
    #[serde(default = "default_section_spacing")]
    pub section_spacing: f64,
    #[serde(default = "default_preview_width")]
    pub preview_width: u16,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            default_layout: default_layout(),
            section_spacing: default_section_spacing(),
            preview_width: default_preview_width(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

// Default value functions
fn default_layout() -> String {
    Layout::Classic.key().to_string()
}

fn default_section_spacing() -> f64 {
    DEFAULT_SECTION_SPACING
}

fn default_preview_width() -> u16 {
    80
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let mut config = Self::load_from(&config_path)?;
            // An empty path means "the profile's default location"
            if config.database_path.trim().is_empty() {
                config.database_path = Self::default_database_path_for_profile(profile);
            }
            Ok(config)
        } else {
            // Create default config and save it
            let mut config = Config {
                database_path: Self::default_database_path_for_profile(profile),
                ..Config::default()
            };
            if let Err(e) = config.save_to(&config_path) {
                log::error!("Failed to save config file {:?}: {}", config_path, e);
                return Err(e);
            }
            log::info!("Created default config at {:?}", config_path);
            Ok(config)
        }
    }

    /// Read and parse a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        let config: Config = toml::from_str(&contents)?;
        log::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories as needed
    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| {
                ConfigError::ConfigDirError("Could not determine config directory".to_string())
            })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("storage.db").to_string_lossy().to_string()
        } else {
            // Fallback paths - platform-specific
            #[cfg(target_os = "macos")]
            {
                format!("~/Library/Application Support/{}/storage.db", profile.app_name())
            }
            #[cfg(not(target_os = "macos"))]
            {
                format!("~/.local/share/{}/storage.db", profile.app_name())
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// The configured default layout; unknown keys resolve to classic
    pub fn default_layout(&self) -> Layout {
        Layout::from_key(&self.default_layout)
    }

    /// Section spacing, ignoring values that cannot be used as an offset
    pub fn section_spacing(&self) -> f64 {
        if self.section_spacing.is_finite() && self.section_spacing >= 0.0 {
            self.section_spacing
        } else {
            log::warn!(
                "Invalid section_spacing {}, using {}",
                self.section_spacing,
                DEFAULT_SECTION_SPACING
            );
            DEFAULT_SECTION_SPACING
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gets_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.default_layout(), Layout::Classic);
        assert_eq!(config.section_spacing(), 60.0);
        assert_eq!(config.preview_width, 80);
        assert_eq!(config.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn partial_file_keeps_given_values() {
        let config: Config =
            toml::from_str("default_layout = \"modern\"\nsection_spacing = 45.0\n").unwrap();
        assert_eq!(config.default_layout(), Layout::Modern);
        assert_eq!(config.section_spacing(), 45.0);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = Config {
            default_layout: "hologram".into(),
            section_spacing: -5.0,
            ..Config::default()
        };
        assert_eq!(config.default_layout(), Layout::Classic);
        assert_eq!(config.section_spacing(), DEFAULT_SECTION_SPACING);
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir()
            .join(format!("invoice-studio-config-{}", utils::random_digits(8)));
        let path = dir.join("config.toml");

        let mut config = Config {
            database_path: "/tmp/x/storage.db".into(),
            preview_width: 100,
            config_version: None,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.config_version, Some(CURRENT_CONFIG_VERSION));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = toml::from_str::<Config>("preview_width = \"wide\"").unwrap_err();
        assert!(matches!(ConfigError::from(err), ConfigError::ParseError(_)));
    }
}
