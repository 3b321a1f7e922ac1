//! Configuration file support for Spartan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/spartan/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_document_file")]
    pub document_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            document_file: default_document_file(),
        }
    }
}

/// Long-term storage optimization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Serialized size above which old history is slimmed down
    #[serde(default = "default_optimize_threshold_bytes")]
    pub optimize_threshold_bytes: usize,

    #[serde(default = "default_optimize_age_days")]
    pub optimize_age_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            optimize_threshold_bytes: default_optimize_threshold_bytes(),
            optimize_age_days: default_optimize_age_days(),
        }
    }
}

/// Reporting parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Weeks per training cycle; a report is shown when one closes
    #[serde(default = "default_cycle_weeks")]
    pub cycle_weeks: u32,

    /// Completed days needed to call a week done
    #[serde(default = "default_week_complete_days")]
    pub week_complete_days: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cycle_weeks: default_cycle_weeks(),
            week_complete_days: default_week_complete_days(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("spartan")
}

fn default_document_file() -> String {
    "spartan.json".into()
}

fn default_optimize_threshold_bytes() -> usize {
    2_000_000
}

fn default_optimize_age_days() -> i64 {
    365
}

fn default_cycle_weeks() -> u32 {
    4
}

fn default_week_complete_days() -> usize {
    5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.report.cycle_weeks == 0 {
            return Err(Error::Config("report.cycle_weeks must be at least 1".into()));
        }
        if self.data.document_file.trim().is_empty() {
            return Err(Error::Config("data.document_file is empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("spartan").join("config.toml")
    }

    /// Path of the document file under `data_dir`
    pub fn document_path(&self) -> PathBuf {
        self.data.data_dir.join(&self.data.document_file)
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.document_file, "spartan.json");
        assert_eq!(config.storage.optimize_threshold_bytes, 2_000_000);
        assert_eq!(config.storage.optimize_age_days, 365);
        assert_eq!(config.report.cycle_weeks, 4);
        assert_eq!(config.report.week_complete_days, 5);
        assert!(config.document_path().ends_with("spartan/spartan.json"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.report.cycle_weeks = 6;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.report.cycle_weeks, 6);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[report]
week_complete_days = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.report.week_complete_days, 4);
        assert_eq!(config.report.cycle_weeks, 4); // default
        assert_eq!(config.storage.optimize_age_days, 365);
    }

    #[test]
    fn test_zero_cycle_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[report]\ncycle_weeks = 0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
