//! Configuration file support for the CLI.
//!
//! Loads CLI configuration from TOML files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tabula_common::EngineConfig;

/// CLI configuration.
///
/// ```toml
/// output_format = "table"
/// history_file = "/tmp/tabula_history"
///
/// [engine]
/// root_dir = "/var/lib/tabula"
/// lock_backend = "file"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Default output format (`raw` or `table`).
    #[serde(default = "default_format")]
    pub output_format: String,

    /// History file path.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Maximum history size.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_format() -> String {
    "raw".to_string()
}

fn default_history_size() -> usize {
    1000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output_format: default_format(),
            history_file: None,
            history_size: default_history_size(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. `<config dir>/tabula/config.toml`
    /// 2. `~/.tabula/config.toml`
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".tabula").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Returns the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tabula").join("config.toml"))
    }

    /// Returns the history file: the configured one, or one under the local
    /// data directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("tabula").join("history")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_common::LockBackend;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.output_format, "raw");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.history_size, 1000);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            output_format = "table"

            [engine]
            root_dir = "/srv/tabula"
            lock_backend = "memory"
        "#;

        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output_format, "table");
        assert_eq!(config.engine.root_dir, PathBuf::from("/srv/tabula"));
        assert_eq!(config.engine.lock_backend, LockBackend::Memory);
        assert!(config.history_file.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "history_file = \"/tmp/h\"\n").unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/h")));
        assert_eq!(config.engine, EngineConfig::default());

        std::fs::write(&path, "output_format = [").unwrap();
        assert!(CliConfig::from_file(&path).is_err());
        assert!(CliConfig::from_file(&temp_dir.path().join("missing.toml")).is_err());
    }
}
