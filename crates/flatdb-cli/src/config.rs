//! Configuration file support for the shell.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use flatdb_common::DatabaseConfig;

/// Shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Database directory. Falls back to the engine default when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Whether writes are fsynced before returning.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Enable timing by default.
    #[serde(default)]
    pub timing: bool,

    /// History file path.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Maximum history size.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_sync_writes() -> bool {
    true
}

fn default_history_size() -> usize {
    1000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_writes: default_sync_writes(),
            timing: false,
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
    /// 1. ~/.config/flatdb/config.toml
    /// 2. ~/.flatdb/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("flatdb").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".flatdb").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// History file, defaulting to the platform's local data directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("flatdb").join("history")))
    }

    /// Builds the engine configuration.
    pub fn database_config(&self) -> DatabaseConfig {
        let config = match &self.data_dir {
            Some(dir) => DatabaseConfig::with_data_dir(dir),
            None => DatabaseConfig::default(),
        };
        config.sync_writes(self.sync_writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(config.data_dir.is_none());
        assert!(config.sync_writes);
        assert_eq!(config.history_size, 1000);

        let db = config.database_config();
        assert_eq!(db.data_dir, PathBuf::from(flatdb_common::DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            data_dir = "/var/lib/flatdb"
            sync_writes = false
            timing = true
        "#;

        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/flatdb")));
        assert!(!config.sync_writes);
        assert!(config.timing);
        assert_eq!(config.history_size, 1000);

        let db = config.database_config();
        assert_eq!(db.data_dir, PathBuf::from("/var/lib/flatdb"));
        assert!(!db.sync_writes);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "history_file = \"/tmp/h\"\nhistory_size = 10\n").unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/h")));
        assert_eq!(config.history_size, 10);

        std::fs::write(&path, "sync_writes = \"maybe\"").unwrap();
        assert!(CliConfig::from_file(&path).is_err());
        assert!(CliConfig::from_file(&temp_dir.path().join("missing.toml")).is_err());
    }
}
