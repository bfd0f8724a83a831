//! Database configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{CATALOG_FILE, DEFAULT_DATA_DIR};

/// Configuration of a single database directory.
///
/// # Example
///
/// ```rust
/// use flatdb_common::config::DatabaseConfig;
///
/// let config = DatabaseConfig::default();
/// assert_eq!(config.catalog_file, "schema.json");
/// assert!(config.sync_writes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding the catalog document and all table data files.
    pub data_dir: PathBuf,

    /// File name of the catalog document, relative to `data_dir`.
    /// Default: "schema.json"
    pub catalog_file: String,

    /// Whether rewrites are fsynced (file and directory) before returning.
    /// Default: true
    pub sync_writes: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            catalog_file: CATALOG_FILE.to_string(),
            sync_writes: true,
        }
    }
}

impl DatabaseConfig {
    /// Creates a configuration rooted at the given directory.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a configuration for tests: no fsync.
    #[must_use]
    pub fn for_testing(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            catalog_file: CATALOG_FILE.to_string(),
            sync_writes: false,
        }
    }

    /// Sets whether writes are fsynced.
    #[must_use]
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Full path of the catalog document.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }

        if self.catalog_file.is_empty() {
            return Err("catalog_file must not be empty".to_string());
        }

        if self.catalog_file.contains(|c: char| c == '/' || c == '\\') {
            return Err("catalog_file must be a plain file name".to_string());
        }

        Ok(())
    }
}
