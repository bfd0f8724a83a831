//! Schema catalog.
//!
//! The catalog maps table names to their column definitions and is persisted
//! as a single JSON document. Every mutation rewrites the whole document while
//! holding the write lock, so the cost of `add_table`/`remove_table` grows
//! with the number of tables.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atomic;
use crate::error::{StorageError, StorageResult};
use crate::value::DataType;

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Column {
    /// Creates a new column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A table definition: a name and an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl TableDefinition {
    /// Creates a new table definition.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Looks up a column by name.
    ///
    /// An exact match wins; otherwise the first case-insensitive match is
    /// returned.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Returns the column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Checks that the definition can be stored.
    ///
    /// The table name becomes a file name, so it may not contain path
    /// separators or be a relative path component.
    pub fn validate(&self) -> StorageResult<()> {
        let invalid = |msg: String| Err(StorageError::InvalidDefinition(msg));

        if self.name.trim().is_empty() {
            return invalid("table name is empty".to_string());
        }
        let is_separator = |c: char| matches!(c, '/' | '\\' | '\0');
        if self.name == "." || self.name == ".." || self.name.contains(is_separator) {
            return invalid(format!("'{}' is not a usable table name", self.name));
        }
        if self.columns.is_empty() {
            return invalid(format!("table '{}' has no columns", self.name));
        }

        for (i, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return invalid(format!("column {} of table '{}' has no name", i + 1, self.name));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return invalid(format!(
                    "duplicate column '{}' in table '{}'",
                    column.name, self.name
                ));
            }
        }

        Ok(())
    }
}

/// Persistent registry of table definitions.
#[derive(Debug)]
pub struct Catalog {
    /// Path of the catalog document.
    path: PathBuf,
    /// Whether document writes are fsynced.
    sync_writes: bool,
    /// Tables by name.
    tables: RwLock<BTreeMap<String, TableDefinition>>,
}

impl Catalog {
    /// Opens the catalog at `path`, creating an empty one if absent.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with(path, true)
    }

    /// Opens the catalog with explicit fsync behaviour.
    pub fn open_with(path: impl AsRef<Path>, sync_writes: bool) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(StorageError::io(dir))?;
        }

        match fs::read(&path) {
            Ok(data) => {
                let tables: BTreeMap<String, TableDefinition> = serde_json::from_slice(&data)
                    .map_err(|source| StorageError::Decode {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), tables = tables.len(), "loaded catalog");

                Ok(Self {
                    path,
                    sync_writes,
                    tables: RwLock::new(tables),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let catalog = Self {
                    path,
                    sync_writes,
                    tables: RwLock::new(BTreeMap::new()),
                };
                catalog.persist(&catalog.tables.read())?;
                debug!(path = %catalog.path.display(), "created empty catalog");
                Ok(catalog)
            }
            Err(e) => Err(StorageError::io(&path)(e)),
        }
    }

    /// Returns the path of the catalog document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a table and persists the catalog.
    pub fn add_table(&self, def: TableDefinition) -> StorageResult<()> {
        def.validate()?;

        let mut tables = self.tables.write();

        if tables.contains_key(&def.name) {
            return Err(StorageError::DuplicateTable(def.name));
        }

        let name = def.name.clone();
        tables.insert(name.clone(), def);

        if let Err(e) = self.persist(&tables) {
            tables.remove(&name);
            return Err(e);
        }

        debug!(table = %name, "added table to catalog");
        Ok(())
    }

    /// Gets a table definition.
    pub fn get_table(&self, name: &str) -> Option<TableDefinition> {
        self.tables.read().get(name).cloned()
    }

    /// Checks if a table exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Lists all table names in sorted order.
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if the catalog has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Removes a table and persists the catalog.
    pub fn remove_table(&self, name: &str) -> StorageResult<TableDefinition> {
        let mut tables = self.tables.write();

        let def = tables
            .remove(name)
            .ok_or_else(|| StorageError::UnknownTable(name.to_string()))?;

        if let Err(e) = self.persist(&tables) {
            tables.insert(def.name.clone(), def);
            return Err(e);
        }

        debug!(table = %name, "removed table from catalog");
        Ok(def)
    }

    /// Writes the whole document. Callers hold the lock guarding `tables`.
    fn persist(&self, tables: &BTreeMap<String, TableDefinition>) -> StorageResult<()> {
        let data = serde_json::to_vec_pretty(tables)?;
        atomic::replace_with(&self.path, self.sync_writes, |w| {
            w.write_all(&data).map_err(StorageError::io(&self.path))
        })
    }
}
