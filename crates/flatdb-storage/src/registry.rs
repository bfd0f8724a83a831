//! Shared table-file handles.
//!
//! Mutual exclusion on a data file lives in its `TableFile` handle, so every
//! operation on a table must go through the same handle. The registry opens
//! a handle on first use and hands out clones of the same `Arc` afterwards.
//!
//! Handles are keyed by the exact table name. Names differing only in case
//! (`users`, `USERS`) are distinct tables with distinct handles. On a
//! case-insensitive filesystem both resolve to the same data file, and their
//! locks no longer exclude each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StorageResult;
use crate::table::TableFile;

/// Owns one `TableFile` per table name.
#[derive(Debug)]
pub struct TableRegistry {
    /// Directory holding the data files.
    dir: PathBuf,
    /// Whether rewrites are fsynced.
    sync_writes: bool,
    /// Open handles by table name.
    handles: Mutex<HashMap<String, Arc<TableFile>>>,
}

impl TableRegistry {
    /// Creates an empty registry over `dir`.
    pub fn new(dir: impl Into<PathBuf>, sync_writes: bool) -> Self {
        Self {
            dir: dir.into(),
            sync_writes,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the handle for `table`, opening it on first use.
    pub fn get_or_open(&self, table: &str) -> StorageResult<Arc<TableFile>> {
        let mut handles = self.handles.lock();

        if let Some(handle) = handles.get(table) {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(TableFile::open(&self.dir, table, self.sync_writes)?);
        handles.insert(table.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Returns the handle for `table` if it is already open.
    pub fn get(&self, table: &str) -> Option<Arc<TableFile>> {
        self.handles.lock().get(table).cloned()
    }

    /// Forgets the handle for `table`.
    ///
    /// Outstanding clones stay usable; the next `get_or_open` creates a new
    /// handle.
    pub fn evict(&self, table: &str) -> Option<Arc<TableFile>> {
        self.handles.lock().remove(table)
    }

    /// Number of open handles.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Returns true if no handle is open.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}
