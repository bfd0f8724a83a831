//! Per-table row store.
//!
//! Each table is backed by one file of line-delimited JSON records,
//! `<dir>/<table>.dat`. Appends go straight to the end of the file; updates
//! and deletes read every record, modify the sequence in memory and replace
//! the file atomically (see [`crate::atomic`]).
//!
//! A `TableFile` serializes the operations issued through it with a
//! reader-writer lock. Two handles on the same path do not exclude each
//! other, which is why handles are shared through
//! [`TableRegistry`](crate::TableRegistry).

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use flatdb_common::DATA_FILE_EXTENSION;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::atomic;
use crate::error::{StorageError, StorageResult};
use crate::row::Row;
use crate::value::Value;

/// Result of a full table scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutput {
    /// Decoded rows in file order.
    pub rows: Vec<Row>,
    /// Records that failed to decode and were left out of `rows`.
    pub skipped: usize,
}

/// Append-log of row records backing one table.
#[derive(Debug)]
pub struct TableFile {
    /// Table name.
    name: String,
    /// Path of the data file.
    path: PathBuf,
    /// Whether rewrites are fsynced.
    sync_writes: bool,
    /// Serializes operations issued through this handle.
    lock: RwLock<()>,
}

impl TableFile {
    /// Opens the data file for `table` in `dir`, creating an empty one if absent.
    pub fn open(dir: impl AsRef<Path>, table: &str, sync_writes: bool) -> StorageResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(StorageError::io(dir))?;

        let path = Self::data_path(dir, table);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(StorageError::io(&path))?;

        debug!(table, path = %path.display(), "opened table file");

        Ok(Self {
            name: table.to_string(),
            path,
            sync_writes,
            lock: RwLock::new(()),
        })
    }

    /// Returns the data file path for `table` in `dir`.
    pub fn data_path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{}.{}", table, DATA_FILE_EXTENSION))
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Appends one row as a single line.
    ///
    /// The row is not checked against any table definition.
    pub fn append_row(&self, row: &Row) -> StorageResult<()> {
        let mut line = serde_json::to_vec(row)?;
        line.push(b'\n');

        let _guard = self.lock.write();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(StorageError::io(&self.path))?;
        file.write_all(&line).map_err(StorageError::io(&self.path))
    }

    /// Reads every decodable row, in file order.
    pub fn read_all_rows(&self) -> StorageResult<Vec<Row>> {
        self.scan().map(|out| out.rows)
    }

    /// Reads every row and reports how many records were undecodable.
    ///
    /// A missing file scans as empty.
    pub fn scan(&self) -> StorageResult<ScanOutput> {
        let _guard = self.lock.read();
        self.scan_locked()
    }

    /// Returns the number of decodable rows.
    pub fn row_count(&self) -> StorageResult<usize> {
        self.scan().map(|out| out.rows.len())
    }

    /// Sets `set_col` to `set_val` on every row whose `where_col` loosely
    /// equals `where_val`. Returns the number of rows changed.
    ///
    /// Rows without `where_col` never match. When nothing matches the file is
    /// left as it is.
    pub fn update_rows(
        &self,
        where_col: &str,
        where_val: &Value,
        set_col: &str,
        set_val: Value,
    ) -> StorageResult<usize> {
        let _guard = self.lock.write();

        let ScanOutput { mut rows, skipped } = self.scan_locked()?;

        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| r.matches(where_col, where_val)) {
            row.insert(set_col, set_val.clone());
            updated += 1;
        }

        if updated > 0 {
            self.rewrite_after_scan(&rows, skipped)?;
        }

        debug!(table = %self.name, updated, "update_rows");
        Ok(updated)
    }

    /// Removes every row whose `where_col` loosely equals `where_val`.
    /// Returns the number of rows removed.
    pub fn delete_rows(&self, where_col: &str, where_val: &Value) -> StorageResult<usize> {
        let _guard = self.lock.write();

        let ScanOutput { rows, skipped } = self.scan_locked()?;
        let before = rows.len();

        let kept: Vec<Row> = rows
            .into_iter()
            .filter(|r| !r.matches(where_col, where_val))
            .collect();
        let deleted = before - kept.len();

        if deleted > 0 {
            self.rewrite_after_scan(&kept, skipped)?;
        }

        debug!(table = %self.name, deleted, "delete_rows");
        Ok(deleted)
    }

    /// Atomically replaces the file content with `rows`.
    pub fn rewrite(&self, rows: &[Row]) -> StorageResult<()> {
        let _guard = self.lock.write();
        self.rewrite_locked(rows)
    }

    /// Empties the data file. Returns true if it held any content.
    pub fn clear(&self) -> StorageResult<bool> {
        let _guard = self.lock.write();

        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(StorageError::io(&self.path)(e)),
        };
        if len == 0 {
            return Ok(false);
        }

        warn!(table = %self.name, bytes = len, "discarding leftover table data");
        self.rewrite_locked(&[])?;
        Ok(true)
    }

    /// Removes the data file. A missing file is not an error.
    pub fn delete_file(&self) -> StorageResult<()> {
        let _guard = self.lock.write();

        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(table = %self.name, "deleted table file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&self.path)(e)),
        }
    }

    // =========================================================================
    // Internals (callers hold `lock`)
    // =========================================================================

    fn scan_locked(&self) -> StorageResult<ScanOutput> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ScanOutput::default()),
            Err(e) => return Err(StorageError::io(&self.path)(e)),
        };

        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut out = ScanOutput::default();
        let mut line_no = 0usize;

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(StorageError::io(&self.path))?;
            if read == 0 {
                break;
            }
            line_no += 1;

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            // Invalid UTF-8 surfaces here as a decode error, not an I/O error.
            match serde_json::from_slice::<Row>(&line) {
                Ok(row) => out.rows.push(row),
                Err(e) => {
                    warn!(
                        table = %self.name,
                        line = line_no,
                        error = %e,
                        "skipping undecodable record"
                    );
                    out.skipped += 1;
                }
            }
        }

        Ok(out)
    }

    fn rewrite_after_scan(&self, rows: &[Row], skipped: usize) -> StorageResult<()> {
        if skipped > 0 {
            warn!(
                table = %self.name,
                skipped,
                "rewrite drops records that could not be decoded"
            );
        }
        self.rewrite_locked(rows)
    }

    fn rewrite_locked(&self, rows: &[Row]) -> StorageResult<()> {
        let tmp_path = atomic::temp_path(&self.path);
        atomic::replace_with(&self.path, self.sync_writes, |w| {
            for row in rows {
                serde_json::to_writer(&mut *w, row)?;
                w.write_all(b"\n").map_err(StorageError::io(&tmp_path))?;
            }
            Ok(())
        })?;

        debug!(table = %self.name, rows = rows.len(), "rewrote table file");
        Ok(())
    }
}
