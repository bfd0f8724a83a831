//! Atomic whole-file replacement.
//!
//! Content is written to `<path>.tmp` in the same directory and renamed over
//! `path`. Readers see either the old file or the complete new one. A crash
//! between the write and the rename leaves the original untouched and the
//! temp file behind; the next replacement truncates it.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flatdb_common::TEMP_FILE_SUFFIX;

use crate::error::{StorageError, StorageResult};

/// Returns the temp-file path used while replacing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

/// Replaces `path` with whatever `write` produces.
///
/// With `sync` set, the temp file is fsynced before the rename and the parent
/// directory after it. On any failure the temp file is removed.
pub fn replace_with<F>(path: &Path, sync: bool, write: F) -> StorageResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> StorageResult<()>,
{
    let tmp_path = temp_path(path);
    let result = write_then_rename(path, &tmp_path, sync, write);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_then_rename<F>(path: &Path, tmp_path: &Path, sync: bool, write: F) -> StorageResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> StorageResult<()>,
{
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp_path)
        .map_err(StorageError::io(tmp_path))?;

    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(StorageError::io(tmp_path))?;

    let file = writer
        .into_inner()
        .map_err(|e| StorageError::io(tmp_path)(e.into_error()))?;
    if sync {
        file.sync_all().map_err(StorageError::io(tmp_path))?;
    }
    drop(file);

    fs::rename(tmp_path, path).map_err(StorageError::io(path))?;

    // Make the rename itself durable.
    if sync {
        if let Some(dir) = path.parent() {
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }
    }

    Ok(())
}
