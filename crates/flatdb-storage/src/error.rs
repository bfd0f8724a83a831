//! Storage error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::value::DataType;

/// Errors returned by catalog and table-file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Create, open, read, write or rename failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// File or directory the operation was acting on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A catalog document or row record is not valid JSON of the expected shape.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// File the malformed content was read from.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A row or the catalog could not be serialized.
    #[error("failed to encode: {source}")]
    Encode {
        /// The underlying encode error.
        #[from]
        source: serde_json::Error,
    },

    /// Table already exists.
    #[error("table '{0}' already exists")]
    DuplicateTable(String),

    /// Table does not exist.
    #[error("table '{0}' does not exist")]
    UnknownTable(String),

    /// Column is not declared by the table.
    #[error("column '{column}' not found in table '{table}'")]
    UnknownColumn {
        /// Table that was searched.
        table: String,
        /// Requested column.
        column: String,
    },

    /// A literal does not parse as the declared column type.
    #[error("cannot interpret '{literal}' as {expected}")]
    TypeMismatch {
        /// The literal as supplied.
        literal: String,
        /// The declared type.
        expected: DataType,
    },

    /// A table definition is malformed.
    #[error("invalid table definition: {0}")]
    InvalidDefinition(String),

    /// The database configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Wrong number of values for a positional insert.
    #[error("expected {expected} values, got {actual}")]
    ArityMismatch {
        /// Number of declared columns.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },
}

impl StorageError {
    /// Builds a closure mapping an `io::Error` on `path` into `StorageError::Io`.
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true if this is a `DuplicateTable` error.
    pub fn is_duplicate_table(&self) -> bool {
        matches!(self, StorageError::DuplicateTable(_))
    }

    /// Returns true if this is an `UnknownTable` error.
    pub fn is_unknown_table(&self) -> bool {
        matches!(self, StorageError::UnknownTable(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
