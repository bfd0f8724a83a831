//! On-disk layout constants.
//!
//! A database directory looks like:
//!
//! ```text
//! <data_dir>/
//! ├── schema.json        # Catalog document (all table definitions)
//! ├── users.dat          # One line-delimited JSON record per row
//! └── users.dat.tmp      # Only present while (or after a crash during) a rewrite
//! ```

/// Default database directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data/my_first_db";

/// File name of the catalog document inside the data directory.
pub const CATALOG_FILE: &str = "schema.json";

/// Extension of per-table data files.
pub const DATA_FILE_EXTENSION: &str = "dat";

/// Suffix appended to a file path to form its rewrite temp file.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
