//! # flatdb-storage
//!
//! Persistence and mutation engine for FlatDB: a single-node, file-backed
//! tabular store.
//!
//! - **Catalog**: table definitions, persisted as one JSON document
//! - **TableFile**: one line-delimited JSON file per table; append, scan,
//!   update and delete (the latter two by atomic whole-file rewrite)
//! - **TableRegistry**: one shared handle per table so its lock serializes
//!   every operation on the file
//! - **Value coercion**: textual literals to typed scalars, and the loose
//!   equality used by predicates
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Database                        │
//! │  ┌─────────────┐   ┌───────────────┐   ┌──────────┐  │
//! │  │   Catalog   │   │ TableRegistry │   │  coerce  │  │
//! │  │ schema.json │   │  Arc<TableFile>│  │ normalize│  │
//! │  └─────────────┘   └───────┬───────┘   └──────────┘  │
//! └────────────────────────────┼─────────────────────────┘
//!                              ▼
//!                 <table>.dat  (+ <table>.dat.tmp during rewrite)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use flatdb_common::DatabaseConfig;
//! use flatdb_storage::{Column, DataType, Database, TableDefinition};
//!
//! # fn main() -> flatdb_storage::StorageResult<()> {
//! let db = Database::open(DatabaseConfig::with_data_dir("data/example"))?;
//! db.create_table(TableDefinition::new(
//!     "users",
//!     vec![Column::new("id", DataType::Integer), Column::new("name", DataType::Text)],
//! ))?;
//! db.insert("users", &["1", "'Alice'"])?;
//! assert_eq!(db.update("users", "id", "1", "name", "'Carol'")?, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
mod catalog;
mod database;
mod error;
pub mod import;
mod registry;
mod row;
mod table;
pub mod value;

pub use catalog::{Catalog, Column, TableDefinition};
pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use import::{import_rows, ImportSummary};
pub use registry::TableRegistry;
pub use row::Row;
pub use table::{ScanOutput, TableFile};
pub use value::{coerce, coerce_lenient, normalize, DataType, Value};
