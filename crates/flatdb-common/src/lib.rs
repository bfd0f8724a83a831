//! # flatdb-common
//!
//! Configuration and shared constants for FlatDB.
//!
//! This crate holds the pieces every other FlatDB crate agrees on:
//!
//! - **Config**: `DatabaseConfig`, describing where a database lives on disk
//! - **Constants**: file names and suffixes of the on-disk layout
//!
//! ## Example
//!
//! ```rust
//! use flatdb_common::config::DatabaseConfig;
//!
//! let config = DatabaseConfig::with_data_dir("/var/lib/flatdb/sales");
//! assert!(config.catalog_path().ends_with("schema.json"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;

pub use config::DatabaseConfig;
pub use constants::*;
