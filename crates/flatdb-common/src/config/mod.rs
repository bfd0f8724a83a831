//! Configuration for FlatDB.

mod database;

pub use database::DatabaseConfig;
