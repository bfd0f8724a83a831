//! Database facade.
//!
//! Ties a `Catalog` to the `TableRegistry` of the same data directory and
//! implements the resolve → coerce → mutate flow callers go through:
//!
//! ```text
//!   literal text ──► TableDefinition (Catalog) ──► coerce ──► TableFile op
//! ```
//!
//! Inserts coerce leniently (a literal that does not fit its column is stored
//! as text); predicate values coerce strictly and fail with `TypeMismatch`.

use std::sync::Arc;

use flatdb_common::DatabaseConfig;
use tracing::{debug, info};

use crate::catalog::{Catalog, TableDefinition};
use crate::error::{StorageError, StorageResult};
use crate::registry::TableRegistry;
use crate::row::Row;
use crate::table::{ScanOutput, TableFile};
use crate::value::{coerce, coerce_lenient, Value};

/// A database directory: one catalog plus its table files.
#[derive(Debug)]
pub struct Database {
    /// Configuration.
    config: DatabaseConfig,
    /// Table definitions.
    catalog: Arc<Catalog>,
    /// One handle per table file.
    tables: TableRegistry,
}

impl Database {
    /// Opens (or creates) the database described by `config`.
    pub fn open(config: DatabaseConfig) -> StorageResult<Self> {
        config
            .validate()
            .map_err(StorageError::InvalidConfig)?;

        let catalog = Arc::new(Catalog::open_with(config.catalog_path(), config.sync_writes)?);
        Self::with_catalog(config, catalog)
    }

    /// Builds a database around an already opened catalog.
    pub fn with_catalog(config: DatabaseConfig, catalog: Arc<Catalog>) -> StorageResult<Self> {
        let tables = TableRegistry::new(&config.data_dir, config.sync_writes);

        info!(
            data_dir = %config.data_dir.display(),
            tables = catalog.len(),
            "opened database"
        );

        Ok(Self {
            config,
            catalog,
            tables,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Resolves a table definition.
    pub fn definition(&self, table: &str) -> StorageResult<TableDefinition> {
        self.catalog
            .get_table(table)
            .ok_or_else(|| StorageError::UnknownTable(table.to_string()))
    }

    /// Returns the shared handle of a cataloged table.
    pub fn table(&self, table: &str) -> StorageResult<Arc<TableFile>> {
        if !self.catalog.contains(table) {
            return Err(StorageError::UnknownTable(table.to_string()));
        }
        self.tables.get_or_open(table)
    }

    // =========================================================================
    // DDL
    // =========================================================================

    /// Adds a table to the catalog and creates its (empty) data file.
    ///
    /// A data file left behind by an earlier table of the same name is
    /// emptied, so a new table never starts with stale rows.
    pub fn create_table(&self, def: TableDefinition) -> StorageResult<Arc<TableFile>> {
        let name = def.name.clone();
        self.catalog.add_table(def)?;

        let handle = self.tables.get_or_open(&name)?;
        handle.clear()?;
        Ok(handle)
    }

    /// Removes a table from the catalog and deletes its data file.
    pub fn drop_table(&self, table: &str) -> StorageResult<TableDefinition> {
        let def = self.catalog.remove_table(table)?;

        // Delete through the shared handle so in-flight operations finish first.
        let handle = self.tables.get_or_open(table)?;
        handle.delete_file()?;
        self.tables.evict(table);

        debug!(table, "dropped table");
        Ok(def)
    }

    // =========================================================================
    // Coercion
    // =========================================================================

    /// Builds a row from positional literals, one per declared column.
    ///
    /// Literals that do not parse as their column type are stored as text.
    pub fn build_row(def: &TableDefinition, literals: &[&str]) -> StorageResult<Row> {
        if literals.len() != def.columns.len() {
            return Err(StorageError::ArityMismatch {
                expected: def.columns.len(),
                actual: literals.len(),
            });
        }

        Ok(def
            .columns
            .iter()
            .zip(literals)
            .map(|(column, literal)| {
                (
                    column.name.clone(),
                    coerce_lenient(literal, column.data_type, &column.name),
                )
            })
            .collect())
    }

    /// Resolves a predicate column and strictly coerces its literal.
    ///
    /// Returns the declared column name (which may differ in case from
    /// `column`) and the typed value.
    pub fn predicate(
        def: &TableDefinition,
        column: &str,
        literal: &str,
    ) -> StorageResult<(String, Value)> {
        let col = def.column(column).ok_or_else(|| StorageError::UnknownColumn {
            table: def.name.clone(),
            column: column.to_string(),
        })?;
        let value = coerce(literal, col.data_type)?;
        Ok((col.name.clone(), value))
    }

    // =========================================================================
    // DML
    // =========================================================================

    /// Inserts one row given as positional literals.
    pub fn insert(&self, table: &str, literals: &[&str]) -> StorageResult<Row> {
        let def = self.definition(table)?;
        let row = Self::build_row(&def, literals)?;
        self.table(table)?.append_row(&row)?;
        Ok(row)
    }

    /// Scans a table, returning its definition alongside the rows.
    pub fn select(&self, table: &str) -> StorageResult<(TableDefinition, ScanOutput)> {
        let def = self.definition(table)?;
        let out = self.table(table)?.scan()?;
        Ok((def, out))
    }

    /// `UPDATE table SET set_col = set_lit WHERE where_col = where_lit`.
    pub fn update(
        &self,
        table: &str,
        where_col: &str,
        where_lit: &str,
        set_col: &str,
        set_lit: &str,
    ) -> StorageResult<usize> {
        let def = self.definition(table)?;
        let (set_col, set_val) = Self::predicate(&def, set_col, set_lit)?;
        let (where_col, where_val) = Self::predicate(&def, where_col, where_lit)?;
        self.table(table)?
            .update_rows(&where_col, &where_val, &set_col, set_val)
    }

    /// `DELETE FROM table WHERE where_col = where_lit`.
    pub fn delete(&self, table: &str, where_col: &str, where_lit: &str) -> StorageResult<usize> {
        let def = self.definition(table)?;
        let (where_col, where_val) = Self::predicate(&def, where_col, where_lit)?;
        self.table(table)?.delete_rows(&where_col, &where_val)
    }
}
