//! Bulk loading for import adapters.
//!
//! An adapter turns a source file into one `TableDefinition` plus a stream of
//! rows. Loading into a table that already exists appends to it instead of
//! failing, so the same source can be imported more than once.

use tracing::{debug, info};

use crate::catalog::TableDefinition;
use crate::database::Database;
use crate::error::StorageResult;
use crate::row::Row;
use crate::value::{normalize, DataType, Value};

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Target table.
    pub table: String,
    /// Whether the table was created by this import.
    pub created: bool,
    /// Number of rows appended.
    pub appended: usize,
}

/// Registers `def` (tolerating an existing table) and appends every row.
pub fn import_rows<I>(db: &Database, def: TableDefinition, rows: I) -> StorageResult<ImportSummary>
where
    I: IntoIterator<Item = Row>,
{
    let table = def.name.clone();

    let created = match db.create_table(def) {
        Ok(_) => true,
        Err(e) if e.is_duplicate_table() => {
            debug!(table = %table, "table exists, appending to it");
            false
        }
        Err(e) => return Err(e),
    };

    let handle = db.table(&table)?;
    let mut appended = 0;
    for row in rows {
        handle.append_row(&row)?;
        appended += 1;
    }

    info!(table = %table, created, appended, "import finished");
    Ok(ImportSummary {
        table,
        created,
        appended,
    })
}

/// Guesses a column type from textual samples.
///
/// Empty samples are ignored. All integers gives `Integer`, all numbers
/// `Decimal`, all booleans `Boolean`; anything else (or no samples) is `Text`.
pub fn infer_type<'a, I>(samples: I) -> DataType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut inferred: Option<DataType> = None;

    for sample in samples.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
        let kind = normalize(&Value::text(sample)).data_type();
        inferred = Some(match (inferred, kind) {
            (None, kind) => kind,
            (Some(a), b) if a == b => a,
            (Some(DataType::Integer), DataType::Decimal)
            | (Some(DataType::Decimal), DataType::Integer) => DataType::Decimal,
            _ => return DataType::Text,
        });
    }

    inferred.unwrap_or(DataType::Text)
}
