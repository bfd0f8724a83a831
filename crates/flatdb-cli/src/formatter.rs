//! Output formatting for statement results.

use comfy_table::{Cell, ContentArrangement, Table};

use flatdb_storage::{Row, TableDefinition};

use crate::interpreter::Outcome;

/// Placeholder for a declared column the row does not carry.
const NULL: &str = "NULL";

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

/// Renders rows in declared column order.
pub fn format_rows(definition: &TableDefinition, rows: &[Row]) -> String {
    let mut table = new_table();
    table.set_header(definition.columns.iter().map(|c| Cell::new(&c.name)));

    for row in rows {
        let cells = definition.columns.iter().map(|c| match row.get(&c.name) {
            Some(v) => Cell::new(v.to_string()),
            None => Cell::new(NULL),
        });
        table.add_row(cells);
    }

    table.to_string()
}

/// Renders a table's column list.
pub fn format_definition(definition: &TableDefinition) -> String {
    let mut table = new_table();
    table.set_header(vec!["Column", "Type"]);
    for column in &definition.columns {
        table.add_row(vec![Cell::new(&column.name), Cell::new(column.data_type)]);
    }
    format!("Table \"{}\"\n{}", definition.name, table)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Formats an outcome for display.
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created(name) => format!("Table '{}' created.", name),
        Outcome::Inserted(_) => "1 row inserted.".to_string(),
        Outcome::Rows {
            definition,
            rows,
            skipped,
        } => {
            let mut out = format_rows(definition, rows);
            out.push_str(&format!("\n({} row{})", rows.len(), plural(rows.len())));
            if *skipped > 0 {
                out.push_str(&format!(
                    "\nWarning: {} unreadable record{} skipped.",
                    skipped,
                    plural(*skipped)
                ));
            }
            out
        }
        Outcome::Updated { table, count } => {
            format!("{} row{} updated in '{}'.", count, plural(*count), table)
        }
        Outcome::Deleted { table, count } => {
            format!("{} row{} deleted from '{}'.", count, plural(*count), table)
        }
        Outcome::Tables(names) if names.is_empty() => "No tables found.".to_string(),
        Outcome::Tables(names) => {
            let mut table = new_table();
            table.set_header(vec!["Tables"]);
            for name in names {
                table.add_row(vec![name]);
            }
            table.to_string()
        }
        Outcome::Dropped(name) => format!("Table '{}' dropped.", name),
    }
}
