//! End-to-end persistence tests for the catalog and table files.
//!
//! These exercise the public API the way the shell and import adapters do:
//! open a database directory, mutate it, reopen it, and inspect what is on
//! disk.

use std::fs;
use std::sync::Arc;
use std::thread;

use flatdb_common::DatabaseConfig;
use flatdb_storage::atomic::temp_path;
use flatdb_storage::{
    import_rows, Catalog, Column, DataType, Database, Row, StorageError, TableDefinition, Value,
};
use tempfile::TempDir;

fn users() -> TableDefinition {
    TableDefinition::new(
        "users",
        vec![
            Column::new("id", DataType::Integer),
            Column::new("name", DataType::Text),
        ],
    )
}

fn user(id: i64, name: &str) -> Row {
    Row::from([("id", Value::Integer(id)), ("name", Value::text(name))])
}

fn open(tmp: &TempDir) -> Database {
    Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap()
}

#[test]
fn catalog_and_rows_survive_reopen() {
    let tmp = TempDir::new().unwrap();

    {
        let db = open(&tmp);
        let table = db.create_table(users()).unwrap();
        table.append_row(&user(1, "Alice")).unwrap();
        table.append_row(&user(2, "Bob")).unwrap();
    }

    let db = open(&tmp);
    assert_eq!(db.catalog().get_table("users"), Some(users()));
    assert_eq!(
        db.table("users").unwrap().read_all_rows().unwrap(),
        vec![user(1, "Alice"), user(2, "Bob")]
    );
}

#[test]
fn add_table_is_durable_before_returning() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    db.create_table(users()).unwrap();

    // A second, independent reader sees the table immediately.
    let other = Catalog::open_with(tmp.path().join("schema.json"), false).unwrap();
    assert_eq!(other.get_table("users"), Some(users()));

    let err = db.create_table(users()).unwrap_err();
    assert!(err.is_duplicate_table());
}

#[test]
fn worked_example_through_the_facade() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    db.create_table(users()).unwrap();

    db.insert("users", &["1", "'Alice'"]).unwrap();
    db.insert("users", &["2", "'Bob'"]).unwrap();

    assert_eq!(db.update("users", "id", "1", "name", "'Carol'").unwrap(), 1);
    let (_, out) = db.select("users").unwrap();
    assert_eq!(out.rows, vec![user(1, "Carol"), user(2, "Bob")]);

    assert_eq!(db.delete("users", "id", "2").unwrap(), 1);
    let (_, out) = db.select("users").unwrap();
    assert_eq!(out.rows, vec![user(1, "Carol")]);
    assert_eq!(out.skipped, 0);
}

#[test]
fn update_count_equals_rows_now_holding_the_value() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    let table = db.create_table(users()).unwrap();

    for (id, name) in [(1, "a"), (2, "b"), (1, "c"), (3, "d"), (1, "e")] {
        table.append_row(&user(id, name)).unwrap();
    }
    // Same id stored as text from an import path.
    table
        .append_row(&Row::from([("id", Value::text("1")), ("name", Value::text("f"))]))
        .unwrap();

    let updated = table
        .update_rows("id", &Value::Integer(1), "name", Value::text("X"))
        .unwrap();

    let rows = table.read_all_rows().unwrap();
    let holding = rows
        .iter()
        .filter(|r| r.get("name") == Some(&Value::text("X")))
        .count();
    assert_eq!(updated, 4);
    assert_eq!(holding, updated);
    assert_eq!(rows.len(), 6);
}

#[test]
fn drop_table_removes_both_catalog_entry_and_file() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    let table = db.create_table(users()).unwrap();
    table.append_row(&user(1, "Alice")).unwrap();
    let path = table.path().to_path_buf();

    db.drop_table("users").unwrap();

    assert!(!path.exists());
    assert!(matches!(db.table("users"), Err(StorageError::UnknownTable(_))));

    // Re-creating starts empty.
    let table = db.create_table(users()).unwrap();
    assert!(table.read_all_rows().unwrap().is_empty());
}

#[test]
fn interrupted_rewrite_leaves_original_content() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    let table = db.create_table(users()).unwrap();
    table.append_row(&user(1, "Alice")).unwrap();

    fs::write(temp_path(table.path()), "{\"id\":1,\"name\":\"Mallory\"}\n").unwrap();
    drop(db);

    let db = open(&tmp);
    assert_eq!(
        db.table("users").unwrap().read_all_rows().unwrap(),
        vec![user(1, "Alice")]
    );
}

#[test]
fn concurrent_writers_through_shared_handles() {
    let tmp = TempDir::new().unwrap();
    let db = Arc::new(open(&tmp));
    db.create_table(users()).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = (t * 1000 + i).to_string();
                    db.insert("users", &[id.as_str(), "'w'"]).unwrap();
                    if i % 10 == 9 {
                        db.delete("users", "id", &id).unwrap();
                    }
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    let (_, out) = db.select("users").unwrap();
    assert_eq!(out.rows.len(), 4 * 45);
    assert_eq!(out.skipped, 0);
}

#[test]
fn import_contract_tolerates_existing_table() {
    let tmp = TempDir::new().unwrap();
    let db = open(&tmp);
    db.create_table(users()).unwrap();

    let summary = import_rows(
        &db,
        users(),
        vec![
            Row::from([("id", Value::text("10")), ("name", Value::text("Imported"))]),
            Row::from([("id", Value::text("11")), ("extra", Value::Boolean(true))]),
        ],
    )
    .unwrap();

    assert!(!summary.created);
    assert_eq!(summary.appended, 2);

    assert_eq!(db.update("users", "id", "10", "name", "'Updated'").unwrap(), 1);
    let (_, out) = db.select("users").unwrap();
    assert_eq!(out.rows[0].get("name"), Some(&Value::text("Updated")));
    assert_eq!(out.rows[1].get("extra"), Some(&Value::Boolean(true)));
}
