//! Statement parsing and execution.
//!
//! Supports a fixed set of statement shapes, with case-insensitive keywords
//! and an optional trailing semicolon:
//!
//! ```text
//! CREATE TABLE users (id INT, name TEXT)
//! INSERT INTO users VALUES (1, 'Alice')
//! SELECT * FROM users
//! UPDATE users SET name = 'Bob' WHERE id = 1
//! DELETE FROM users WHERE id = 1
//! SHOW TABLES
//! DROP TABLE users
//! ```

use flatdb_storage::{Column, DataType, Database, Row, StorageError, TableDefinition};
use thiserror::Error;

/// Errors surfaced by the interpreter.
#[derive(Debug, Error)]
pub enum InterpreterError {
    /// The statement text does not match any supported shape.
    #[error("{0}")]
    MalformedCommand(String),

    /// The storage engine rejected the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn malformed<T>(msg: impl Into<String>) -> Result<T, InterpreterError> {
    Err(InterpreterError::MalformedCommand(msg.into()))
}

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `CREATE TABLE name (col TYPE, ...)`
    CreateTable(TableDefinition),
    /// `INSERT INTO name VALUES (v, ...)`
    Insert {
        /// Target table.
        table: String,
        /// Raw literals, one per column.
        values: Vec<String>,
    },
    /// `SELECT * FROM name`
    Select {
        /// Source table.
        table: String,
    },
    /// `UPDATE name SET c = v WHERE c = v`
    Update {
        /// Target table.
        table: String,
        /// Assigned column.
        set_col: String,
        /// Assigned literal.
        set_val: String,
        /// Predicate column.
        where_col: String,
        /// Predicate literal.
        where_val: String,
    },
    /// `DELETE FROM name WHERE c = v`
    Delete {
        /// Target table.
        table: String,
        /// Predicate column.
        where_col: String,
        /// Predicate literal.
        where_val: String,
    },
    /// `SHOW TABLES`
    ShowTables,
    /// `DROP TABLE name`
    DropTable {
        /// Table to drop.
        table: String,
    },
}

/// Result of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A table was created.
    Created(String),
    /// One row was inserted.
    Inserted(Row),
    /// Rows read by a SELECT.
    Rows {
        /// Definition used to order and label columns.
        definition: TableDefinition,
        /// Rows in file order.
        rows: Vec<Row>,
        /// Records that could not be decoded.
        skipped: usize,
    },
    /// Rows changed by an UPDATE.
    Updated {
        /// Target table.
        table: String,
        /// Number of rows changed.
        count: usize,
    },
    /// Rows removed by a DELETE.
    Deleted {
        /// Target table.
        table: String,
        /// Number of rows removed.
        count: usize,
    },
    /// Table names.
    Tables(Vec<String>),
    /// A table was dropped.
    Dropped(String),
}

impl Statement {
    /// Parses one statement.
    pub fn parse(input: &str) -> Result<Self, InterpreterError> {
        let input = input.trim().trim_end_matches(';').trim();
        let (keyword, rest) = split_word(input);

        match keyword.to_ascii_uppercase().as_str() {
            "CREATE" => parse_create(rest),
            "INSERT" => parse_insert(rest),
            "SELECT" => parse_select(rest),
            "UPDATE" => parse_update(rest),
            "DELETE" => parse_delete(rest),
            "SHOW" => {
                if rest.eq_ignore_ascii_case("TABLES") {
                    Ok(Statement::ShowTables)
                } else {
                    malformed("Invalid SHOW syntax. Example: SHOW TABLES;")
                }
            }
            "DROP" => parse_drop(rest),
            "" => malformed("Empty statement."),
            _ => malformed(
                "Unknown command. Supported commands: CREATE TABLE, INSERT INTO, SELECT, \
                 SHOW TABLES, DROP TABLE, UPDATE, DELETE.",
            ),
        }
    }

    /// Executes the statement against `db`.
    pub fn execute(self, db: &Database) -> Result<Outcome, InterpreterError> {
        let outcome = match self {
            Statement::CreateTable(def) => {
                let name = def.name.clone();
                db.create_table(def)?;
                Outcome::Created(name)
            }
            Statement::Insert { table, values } => {
                let literals: Vec<&str> = values.iter().map(String::as_str).collect();
                Outcome::Inserted(db.insert(&table, &literals)?)
            }
            Statement::Select { table } => {
                let (definition, out) = db.select(&table)?;
                Outcome::Rows {
                    definition,
                    rows: out.rows,
                    skipped: out.skipped,
                }
            }
            Statement::Update {
                table,
                set_col,
                set_val,
                where_col,
                where_val,
            } => {
                let count = db.update(&table, &where_col, &where_val, &set_col, &set_val)?;
                Outcome::Updated { table, count }
            }
            Statement::Delete {
                table,
                where_col,
                where_val,
            } => {
                let count = db.delete(&table, &where_col, &where_val)?;
                Outcome::Deleted { table, count }
            }
            Statement::ShowTables => Outcome::Tables(db.catalog().list_tables()),
            Statement::DropTable { table } => {
                db.drop_table(&table)?;
                Outcome::Dropped(table)
            }
        };
        Ok(outcome)
    }
}

// =============================================================================
// Statement shapes
// =============================================================================

fn parse_create(rest: &str) -> Result<Statement, InterpreterError> {
    const USAGE: &str = "Invalid CREATE TABLE syntax. Example: CREATE TABLE users (id INT, name TEXT);";

    let (kw, rest) = split_word(rest);
    if !kw.eq_ignore_ascii_case("TABLE") {
        return malformed(USAGE);
    }

    let (Some(open), Some(close)) = (rest.find('('), rest.rfind(')')) else {
        return malformed(USAGE);
    };
    if close < open {
        return malformed(USAGE);
    }

    let name = rest[..open].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return malformed(USAGE);
    }

    let mut columns = Vec::new();
    for column_def in rest[open + 1..close].split(',') {
        let parts: Vec<&str> = column_def.split_whitespace().collect();
        let [col_name, type_name] = parts.as_slice() else {
            return malformed(format!(
                "Invalid column definition: '{}'. Expected format 'name TYPE'.",
                column_def.trim()
            ));
        };
        let data_type: DataType = type_name
            .parse()
            .map_err(InterpreterError::MalformedCommand)?;
        columns.push(Column::new(*col_name, data_type));
    }

    Ok(Statement::CreateTable(TableDefinition::new(name, columns)))
}

fn parse_insert(rest: &str) -> Result<Statement, InterpreterError> {
    const USAGE: &str = "Invalid INSERT INTO syntax. Example: INSERT INTO users VALUES (1, 'Alice');";

    let (kw, rest) = split_word(rest);
    if !kw.eq_ignore_ascii_case("INTO") {
        return malformed(USAGE);
    }

    let Some(values_at) = find_keyword(rest, "VALUES") else {
        return malformed("Invalid INSERT INTO syntax. VALUES clause not found.");
    };
    let table = rest[..values_at].trim();
    if table.is_empty() {
        return malformed(USAGE);
    }

    let values = rest[values_at + "VALUES".len()..].trim();
    let inner = values
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .map(str::trim);
    let Some(inner) = inner else {
        return malformed("Invalid INSERT INTO syntax. VALUES clause is malformed.");
    };

    Ok(Statement::Insert {
        table: table.to_string(),
        values: split_outside_quotes(inner, ',')
            .into_iter()
            .map(|v| v.trim().to_string())
            .collect(),
    })
}

fn parse_select(rest: &str) -> Result<Statement, InterpreterError> {
    const USAGE: &str = "Invalid SELECT syntax. Example: SELECT * FROM users;";

    let words: Vec<&str> = rest.split_whitespace().collect();
    match words.as_slice() {
        ["*", from, table] if from.eq_ignore_ascii_case("FROM") => Ok(Statement::Select {
            table: table.to_string(),
        }),
        _ => malformed(USAGE),
    }
}

fn parse_update(rest: &str) -> Result<Statement, InterpreterError> {
    const USAGE: &str = "Invalid UPDATE syntax. Example: UPDATE users SET name = 'Bob' WHERE id = 1;";

    let (Some(set_at), Some(where_at)) = (find_keyword(rest, "SET"), find_keyword(rest, "WHERE"))
    else {
        return malformed(USAGE);
    };
    if where_at < set_at {
        return malformed(USAGE);
    }

    let table = rest[..set_at].trim();
    if table.is_empty() {
        return malformed(USAGE);
    }

    let (set_col, set_val) = parse_assignment(&rest[set_at + "SET".len()..where_at])
        .ok_or_else(|| InterpreterError::MalformedCommand("Invalid SET clause in UPDATE.".into()))?;
    let (where_col, where_val) = parse_assignment(&rest[where_at + "WHERE".len()..]).ok_or_else(|| {
        InterpreterError::MalformedCommand(
            "Invalid WHERE clause in UPDATE. Only simple equality is supported.".into(),
        )
    })?;

    Ok(Statement::Update {
        table: table.to_string(),
        set_col,
        set_val,
        where_col,
        where_val,
    })
}

fn parse_delete(rest: &str) -> Result<Statement, InterpreterError> {
    const USAGE: &str = "Invalid DELETE syntax. Example: DELETE FROM users WHERE id = 1;";

    let (kw, rest) = split_word(rest);
    if !kw.eq_ignore_ascii_case("FROM") {
        return malformed(USAGE);
    }
    let Some(where_at) = find_keyword(rest, "WHERE") else {
        return malformed(USAGE);
    };

    let table = rest[..where_at].trim();
    if table.is_empty() {
        return malformed(USAGE);
    }

    let (where_col, where_val) = parse_assignment(&rest[where_at + "WHERE".len()..]).ok_or_else(|| {
        InterpreterError::MalformedCommand(
            "Invalid WHERE clause in DELETE. Only simple equality is supported.".into(),
        )
    })?;

    Ok(Statement::Delete {
        table: table.to_string(),
        where_col,
        where_val,
    })
}

fn parse_drop(rest: &str) -> Result<Statement, InterpreterError> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    match words.as_slice() {
        [kw, table] if kw.eq_ignore_ascii_case("TABLE") => Ok(Statement::DropTable {
            table: table.to_string(),
        }),
        _ => malformed("Invalid DROP TABLE syntax. Example: DROP TABLE users;"),
    }
}

// =============================================================================
// Lexical helpers
// =============================================================================

/// Splits off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Parses `column = literal`.
fn parse_assignment(s: &str) -> Option<(String, String)> {
    let (col, val) = s.split_once('=')?;
    let (col, val) = (col.trim(), val.trim());
    if col.is_empty() || val.is_empty() {
        return None;
    }
    Some((col.to_string(), val.to_string()))
}

/// Finds a whitespace-delimited, case-insensitive keyword outside single quotes.
///
/// Returns the byte offset of the keyword.
fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let kw = keyword.as_bytes();
    let mut in_quote = false;

    for i in 0..bytes.len() {
        if bytes[i] == b'\'' {
            in_quote = !in_quote;
            continue;
        }
        if in_quote || i + kw.len() > bytes.len() {
            continue;
        }

        let before_ok = i == 0 || bytes[i - 1].is_ascii_whitespace();
        let after_ok = i + kw.len() == bytes.len() || bytes[i + kw.len()].is_ascii_whitespace();
        if before_ok && after_ok && bytes[i..i + kw.len()].eq_ignore_ascii_case(kw) {
            return Some(i);
        }
    }
    None
}

/// Splits on `sep`, ignoring separators inside single quotes.
fn split_outside_quotes(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quote = false;

    for (i, c) in s.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        } else if c == sep && !in_quote {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatdb_common::DatabaseConfig;
    use flatdb_storage::Value;
    use tempfile::TempDir;

    fn run(db: &Database, sql: &str) -> Result<Outcome, InterpreterError> {
        Statement::parse(sql)?.execute(db)
    }

    #[test]
    fn test_parse_create() {
        let stmt = Statement::parse("create table users (id INT, name text);").unwrap();
        assert_eq!(
            stmt,
            Statement::CreateTable(TableDefinition::new(
                "users",
                vec![
                    Column::new("id", DataType::Integer),
                    Column::new("name", DataType::Text),
                ],
            ))
        );

        assert!(Statement::parse("CREATE TABLE users id INT").is_err());
        assert!(Statement::parse("CREATE TABLE users (id)").is_err());
        assert!(Statement::parse("CREATE TABLE users (id BLOB)").is_err());
    }

    #[test]
    fn test_parse_insert_keeps_commas_inside_quotes() {
        let stmt = Statement::parse("INSERT INTO notes VALUES (1, 'a, b', true);").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                table: "notes".to_string(),
                values: vec!["1".to_string(), "'a, b'".to_string(), "true".to_string()],
            }
        );
        assert!(Statement::parse("INSERT INTO notes (1)").is_err());
        assert!(Statement::parse("INSERT notes VALUES (1)").is_err());
    }

    #[test]
    fn test_parse_update_and_delete() {
        let stmt = Statement::parse("update users set name = 'Where Now' where id = 1").unwrap();
        assert_eq!(
            stmt,
            Statement::Update {
                table: "users".to_string(),
                set_col: "name".to_string(),
                set_val: "'Where Now'".to_string(),
                where_col: "id".to_string(),
                where_val: "1".to_string(),
            }
        );

        let stmt = Statement::parse("DELETE FROM users WHERE id = 2;").unwrap();
        assert_eq!(
            stmt,
            Statement::Delete {
                table: "users".to_string(),
                where_col: "id".to_string(),
                where_val: "2".to_string(),
            }
        );

        assert!(Statement::parse("UPDATE users SET name = 'x'").is_err());
        assert!(Statement::parse("DELETE FROM users WHERE id > 2").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Statement::parse("show tables;").unwrap(), Statement::ShowTables);
        assert_eq!(
            Statement::parse("DROP TABLE users").unwrap(),
            Statement::DropTable {
                table: "users".to_string()
            }
        );
        assert_eq!(
            Statement::parse("SELECT * FROM users").unwrap(),
            Statement::Select {
                table: "users".to_string()
            }
        );
        assert!(matches!(
            Statement::parse("EXPLAIN users"),
            Err(InterpreterError::MalformedCommand(_))
        ));
    }

    #[test]
    fn test_session() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap();

        assert_eq!(
            run(&db, "CREATE TABLE users (id INT, name TEXT);").unwrap(),
            Outcome::Created("users".to_string())
        );
        run(&db, "INSERT INTO users VALUES (1, 'Alice');").unwrap();
        run(&db, "INSERT INTO users VALUES (2, 'Bob');").unwrap();

        assert_eq!(
            run(&db, "UPDATE users SET name = 'Carol' WHERE id = 1;").unwrap(),
            Outcome::Updated {
                table: "users".to_string(),
                count: 1
            }
        );
        assert_eq!(
            run(&db, "DELETE FROM users WHERE id = 2;").unwrap(),
            Outcome::Deleted {
                table: "users".to_string(),
                count: 1
            }
        );

        match run(&db, "SELECT * FROM users;").unwrap() {
            Outcome::Rows { rows, skipped, .. } => {
                assert_eq!(skipped, 0);
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].get("name"), Some(&Value::text("Carol")));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(
            run(&db, "SHOW TABLES").unwrap(),
            Outcome::Tables(vec!["users".to_string()])
        );
        assert_eq!(
            run(&db, "DROP TABLE users").unwrap(),
            Outcome::Dropped("users".to_string())
        );
    }

    #[test]
    fn test_insert_is_lenient_but_predicates_are_strict() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap();
        run(&db, "CREATE TABLE t (n INT)").unwrap();

        match run(&db, "INSERT INTO t VALUES (oops)").unwrap() {
            Outcome::Inserted(row) => assert_eq!(row.get("n"), Some(&Value::text("oops"))),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let err = run(&db, "DELETE FROM t WHERE n = oops").unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::Storage(StorageError::TypeMismatch { .. })
        ));

        let err = run(&db, "INSERT INTO t VALUES (1, 2)").unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::Storage(StorageError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_find_keyword_skips_quoted_text() {
        assert_eq!(find_keyword("t SET a = 'x WHERE y' WHERE b = 1", "WHERE"), Some(22));
        assert_eq!(find_keyword("nowhere", "WHERE"), None);
    }
}
