//! Backslash meta-commands for the REPL.
//!
//! Provides `\q`, `\?`, `\dt`, `\d <table>` and `\timing`.

use flatdb_storage::{Database, StorageResult};

use crate::formatter;
use crate::interpreter::Outcome;

/// Result of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the REPL.
    Exit,
    /// Output a message.
    Output(String),
    /// Toggle timing mode.
    ToggleTiming,
}

/// A parsed command.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Quit the REPL.
    Quit,
    /// Show help.
    Help,
    /// Describe a table.
    Describe(Option<String>),
    /// List tables.
    ListTables,
    /// Toggle timing.
    Timing,
    /// Unknown command.
    Unknown(String),
}

impl Command {
    /// Parses a command string.
    pub fn parse(input: &str) -> Self {
        let input = input.trim().trim_end_matches(';');
        let cmd = input.strip_prefix('\\').unwrap_or(input);

        let (name, args) = match cmd.split_once(char::is_whitespace) {
            Some((name, args)) => (name, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (cmd, None),
        };

        match name.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Command::Quit,
            "?" | "h" | "help" => Command::Help,
            "d" => Command::Describe(args.map(str::to_string)),
            "dt" | "tables" => Command::ListTables,
            "timing" | "t" => Command::Timing,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Executes the command.
    pub fn execute(&self, db: &Database) -> StorageResult<CommandResult> {
        let result = match self {
            Command::Quit => CommandResult::Exit,
            Command::Help => CommandResult::Output(help_text().to_string()),
            Command::Describe(Some(name)) => {
                let def = db.definition(name)?;
                CommandResult::Output(formatter::format_definition(&def))
            }
            Command::Describe(None) | Command::ListTables => CommandResult::Output(
                formatter::format_outcome(&Outcome::Tables(db.catalog().list_tables())),
            ),
            Command::Timing => CommandResult::ToggleTiming,
            Command::Unknown(cmd) => CommandResult::Output(format!(
                "Unknown command '\\{}'. Type \\? for help.",
                cmd
            )),
        };
        Ok(result)
    }
}

fn help_text() -> &'static str {
    r#"FlatDB Shell Commands
=====================

General:
  \q, \quit       Exit the shell
  \?, \help       Show this help

Schema:
  \d [NAME]       Describe a table
  \dt, \tables    List all tables

Display:
  \t, \timing     Toggle timing display

Statements:
  CREATE TABLE users (id INT, name TEXT);
  INSERT INTO users VALUES (1, 'Alice');
  SELECT * FROM users;
  UPDATE users SET name = 'Bob' WHERE id = 1;
  DELETE FROM users WHERE id = 1;
  SHOW TABLES;
  DROP TABLE users;
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatdb_common::DatabaseConfig;
    use flatdb_storage::{Column, DataType, StorageError, TableDefinition};
    use tempfile::TempDir;

    #[test]
    fn test_parse_quit() {
        assert_eq!(Command::parse("\\q"), Command::Quit);
        assert_eq!(Command::parse("\\quit"), Command::Quit);
        assert_eq!(Command::parse("\\exit"), Command::Quit);
    }

    #[test]
    fn test_parse_describe() {
        assert_eq!(
            Command::parse("\\d users"),
            Command::Describe(Some("users".to_string()))
        );
        assert_eq!(Command::parse("\\d"), Command::Describe(None));
        assert_eq!(Command::parse("\\timing"), Command::Timing);
        assert_eq!(Command::parse("\\xyz"), Command::Unknown("xyz".to_string()));
    }

    #[test]
    fn test_execute() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(DatabaseConfig::for_testing(tmp.path())).unwrap();
        db.create_table(TableDefinition::new(
            "users",
            vec![Column::new("id", DataType::Integer)],
        ))
        .unwrap();

        assert_eq!(Command::Quit.execute(&db).unwrap(), CommandResult::Exit);
        assert_eq!(Command::Timing.execute(&db).unwrap(), CommandResult::ToggleTiming);

        match Command::parse("\\d users").execute(&db).unwrap() {
            CommandResult::Output(out) => assert!(out.contains("INT")),
            other => panic!("unexpected result: {:?}", other),
        }
        match Command::ListTables.execute(&db).unwrap() {
            CommandResult::Output(out) => assert!(out.contains("users")),
            other => panic!("unexpected result: {:?}", other),
        }

        let err = Command::parse("\\d ghosts").execute(&db).unwrap_err();
        assert!(matches!(err, StorageError::UnknownTable(_)));
    }
}
