//! Interactive REPL for FlatDB.
//!
//! Provides a statement shell with command history, line editing and
//! keyword completion.

use std::time::Instant;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};
use tracing::{debug, error};

use flatdb_storage::Database;

use crate::commands::{Command, CommandResult};
use crate::config::CliConfig;
use crate::formatter;
use crate::interpreter::{InterpreterError, Statement};

/// The REPL prompt shown when waiting for input.
const PROMPT: &str = "flatdb> ";

/// Words offered by tab completion.
const KEYWORDS: &[&str] = &[
    "CREATE", "TABLE", "INSERT", "INTO", "VALUES", "SELECT", "FROM", "UPDATE", "SET", "WHERE",
    "DELETE", "SHOW", "TABLES", "DROP", "INT", "TEXT", "DECIMAL", "BOOL", "TRUE", "FALSE",
];

/// REPL helper for rustyline.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);

        let word = line[start..pos].to_uppercase();
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }

        let matches = KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&word))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

// Every line is a complete statement.
impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

/// Parses and runs one statement, printing its outcome.
pub fn execute_and_print(db: &Database, sql: &str, timing: bool) -> Result<(), InterpreterError> {
    let start = Instant::now();
    let outcome = Statement::parse(sql)?.execute(db)?;
    let elapsed = start.elapsed();

    println!("{}", formatter::format_outcome(&outcome));
    if timing {
        println!("Time: {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    }
    Ok(())
}

/// Interactive REPL for FlatDB.
pub struct Repl {
    /// The open database.
    db: Database,
    /// The rustyline editor.
    editor: Editor<ReplHelper, DefaultHistory>,
    /// History file path.
    history_file: Option<std::path::PathBuf>,
    /// Timing mode enabled.
    timing: bool,
}

impl Repl {
    /// Creates a new REPL instance.
    pub fn new(config: &CliConfig, db: Database) -> Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .max_history_size(config.history_size)?
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper));

        let history_file = config.history_path();
        if let Some(ref path) = history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    debug!("Failed to load history: {}", e);
                }
            }
        }

        Ok(Self {
            db,
            editor,
            history_file,
            timing: config.timing,
        })
    }

    /// Prints the welcome banner.
    pub fn print_banner(&self) {
        println!("FlatDB shell v{}", env!("CARGO_PKG_VERSION"));
        println!("Database: {}", self.db.config().data_dir.display());
        println!("Type \\? for help, \\q to quit.\n");
    }

    /// Runs the main REPL loop.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Err(e) = self.editor.add_history_entry(line) {
                        debug!("Failed to record history: {}", e);
                    }

                    if self.process_line(line) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("\\q");
                    break;
                }
                Err(e) => {
                    error!("Readline error: {}", e);
                    break;
                }
            }
        }

        self.save_history();
        println!("Goodbye!");
        Ok(())
    }

    /// Processes a single line of input. Returns true when the REPL should exit.
    fn process_line(&mut self, line: &str) -> bool {
        if line.starts_with('\\') {
            return self.process_command(line);
        }

        if let Err(e) = execute_and_print(&self.db, line, self.timing) {
            eprintln!("Error: {}", e);
        }
        false
    }

    /// Processes a backslash command.
    fn process_command(&mut self, line: &str) -> bool {
        match Command::parse(line).execute(&self.db) {
            Ok(CommandResult::Exit) => return true,
            Ok(CommandResult::Output(msg)) => println!("{}", msg),
            Ok(CommandResult::ToggleTiming) => {
                self.timing = !self.timing;
                if self.timing {
                    println!("Timing is on.");
                } else {
                    println!("Timing is off.");
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
        false
    }

    /// Saves command history.
    fn save_history(&mut self) {
        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    debug!("Failed to create history directory: {}", e);
                    return;
                }
            }
            if let Err(e) = self.editor.save_history(path) {
                debug!("Failed to save history: {}", e);
            }
        }
    }
}
