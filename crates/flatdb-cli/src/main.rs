//! FlatDB command shell.
//!
//! # Usage
//!
//! ```bash
//! # Start interactive REPL
//! flatdb -d data/my_first_db
//!
//! # Execute a single statement
//! flatdb -c "SELECT * FROM users"
//!
//! # Execute statements from a file
//! flatdb -f setup.sql
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flatdb_storage::Database;

mod commands;
mod config;
mod formatter;
mod interpreter;
mod repl;

use config::CliConfig;
use repl::Repl;

/// FlatDB command shell
#[derive(Parser, Debug)]
#[command(
    name = "flatdb",
    version,
    about = "Command shell for FlatDB",
    long_about = "A command shell for FlatDB, a file-backed table store.\n\n\
                  Use this tool for interactive sessions or to run statements\n\
                  from the command line or a file."
)]
struct Args {
    /// Database directory
    #[arg(short = 'd', long, value_name = "DIR", env = "FLATDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Execute a single statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Execute statements from file and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Skip fsync after writes
    #[arg(long, env = "FLATDB_NO_SYNC")]
    no_sync: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress banner (for scripting)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE", env = "FLATDB_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let db = Database::open(config.database_config()).context("failed to open database")?;

    if let Some(command) = &args.command {
        info!("Executing command: {}", command);
        repl::execute_and_print(&db, command, config.timing)?;
        Ok(())
    } else if let Some(file) = &args.file {
        execute_file(&db, file, config.timing)
    } else {
        let mut repl = Repl::new(&config, db)?;
        if !args.quiet {
            repl.print_banner();
        }
        repl.run()
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "flatdb_cli=debug,flatdb_storage=debug"
    } else {
        "flatdb_cli=warn,flatdb_storage=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if args.no_sync {
        config.sync_writes = false;
    }

    Ok(config)
}

fn execute_file(db: &Database, path: &Path, timing: bool) -> Result<()> {
    info!("Executing file: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut failed = 0usize;
    for statement in split_statements(&content) {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Err(e) = repl::execute_and_print(db, trimmed, timing) {
            warn!("Statement failed: {}", trimmed);
            eprintln!("Error: {}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} statement(s) in {} failed", failed, path.display());
    }
    Ok(())
}

/// Splits script content into statements on `;`, skipping quoted text and
/// `--` / `/* */` comments. Comment text is dropped from the output.
fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut in_comment = false;
    let mut in_block_comment = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if in_comment {
            if c == '\n' {
                in_comment = false;
                current.push(c);
            }
            continue;
        }

        if in_string {
            current.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }

        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                in_block_comment = true;
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                in_comment = true;
            }
            '\'' => {
                in_string = true;
                current.push(c);
            }
            ';' => {
                if !current.trim().is_empty() {
                    statements.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}
