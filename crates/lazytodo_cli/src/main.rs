//! Command-line front end for the todo core.
//!
//! # Responsibility
//! - Drive `TodoManager` operations against a local SQLite file.
//! - Report rejected input and persistence failures through the exit code.

use anyhow::Context;
use clap::{Parser, Subcommand};
use lazytodo_core::{
    core_version, default_log_level, init_logging, ManagerError, Outcome, SqliteTodoStore,
    StoreConfig, Todo, TodoId, TodoManager,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "lazytodo", version, about = "Local todo list")]
struct Cli {
    /// SQLite database file holding the todo list.
    #[arg(long, default_value = "lazytodo.sqlite3")]
    db: PathBuf,

    /// Storage key of the list inside the database.
    #[arg(long, default_value = lazytodo_core::DEFAULT_STORAGE_KEY)]
    key: String,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print all todos in display order.
    List,
    /// Append a new todo.
    Add { title: Vec<String> },
    /// Flip completion of a todo.
    Toggle { id: TodoId },
    /// Replace the title of a todo.
    Edit { id: TodoId, title: Vec<String> },
    /// Delete one or more todos.
    Delete {
        #[arg(required = true)]
        ids: Vec<TodoId>,
    },
    /// Rearrange todos into the given id order.
    Reorder {
        #[arg(required = true)]
        ids: Vec<TodoId>,
    },
    /// Move the todo at one position to another (zero-based).
    Move { from: usize, to: usize },
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    if let Command::Version = cli.command {
        println!("lazytodo_core version={}", core_version());
        return Ok(());
    }

    let config = StoreConfig {
        key: cli.key,
        ..StoreConfig::default()
    };
    let store = SqliteTodoStore::open(&cli.db, config)
        .with_context(|| format!("failed to open `{}`", cli.db.display()))?;
    let mut manager = TodoManager::new(store);
    info!("event=cli_command module=cli status=start count={}", manager.len());

    let outcome = match cli.command {
        Command::List => {
            print_todos(manager.list());
            return Ok(());
        }
        Command::Add { title } => {
            let todo = manager.add(&title.join(" ")).map_err(report)?;
            print_todo(&todo);
            Outcome::Applied
        }
        Command::Toggle { id } => manager.toggle(id).map_err(report)?,
        Command::Edit { id, title } => manager.edit(id, &title.join(" ")).map_err(report)?,
        Command::Delete { ids } => {
            let result = match ids.as_slice() {
                [id] => manager.delete(*id),
                many => manager.delete_many(many),
            };
            result.map_err(report)?
        }
        Command::Reorder { ids } => manager.reorder(&ids).map_err(report)?,
        Command::Move { from, to } => manager.move_todo(from, to).map_err(report)?,
        Command::Version => Outcome::Unchanged,
    };

    if outcome == Outcome::Unchanged {
        println!("nothing changed");
    }
    print_todos(manager.list());
    Ok(())
}

fn report(err: ManagerError) -> anyhow::Error {
    match err {
        ManagerError::Persistence(_) => {
            anyhow::Error::new(err).context("change applied but may not survive a restart")
        }
        other => anyhow::Error::new(other).context("request rejected"),
    }
}

fn print_todos(todos: &[Todo]) {
    if todos.is_empty() {
        println!("(no todos)");
    }
    for todo in todos {
        print_todo(todo);
    }
}

fn print_todo(todo: &Todo) {
    let mark = if todo.completed { 'x' } else { ' ' };
    println!("{} [{mark}] {}", todo.id, todo.title);
}
