//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for taskdeps using
//! clap's derive API.
//!
//! # Commands
//!
//! - `init`: Initialize a new taskdeps project
//! - `task`: Register, update, delete and list tasks
//! - `dep`: Add, remove or check dependencies
//! - `dependents` / `dependencies`: Transitive queries
//! - `hierarchy`: Leveled view of everything a task depends on
//! - `can-complete`: Completion gate for one or more tasks
//! - `stats`: Edge statistics and the active traversal strategy
//! - `benchmark`: Time both traversal strategies on the same database
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--config`, `--db`: Override the discovered configuration and database
//!
//! # Example
//!
//! ```bash
//! taskdeps task add build
//! taskdeps task add deploy --title "Ship it"
//! taskdeps dep add deploy build
//! taskdeps can-complete deploy
//! taskdeps hierarchy deploy
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{
    BenchmarkArgs, CanCompleteArgs, DepAction, DepArgs, InitArgs, TaskAction, TaskArgs,
    TaskRefArgs,
};
pub use types::{StrategyArg, TaskStatusArg};
pub use validators::{validate_task_id, validate_title};

/// taskdeps - task dependency graph engine
///
/// Record "must complete before" relationships between tasks, reject
/// cycles, and answer transitive and completion queries.
#[derive(Parser, Debug)]
#[command(name = "taskdeps")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (default: .taskdeps/config.yaml in the project root)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database (default: taken from the configuration)
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new taskdeps project
    ///
    /// Creates the `.taskdeps/` directory with configuration and an empty
    /// database.
    Init(InitArgs),

    /// Manage tasks
    Task(TaskArgs),

    /// Manage dependencies between tasks
    Dep(DepArgs),

    /// List every task that transitively depends on a task
    Dependents(TaskRefArgs),

    /// List every task a task transitively depends on
    Dependencies(TaskRefArgs),

    /// Show everything a task depends on as a leveled tree
    Hierarchy(TaskRefArgs),

    /// Check whether tasks may be marked completed
    CanComplete(CanCompleteArgs),

    /// Show dependency statistics
    Stats,

    /// Benchmark both traversal strategies
    ///
    /// Runs the transitive queries for one task with a cold cache under each
    /// strategy and checks that they agree.
    Benchmark(BenchmarkArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    fn app_options(&self) -> crate::app::AppOptions {
        crate::app::AppOptions {
            config: self.config.clone(),
            database: self.db.clone(),
        }
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::domain::Direction;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("taskdeps dependency graph engine");
            println!("Use --help for more information");
            return Ok(());
        };

        if let Commands::Init(args) = command {
            return execute::execute_init(args).await;
        }

        let app = App::from_directory(&std::env::current_dir()?, &self.app_options()).await?;

        match command {
            Commands::Init(_) => Ok(()),
            Commands::Task(args) => execute::execute_task(&app, args, output_mode).await,
            Commands::Dep(args) => execute::execute_dep(&app, args, output_mode).await,
            Commands::Dependents(args) => {
                execute::execute_related(&app, args, Direction::Dependents, output_mode).await
            }
            Commands::Dependencies(args) => {
                execute::execute_related(&app, args, Direction::Dependencies, output_mode).await
            }
            Commands::Hierarchy(args) => execute::execute_hierarchy(&app, args, output_mode).await,
            Commands::CanComplete(args) => {
                execute::execute_can_complete(&app, args, output_mode).await
            }
            Commands::Stats => execute::execute_stats(&app, output_mode).await,
            Commands::Benchmark(args) => execute::execute_benchmark(&app, args, output_mode).await,
        }
    }
}
