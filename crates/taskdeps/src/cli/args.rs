//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::{Parser, Subcommand};

use super::types::{StrategyArg, TaskStatusArg};
use super::validators::{validate_task_id, validate_title};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone, Default)]
pub struct InitArgs {
    /// Traversal strategy to record in the configuration
    #[arg(short, long, value_enum, default_value = "auto")]
    pub strategy: StrategyArg,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `task` command
#[derive(Parser, Debug, Clone)]
pub struct TaskArgs {
    /// Task subcommand
    #[command(subcommand)]
    pub action: TaskAction,
}

/// Task registry actions
#[derive(Subcommand, Debug, Clone)]
pub enum TaskAction {
    /// Register a task, or update an existing one
    Add {
        /// Task ID
        #[arg(value_parser = validate_task_id)]
        task_id: String,

        /// Human-readable title
        #[arg(long, value_parser = validate_title)]
        title: Option<String>,

        /// Initial status
        #[arg(short, long, value_enum, default_value = "pending")]
        status: TaskStatusArg,
    },

    /// Change the status of a task
    ///
    /// Marking a task completed is refused while any direct dependency is
    /// not completed, unless `--force` is given.
    Status {
        /// Task ID
        #[arg(value_parser = validate_task_id)]
        task_id: String,

        /// New status
        #[arg(value_enum)]
        status: TaskStatusArg,

        /// Skip the completion gate
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a task and every edge touching it
    Delete {
        /// Task ID
        #[arg(value_parser = validate_task_id)]
        task_id: String,
    },

    /// List all tasks
    List,
}

/// Arguments for the `dep` command
#[derive(Parser, Debug, Clone)]
pub struct DepArgs {
    /// Dependency subcommand
    #[command(subcommand)]
    pub action: DepAction,
}

/// Dependency management actions
#[derive(Subcommand, Debug, Clone)]
pub enum DepAction {
    /// Add a dependency
    Add {
        /// Task that depends on another
        #[arg(value_parser = validate_task_id)]
        task: String,

        /// Task that must complete first
        #[arg(value_parser = validate_task_id)]
        dependency: String,
    },

    /// Remove a dependency
    Remove {
        /// Task that depends on another
        #[arg(value_parser = validate_task_id)]
        task: String,

        /// Task being depended on
        #[arg(value_parser = validate_task_id)]
        dependency: String,
    },

    /// Check whether adding a dependency would create a cycle
    Check {
        /// Task that would depend on another
        #[arg(value_parser = validate_task_id)]
        task: String,

        /// Proposed dependency
        #[arg(value_parser = validate_task_id)]
        dependency: String,
    },
}

/// Arguments for commands that take a single task
#[derive(Parser, Debug, Clone)]
pub struct TaskRefArgs {
    /// Task ID
    #[arg(value_parser = validate_task_id)]
    pub task_id: String,
}

/// Arguments for the `can-complete` command
#[derive(Parser, Debug, Clone)]
pub struct CanCompleteArgs {
    /// Task IDs to check
    #[arg(required = true, num_args = 1.., value_parser = validate_task_id)]
    pub task_ids: Vec<String>,
}

/// Arguments for the `benchmark` command
#[derive(Parser, Debug, Clone)]
pub struct BenchmarkArgs {
    /// Task to root the transitive queries at
    #[arg(value_parser = validate_task_id)]
    pub task_id: String,

    /// Cold-cache runs per strategy
    #[arg(short = 'n', long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=10_000))]
    pub iterations: u32,
}
