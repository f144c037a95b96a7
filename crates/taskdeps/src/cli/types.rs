//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::TaskStatus;
use crate::engine::StrategyPreference;

/// Task status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatusArg {
    /// Not started yet
    #[default]
    Pending,
    /// Currently being worked on
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Done
    Completed,
    /// Abandoned
    #[value(alias = "archived")]
    Cancelled,
}

impl std::fmt::Display for TaskStatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", TaskStatus::from(*self))
    }
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::Pending => TaskStatus::Pending,
            TaskStatusArg::InProgress => TaskStatus::InProgress,
            TaskStatusArg::Completed => TaskStatus::Completed,
            TaskStatusArg::Cancelled => TaskStatus::Cancelled,
        }
    }
}

/// Traversal strategy for the `init` command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyArg {
    /// Probe the database and use recursive queries when available
    #[default]
    Auto,
    /// Always use recursive queries (falls back if the probe fails)
    Recursive,
    /// Always expand the graph level by level
    Iterative,
}

impl From<StrategyArg> for StrategyPreference {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => StrategyPreference::Auto,
            StrategyArg::Recursive => StrategyPreference::Recursive,
            StrategyArg::Iterative => StrategyPreference::Iterative,
        }
    }
}
