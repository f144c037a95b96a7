//! Error types for dependency graph operations.
//!
//! Every public operation returns [`Result`]. Store-specific failures
//! (SQLite, I/O) are wrapped here so callers never see raw backend errors;
//! [`Error::kind`] collapses the variants into the five categories the task
//! layer maps onto its own responses.

use crate::domain::TaskId;
use std::io;
use thiserror::Error;

/// The error type for dependency graph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input or configuration.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced task does not exist.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The edge to remove is not present.
    #[error("Dependency not found: {task} -> {dependency}")]
    DependencyNotFound {
        /// The dependent task
        task: TaskId,
        /// The task it was supposed to depend on
        dependency: TaskId,
    },

    /// The edge is already present.
    #[error("Dependency already exists: {task} -> {dependency}")]
    DuplicateDependency {
        /// The dependent task
        task: TaskId,
        /// The task it already depends on
        dependency: TaskId,
    },

    /// Adding the edge would close a cycle.
    #[error("Circular dependency: {task} -> {dependency} would create cycle {}", format_path(.path))]
    CircularDependency {
        /// The dependent task
        task: TaskId,
        /// The proposed dependency
        dependency: TaskId,
        /// The cycle that would result, starting and ending at `task`
        path: Vec<TaskId>,
    },

    /// Generic storage failure (transaction, lock, backend capability).
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Cache backend failure.
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Coarse error categories exposed to the task layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before touching the store: bad ids, self-reference
    Validation,
    /// A task or edge does not exist
    NotFound,
    /// The edge already exists
    Duplicate,
    /// The edge would create a cycle
    Cycle,
    /// The store or cache failed; the operation was rolled back
    Storage,
}

impl Error {
    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::DependencyNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateDependency { .. } => ErrorKind::Duplicate,
            Self::CircularDependency { .. } => ErrorKind::Cycle,
            Self::Storage(_) | Self::Database(_) | Self::Io(_) | Self::Cache(_) => {
                ErrorKind::Storage
            }
        }
    }
}

fn format_path(path: &[TaskId]) -> String {
    path.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A specialized Result type for dependency graph operations.
pub type Result<T> = std::result::Result<T, Error>;
