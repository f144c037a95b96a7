//! Domain types for the task dependency graph.
//!
//! Tasks themselves are owned by the surrounding task-management layer; this
//! crate only reads their identity and status. The types here describe the
//! edges between tasks and the results of traversing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new task ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of this task ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,

    /// Currently being worked on
    InProgress,

    /// Done; unblocks tasks that depend on it
    Completed,

    /// Abandoned or archived
    #[serde(alias = "archived")]
    Cancelled,
}

impl TaskStatus {
    /// The stored string form (`pending`, `in_progress`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" | "archived" => Ok(Self::Cancelled),
            other => Err(format!("invalid task status: '{other}'")),
        }
    }
}

/// A task row as the SQLite store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Optional human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Current status
    pub status: TaskStatus,
}

/// A "must-complete-before" edge.
///
/// `task_id` cannot be marked completed until `dependency_task_id` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The task that has the dependency
    pub task_id: TaskId,

    /// The task that must complete first
    pub dependency_task_id: TaskId,

    /// When the edge was recorded
    pub created_at: DateTime<Utc>,
}

/// Which way to walk the dependency graph.
///
/// Edges point from dependent to dependency (`task -> dependency`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow edges backwards: tasks that depend on the root.
    Dependents,

    /// Follow edges forwards: tasks the root depends on.
    Dependencies,
}

/// One entry of a breadth-first traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// The task reached
    pub id: TaskId,

    /// Distance in edges from the root (root is 0)
    pub level: usize,

    /// Task ids from the root to this node, inclusive
    pub path: Vec<TaskId>,
}

/// Aggregate figures about the stored edge set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyStats {
    /// Number of distinct tasks that have at least one dependency
    pub tasks_with_dependencies: usize,

    /// Total number of stored edges
    pub total_dependencies: usize,

    /// Mean number of dependencies among tasks that have any (two decimals)
    pub avg_dependencies_per_task: f64,

    /// Largest number of dependencies on a single task
    pub max_dependencies_per_task: usize,

    /// Pairs of edges `(a, b)` and `(b, a)`; always zero for a healthy store
    pub potential_circular_dependencies: usize,
}
