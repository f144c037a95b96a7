//! Storage abstraction for the dependency graph.
//!
//! This module provides the traits the engine consumes and two backends:
//!
//! - **In-memory**: `StableDiGraph`-backed store; does not support recursive
//!   queries, so the engine falls back to iterative traversal
//! - **SQLite**: relational store with schema-level constraints and native
//!   `WITH RECURSIVE` traversal
//!
//! # Architecture
//!
//! Read operations live on [`EdgeReader`], which both the store and an open
//! transaction implement. Cycle checks therefore read through the very
//! transaction that will perform the insert. The traits are object-safe and
//! used via `Arc<dyn GraphStore>` / `Box<dyn GraphTransaction>`.
//!
//! # Edge Direction Convention
//!
//! An edge `(task, dependency)` points from the dependent to the dependency:
//! `edges_from(task)` lists what `task` waits on, `edges_to(dep)` lists the
//! tasks waiting on `dep`.
//!
//! # Write Serialization
//!
//! A [`GraphTransaction`] is an exclusive writer for its whole lifetime.
//! Two transactions can never interleave their reachability check and their
//! insert, which is what keeps concurrent opposite-direction inserts from
//! both committing.

use crate::domain::{DependencyEdge, DependencyStats, Direction, TaskId, TaskStatus};
use crate::error::{Error, Result};
use async_trait::async_trait;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryGraphStore;
pub use sqlite::SqliteGraphStore;

/// One raw row of a store-side recursive traversal.
///
/// A node may appear several times: once per distinct `(depth, parent)`
/// combination the query reached it by. The engine reduces these rows to
/// shortest depth and a canonical parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalRow {
    /// The task reached
    pub id: TaskId,
    /// Number of edges walked to reach it
    pub depth: usize,
    /// The task it was reached from (`None` for the root)
    pub parent: Option<TaskId>,
}

/// Read access to tasks and edges.
///
/// Implemented by stores (autocommit reads) and by open transactions
/// (reads that observe the transaction's own writes).
#[async_trait]
pub trait EdgeReader: Send + Sync {
    /// Whether a task with this id exists.
    async fn task_exists(&self, id: &TaskId) -> Result<bool>;

    /// Current status of a task, or `None` if it does not exist.
    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>>;

    /// Whether the edge `task -> dependency` is present.
    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool>;

    /// Direct dependencies of `task`, sorted by id.
    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>>;

    /// Direct dependents of `dependency`, sorted by id.
    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>>;

    /// Run a minimal self-contained recursive query.
    ///
    /// Stores without native recursive traversal keep the default, which
    /// always fails.
    async fn probe_recursive_query(&self) -> Result<()> {
        Err(Error::Storage(
            "recursive queries are not supported by this store".to_string(),
        ))
    }

    /// Walk the graph from `root` in a single store-side query.
    ///
    /// Returns every `(node, depth, parent)` combination reachable from the
    /// root, including the root itself at depth 0.
    async fn traverse_recursive(
        &self,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TraversalRow>> {
        let _ = (root, direction);
        Err(Error::Storage(
            "recursive queries are not supported by this store".to_string(),
        ))
    }
}

/// An open, exclusive write transaction.
///
/// Dropping a transaction without calling [`commit`](Self::commit) rolls it
/// back.
#[async_trait]
pub trait GraphTransaction: EdgeReader {
    /// Insert the edge `task -> dependency`.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateDependency` if the pair is already stored
    /// - `Error::Validation` if `task == dependency`
    /// - `Error::TaskNotFound` if either endpoint is missing
    async fn insert_edge(&mut self, task: &TaskId, dependency: &TaskId)
        -> Result<DependencyEdge>;

    /// Delete the edge `task -> dependency`. Returns `false` if it was absent.
    async fn delete_edge(&mut self, task: &TaskId, dependency: &TaskId) -> Result<bool>;

    /// Make all writes durable and release the write lock.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all writes and release the write lock.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// A transactional edge store.
#[async_trait]
pub trait GraphStore: EdgeReader {
    /// Open an exclusive write transaction.
    ///
    /// Waits until any other open transaction on this store has finished.
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>>;

    /// Aggregate statistics about the stored edges.
    async fn stats(&self) -> Result<DependencyStats>;
}

/// Build [`DependencyStats`] from per-task dependency counts.
pub(crate) fn summarize_counts(counts: &[usize], two_node_cycles: usize) -> DependencyStats {
    let total: usize = counts.iter().sum();
    let tasks = counts.len();
    #[allow(clippy::cast_precision_loss)]
    let avg = if tasks == 0 {
        0.0
    } else {
        ((total as f64 / tasks as f64) * 100.0).round() / 100.0
    };

    DependencyStats {
        tasks_with_dependencies: tasks,
        total_dependencies: total,
        avg_dependencies_per_task: avg,
        max_dependencies_per_task: counts.iter().copied().max().unwrap_or(0),
        potential_circular_dependencies: two_node_cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_counts_empty() {
        let stats = summarize_counts(&[], 0);
        assert_eq!(stats, DependencyStats::default());
    }

    #[test]
    fn test_summarize_counts_rounds_average() {
        let stats = summarize_counts(&[1, 1, 2], 0);
        assert_eq!(stats.tasks_with_dependencies, 3);
        assert_eq!(stats.total_dependencies, 4);
        assert!((stats.avg_dependencies_per_task - 1.33).abs() < f64::EPSILON);
        assert_eq!(stats.max_dependencies_per_task, 2);
    }

    #[tokio::test]
    async fn test_default_recursive_methods_fail() {
        let store = InMemoryGraphStore::new();
        assert!(store.probe_recursive_query().await.is_err());
        assert!(store
            .traverse_recursive(&TaskId::new("a"), Direction::Dependents)
            .await
            .is_err());
    }
}
