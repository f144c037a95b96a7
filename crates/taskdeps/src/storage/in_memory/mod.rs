//! In-memory storage backend using HashMap and petgraph.
//!
//! This module provides a fast, **ephemeral** store where all data is held
//! in RAM and lost when the process exits. It is suitable for tests, embedded
//! use, and as the reference "no recursive query" backend.
//!
//! # Architecture
//!
//! - `HashMap<TaskId, TaskStatus>` for task lookups
//! - `petgraph::StableDiGraph` for edges (dependent -> dependency)
//! - `HashMap<TaskId, NodeIndex>` for mapping tasks to graph nodes
//!
//! # Thread Safety
//!
//! The state is wrapped in `Arc<Mutex<GraphInner>>`. Reads take the lock for
//! the duration of one call. A transaction takes an *owned* guard and keeps
//! it until commit or rollback, so writers are fully serialized.
//!
//! # Recursive Queries
//!
//! Not supported: [`EdgeReader::probe_recursive_query`] fails and the
//! capability probe selects iterative traversal.
//!
//! [`EdgeReader::probe_recursive_query`]: crate::storage::EdgeReader::probe_recursive_query

mod inner;
mod trait_impl;
mod transaction;

use crate::domain::{TaskId, TaskStatus};
use crate::error::Result;
use inner::GraphInner;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe in-memory graph store.
///
/// Cloning is cheap and yields a handle to the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    inner: Arc<Mutex<GraphInner>>,
}

impl InMemoryGraphStore {
    /// Create an empty store.
    ///
    /// # Example
    ///
    /// ```
    /// use taskdeps::domain::TaskStatus;
    /// use taskdeps::storage::InMemoryGraphStore;
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let store = InMemoryGraphStore::new();
    ///     store.add_task("design", TaskStatus::Pending).await.unwrap();
    /// }
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, or overwrite the status of an existing one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the id is blank.
    pub async fn add_task(&self, id: impl Into<TaskId>, status: TaskStatus) -> Result<()> {
        self.inner.lock().await.upsert_task(id.into(), status)
    }

    /// Change the status of an existing task.
    ///
    /// The caller is responsible for notifying the service afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        self.inner.lock().await.set_status(id, status)
    }

    /// Delete a task and cascade-delete every edge touching it.
    ///
    /// Returns the number of edges removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn remove_task(&self, id: &TaskId) -> Result<usize> {
        self.inner.lock().await.remove_task(id)
    }

    /// All stored edges as sorted `(task, dependency)` pairs.
    pub async fn edges(&self) -> Vec<(TaskId, TaskId)> {
        self.inner.lock().await.edges()
    }

    /// Number of stored edges.
    pub async fn edge_count(&self) -> usize {
        self.inner.lock().await.edges().len()
    }
}
