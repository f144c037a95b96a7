//! Cycle prevention for edge insertion.

use super::traversal::TraversalEngine;
use crate::domain::TaskId;
use crate::error::{Error, Result};
use crate::storage::EdgeReader;

/// Rejects edges that would close a cycle.
///
/// Adding `task -> dependency` is safe iff the two differ and `dependency`
/// does not already (transitively) depend on `task`. Run the check on the
/// same transaction that performs the insert.
#[derive(Debug, Clone)]
pub struct CycleGuard {
    engine: TraversalEngine,
}

impl CycleGuard {
    /// Create a guard that answers reachability through `engine`.
    pub fn new(engine: TraversalEngine) -> Self {
        Self { engine }
    }

    /// Whether adding `task -> dependency` would create a cycle.
    pub async fn would_create_cycle(
        &self,
        reader: &dyn EdgeReader,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<bool> {
        if task == dependency {
            return Ok(true);
        }
        self.engine.reachable(reader, dependency, task).await
    }

    /// Fail with [`Error::CircularDependency`] if the edge would close a
    /// cycle. The reported path starts and ends at `task`.
    pub async fn check(
        &self,
        reader: &dyn EdgeReader,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<()> {
        if task == dependency {
            return Err(Error::Validation(format!(
                "task {task} cannot depend on itself"
            )));
        }

        match self.engine.path(reader, dependency, task).await? {
            None => Ok(()),
            Some(back) => {
                let mut path = Vec::with_capacity(back.len() + 1);
                path.push(task.clone());
                path.extend(back);
                tracing::debug!(
                    task = %task,
                    dependency = %dependency,
                    cycle_len = path.len() - 1,
                    "Rejected edge that would create a cycle"
                );
                Err(Error::CircularDependency {
                    task: task.clone(),
                    dependency: dependency.clone(),
                    path,
                })
            }
        }
    }
}
