//! Completion gating.

use crate::domain::{TaskId, TaskStatus};
use crate::error::Result;
use crate::storage::EdgeReader;

/// Decides whether a task may be marked completed.
///
/// Only direct dependencies are checked. A dependency can only have reached
/// `Completed` once its own dependencies were, so one hop is enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionGate;

impl CompletionGate {
    /// `true` iff every direct dependency of `task` is completed.
    ///
    /// A task without dependencies may always complete. An edge pointing at
    /// a task the store no longer has counts as not completed.
    pub async fn is_completion_allowed(&self, reader: &dyn EdgeReader, task: &TaskId) -> Result<bool> {
        for dependency in reader.edges_from(task).await? {
            let status = reader.task_status(&dependency).await?;
            if status != Some(TaskStatus::Completed) {
                tracing::debug!(
                    task = %task,
                    blocked_by = %dependency,
                    "Completion blocked"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}
