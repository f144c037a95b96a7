//! Write transactions for the in-memory store.
//!
//! A transaction owns the store's mutex guard, so no other reader or writer
//! can observe intermediate state. Writes are applied immediately and
//! recorded in an undo journal; rollback (explicit or on drop) replays the
//! journal backwards.

use super::inner::GraphInner;
use crate::domain::TaskId;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

/// Inverse of one applied write.
#[derive(Debug)]
enum Undo {
    /// An edge was inserted; undo by removing it
    Inserted(TaskId, TaskId),
    /// An edge was deleted; undo by restoring it with its original timestamp
    Deleted(TaskId, TaskId, DateTime<Utc>),
}

/// Exclusive write transaction over [`GraphInner`].
pub(crate) struct InMemoryTransaction {
    pub(super) guard: OwnedMutexGuard<GraphInner>,
    journal: Vec<Undo>,
    finished: bool,
}

impl InMemoryTransaction {
    pub(super) fn new(guard: OwnedMutexGuard<GraphInner>) -> Self {
        Self {
            guard,
            journal: Vec::new(),
            finished: false,
        }
    }

    pub(super) fn record_insert(&mut self, task: TaskId, dependency: TaskId) {
        self.journal.push(Undo::Inserted(task, dependency));
    }

    pub(super) fn record_delete(
        &mut self,
        task: TaskId,
        dependency: TaskId,
        created_at: DateTime<Utc>,
    ) {
        self.journal.push(Undo::Deleted(task, dependency, created_at));
    }

    pub(super) fn finish_commit(&mut self) {
        self.journal.clear();
        self.finished = true;
    }

    pub(super) fn finish_rollback(&mut self) {
        while let Some(entry) = self.journal.pop() {
            match entry {
                Undo::Inserted(task, dependency) => {
                    self.guard.remove_edge(&task, &dependency);
                }
                Undo::Deleted(task, dependency, created_at) => {
                    // Restoring an edge this transaction removed cannot
                    // violate constraints: the lock was held throughout.
                    if let Err(e) = self.guard.add_edge(&task, &dependency, created_at) {
                        tracing::error!(
                            task = %task,
                            dependency = %dependency,
                            error = %e,
                            "Failed to restore edge during rollback"
                        );
                    }
                }
            }
        }
        self.finished = true;
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                pending_writes = self.journal.len(),
                "In-memory transaction dropped without commit, rolling back"
            );
            self.finish_rollback();
        }
    }
}
