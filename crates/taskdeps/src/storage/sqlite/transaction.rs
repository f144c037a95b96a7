//! Write transactions for the SQLite store.

use super::queries;
use crate::domain::{DependencyEdge, Direction, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::storage::{EdgeReader, GraphTransaction, TraversalRow};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Exclusive write transaction.
///
/// Holds the store's connection lock for its whole lifetime and runs inside
/// `BEGIN IMMEDIATE`, so SQLite's reserved lock also keeps other processes
/// from writing between the cycle check and the insert.
///
/// The owned guard sits behind a `std::sync::Mutex` because `Connection` is
/// not `Sync`; the inner lock is only ever held inside synchronous helpers.
pub(crate) struct SqliteTransaction {
    conn: Mutex<OwnedMutexGuard<Connection>>,
    finished: bool,
}

impl SqliteTransaction {
    pub(super) fn begin(guard: OwnedMutexGuard<Connection>) -> Result<Self> {
        guard.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn: Mutex::new(guard),
            finished: false,
        })
    }

    fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let guard = self
            .conn
            .lock()
            .map_err(|e| Error::Storage(format!("transaction mutex poisoned: {e}")))?;
        f(&**guard)
    }

    fn finish(&mut self, statement: &str) -> Result<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(statement)?))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let conn = match self.conn.get_mut() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::debug!("SQLite transaction dropped without commit, rolling back");
        if let Err(e) = conn.execute_batch("ROLLBACK") {
            tracing::error!(error = %e, "Failed to roll back SQLite transaction");
        }
    }
}

#[async_trait]
impl EdgeReader for SqliteTransaction {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        self.with_conn(|conn| queries::task_exists(conn, id))
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        self.with_conn(|conn| queries::task_status(conn, id))
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        self.with_conn(|conn| queries::has_edge(conn, task, dependency))
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        self.with_conn(|conn| queries::edges_from(conn, task))
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        self.with_conn(|conn| queries::edges_to(conn, dependency))
    }

    async fn probe_recursive_query(&self) -> Result<()> {
        self.with_conn(queries::probe_recursive_query)
    }

    async fn traverse_recursive(
        &self,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TraversalRow>> {
        self.with_conn(|conn| queries::traverse(conn, root, direction))
    }
}

#[async_trait]
impl GraphTransaction for SqliteTransaction {
    async fn insert_edge(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<DependencyEdge> {
        self.with_conn(|conn| queries::insert_edge(conn, task, dependency, Utc::now()))
    }

    async fn delete_edge(&mut self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        self.with_conn(|conn| queries::delete_edge(conn, task, dependency))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tx = self;
        tx.finish("COMMIT")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut tx = self;
        tx.finish("ROLLBACK")
    }
}
