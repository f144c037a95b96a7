//! SQLite storage backend.
//!
//! `SQLite` is the durable store behind the CLI. The schema enforces the edge
//! invariants (uniqueness, no self edge, cascade on task delete) at the
//! table level, and the store supports native `WITH RECURSIVE` traversal, so
//! the capability probe selects the recursive-query strategy for it.
//!
//! ## Module Structure
//!
//! - `schema` - Database schema (DDL)
//! - `queries` - Synchronous query helpers
//! - `transaction` - `BEGIN IMMEDIATE` write transactions

mod queries;
mod schema;
mod transaction;

use crate::domain::{DependencyEdge, DependencyStats, Direction, Task, TaskId, TaskStatus};
use crate::error::Result;
use crate::storage::{EdgeReader, GraphStore, GraphTransaction, TraversalRow};
use async_trait::async_trait;
use rusqlite::Connection;
use schema::SCHEMA;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use transaction::SqliteTransaction;

/// How long a write waits for another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed graph store.
///
/// The connection sits behind an async mutex: plain reads hold it for one
/// query, a transaction holds it until commit or rollback.
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGraphStore {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "Opened SQLite database");
        Self::configure(conn)
    }

    /// Open a private in-memory database with the full schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register a task, or update the status (and title, if given) of an
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the id is blank.
    pub async fn upsert_task(
        &self,
        id: &TaskId,
        title: Option<&str>,
        status: TaskStatus,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::upsert_task(&conn, id, title, status)
    }

    /// Change the status of an existing task.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::set_status(&conn, id, status)
    }

    /// Delete a task; its edges are removed by the `ON DELETE CASCADE`
    /// foreign keys. Returns the number of edges removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn delete_task(&self, id: &TaskId) -> Result<usize> {
        let conn = self.conn.lock().await;
        queries::delete_task(&conn, id)
    }

    /// Look up a single task.
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let conn = self.conn.lock().await;
        queries::get_task(&conn, id)
    }

    /// All tasks, ordered by id.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.conn.lock().await;
        queries::list_tasks(&conn)
    }

    /// All edges, ordered by `(task, dependency)`.
    pub async fn edges(&self) -> Result<Vec<DependencyEdge>> {
        let conn = self.conn.lock().await;
        queries::edges(&conn)
    }

    /// Number of stored edges.
    pub async fn edge_count(&self) -> Result<usize> {
        Ok(self.stats().await?.total_dependencies)
    }
}

#[async_trait]
impl EdgeReader for SqliteGraphStore {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::task_exists(&conn, id)
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        let conn = self.conn.lock().await;
        queries::task_status(&conn, id)
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::has_edge(&conn, task, dependency)
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        let conn = self.conn.lock().await;
        queries::edges_from(&conn, task)
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        let conn = self.conn.lock().await;
        queries::edges_to(&conn, dependency)
    }

    async fn probe_recursive_query(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::probe_recursive_query(&conn)
    }

    async fn traverse_recursive(
        &self,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TraversalRow>> {
        let conn = self.conn.lock().await;
        queries::traverse(&conn, root, direction)
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        let guard = self.conn.clone().lock_owned().await;
        Ok(Box::new(SqliteTransaction::begin(guard)?))
    }

    async fn stats(&self) -> Result<DependencyStats> {
        let conn = self.conn.lock().await;
        queries::stats(&conn)
    }
}
