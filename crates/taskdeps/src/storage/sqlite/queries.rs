//! Synchronous query helpers shared by the store and its transactions.
//!
//! Every function takes a borrowed `Connection` and finishes all statement
//! work before returning, so no prepared statement outlives the lock that
//! guards the connection.

// SQLite stores integers as i64; depths and counts are bounded by the number
// of tasks in the table.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::domain::{DependencyEdge, DependencyStats, Direction, Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::storage::{summarize_counts, TraversalRow};
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension};

/// Walks edges backwards: who depends on the current node.
///
/// Depth is bounded by the task count: a shortest path can never be longer,
/// so the bound only stops re-walking cycles that a corrupt table might hold.
const DEPENDENTS_WALK: &str = "
    WITH RECURSIVE walk(id, depth, parent) AS (
        SELECT ?1, 0, NULL

        UNION

        SELECT td.task_id, w.depth + 1, w.id
        FROM task_dependencies td
        JOIN walk w ON td.dependency_task_id = w.id
        WHERE w.depth < (SELECT COUNT(*) FROM tasks)
    )
    SELECT id, depth, parent FROM walk";

/// Walks edges forwards: what the current node depends on.
const DEPENDENCIES_WALK: &str = "
    WITH RECURSIVE walk(id, depth, parent) AS (
        SELECT ?1, 0, NULL

        UNION

        SELECT td.dependency_task_id, w.depth + 1, w.id
        FROM task_dependencies td
        JOIN walk w ON td.task_id = w.id
        WHERE w.depth < (SELECT COUNT(*) FROM tasks)
    )
    SELECT id, depth, parent FROM walk";

/// Minimal self-contained recursive query; yields 3 when supported.
const PROBE: &str = "
    WITH RECURSIVE probe(n) AS (
        SELECT 1
        UNION ALL
        SELECT n + 1 FROM probe WHERE n < 3
    )
    SELECT COUNT(*) FROM probe";

pub(super) fn task_exists(conn: &Connection, id: &TaskId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        [id.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(super) fn task_status(conn: &Connection, id: &TaskId) -> Result<Option<TaskStatus>> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM tasks WHERE id = ?1",
            [id.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    status
        .map(|s| s.parse::<TaskStatus>().map_err(Error::Storage))
        .transpose()
}

pub(super) fn has_edge(conn: &Connection, task: &TaskId, dependency: &TaskId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM task_dependencies
            WHERE task_id = ?1 AND dependency_task_id = ?2
         )",
        params![task.as_str(), dependency.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(super) fn edges_from(conn: &Connection, task: &TaskId) -> Result<Vec<TaskId>> {
    collect_ids(
        conn,
        "SELECT dependency_task_id FROM task_dependencies
         WHERE task_id = ?1
         ORDER BY dependency_task_id",
        task,
    )
}

pub(super) fn edges_to(conn: &Connection, dependency: &TaskId) -> Result<Vec<TaskId>> {
    collect_ids(
        conn,
        "SELECT task_id FROM task_dependencies
         WHERE dependency_task_id = ?1
         ORDER BY task_id",
        dependency,
    )
}

fn collect_ids(conn: &Connection, sql: &str, id: &TaskId) -> Result<Vec<TaskId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([id.as_str()], |row| row.get::<_, String>(0).map(TaskId::from))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub(super) fn probe_recursive_query(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row(PROBE, [], |row| row.get(0))?;
    if count == 3 {
        Ok(())
    } else {
        Err(Error::Storage(format!(
            "recursive probe returned {count} rows, expected 3"
        )))
    }
}

pub(super) fn traverse(
    conn: &Connection,
    root: &TaskId,
    direction: Direction,
) -> Result<Vec<TraversalRow>> {
    let sql = match direction {
        Direction::Dependents => DEPENDENTS_WALK,
        Direction::Dependencies => DEPENDENCIES_WALK,
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([root.as_str()], |row| {
            Ok(TraversalRow {
                id: TaskId::from(row.get::<_, String>(0)?),
                depth: row.get::<_, i64>(1)? as usize,
                parent: row.get::<_, Option<String>>(2)?.map(TaskId::from),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Insert an edge, translating constraint violations into domain errors.
pub(super) fn insert_edge(
    conn: &Connection,
    task: &TaskId,
    dependency: &TaskId,
    created_at: DateTime<Utc>,
) -> Result<DependencyEdge> {
    for id in [task, dependency] {
        if !task_exists(conn, id)? {
            return Err(Error::TaskNotFound(id.clone()));
        }
    }

    conn.execute(
        "INSERT INTO task_dependencies (task_id, dependency_task_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![task.as_str(), dependency.as_str(), created_at.to_rfc3339()],
    )
    .map_err(|e| constraint_error(e, task, dependency))?;

    Ok(DependencyEdge {
        task_id: task.clone(),
        dependency_task_id: dependency.clone(),
        created_at,
    })
}

fn constraint_error(err: rusqlite::Error, task: &TaskId, dependency: &TaskId) -> Error {
    let extended_code = match &err {
        rusqlite::Error::SqliteFailure(e, _) => e.extended_code,
        _ => return Error::Database(err),
    };

    match extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            Error::DuplicateDependency {
                task: task.clone(),
                dependency: dependency.clone(),
            }
        }
        ffi::SQLITE_CONSTRAINT_CHECK => {
            Error::Validation(format!("task {task} cannot depend on itself"))
        }
        _ => Error::Database(err),
    }
}

pub(super) fn delete_edge(conn: &Connection, task: &TaskId, dependency: &TaskId) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM task_dependencies WHERE task_id = ?1 AND dependency_task_id = ?2",
        params![task.as_str(), dependency.as_str()],
    )?;
    Ok(removed > 0)
}

pub(super) fn stats(conn: &Connection) -> Result<DependencyStats> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM task_dependencies GROUP BY task_id",
    )?;
    let counts = stmt
        .query_map([], |row| row.get::<_, i64>(0).map(|c| c as usize))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let two_node_cycles: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM task_dependencies a
         JOIN task_dependencies b
           ON a.task_id = b.dependency_task_id
          AND a.dependency_task_id = b.task_id",
        [],
        |row| row.get(0),
    )?;

    Ok(summarize_counts(&counts, two_node_cycles as usize))
}

pub(super) fn upsert_task(
    conn: &Connection,
    id: &TaskId,
    title: Option<&str>,
    status: TaskStatus,
) -> Result<()> {
    if id.is_blank() {
        return Err(Error::Validation("task id cannot be empty".to_string()));
    }
    conn.execute(
        "INSERT INTO tasks (id, title, status) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            title = COALESCE(excluded.title, tasks.title)",
        params![id.as_str(), title, status.as_str()],
    )?;
    Ok(())
}

pub(super) fn set_status(conn: &Connection, id: &TaskId, status: TaskStatus) -> Result<()> {
    let updated = conn.execute(
        "UPDATE tasks SET status = ?2 WHERE id = ?1",
        params![id.as_str(), status.as_str()],
    )?;
    if updated == 0 {
        return Err(Error::TaskNotFound(id.clone()));
    }
    Ok(())
}

/// Delete a task; the foreign keys cascade its edges away.
///
/// Returns the number of edges that went with it.
pub(super) fn delete_task(conn: &Connection, id: &TaskId) -> Result<usize> {
    let edges: i64 = conn.query_row(
        "SELECT COUNT(*) FROM task_dependencies
         WHERE task_id = ?1 OR dependency_task_id = ?1",
        [id.as_str()],
        |row| row.get(0),
    )?;
    let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", [id.as_str()])?;
    if deleted == 0 {
        return Err(Error::TaskNotFound(id.clone()));
    }
    Ok(edges as usize)
}

pub(super) fn get_task(conn: &Connection, id: &TaskId) -> Result<Option<Task>> {
    let raw: Option<(Option<String>, String)> = conn
        .query_row(
            "SELECT title, status FROM tasks WHERE id = ?1",
            [id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    raw.map(|(title, status)| {
        Ok(Task {
            id: id.clone(),
            title,
            status: status.parse().map_err(Error::Storage)?,
        })
    })
    .transpose()
}

pub(super) fn list_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare("SELECT id, title, status FROM tasks ORDER BY id")?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, title, status)| {
            Ok(Task {
                id: TaskId::from(id),
                title,
                status: status.parse().map_err(Error::Storage)?,
            })
        })
        .collect()
}

pub(super) fn edges(conn: &Connection) -> Result<Vec<DependencyEdge>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, dependency_task_id, created_at FROM task_dependencies
         ORDER BY task_id, dependency_task_id",
    )?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(task, dependency, created_at)| {
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| Error::Storage(format!("invalid created_at '{created_at}': {e}")))?
                .with_timezone(&Utc);
            Ok(DependencyEdge {
                task_id: TaskId::from(task),
                dependency_task_id: TaskId::from(dependency),
                created_at,
            })
        })
        .collect()
}
