//! Database schema definition for the SQLite store.

/// Database schema definition.
///
/// The edge table enforces uniqueness and the no-self-edge rule on its own,
/// independent of the checks the service runs before inserting.
pub(crate) const SCHEMA: &str = r"
-- Tasks known to the graph; owned by the task layer
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'in_progress', 'completed', 'cancelled'))
);

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

-- Dependency edges: task_id cannot complete before dependency_task_id
CREATE TABLE IF NOT EXISTS task_dependencies (
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    dependency_task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE (task_id, dependency_task_id),
    CHECK (task_id <> dependency_task_id)
);

CREATE INDEX IF NOT EXISTS idx_task_dependencies_task_id
    ON task_dependencies(task_id);
CREATE INDEX IF NOT EXISTS idx_task_dependencies_dependency_task_id
    ON task_dependencies(dependency_task_id);
";
