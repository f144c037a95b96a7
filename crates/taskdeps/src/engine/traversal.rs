//! Transitive traversal of the dependency graph.
//!
//! Two strategies produce the same output for the same graph:
//!
//! - [`RecursiveQueryStrategy`] asks the store for every `(node, depth,
//!   parent)` combination in one recursive query and reduces the rows here.
//! - [`IterativeStrategy`] expands one level at a time with `edges_from` /
//!   `edges_to` calls.
//!
//! # Output Order
//!
//! A hierarchy lists the root first, then every reachable node ordered by
//! `(level, id)`. A node's level is its shortest distance from the root, and
//! its path runs through its lowest-id parent on the previous level. This is
//! exactly what a breadth-first search produces when it processes frontiers
//! and neighbor lists in ascending id order, which the iterative strategy
//! does.
//!
//! Termination relies on the visited set (iterative) or on the store's depth
//! bound of one hop per task (recursive). There is no fixed depth cap.

use crate::domain::{Direction, HierarchyNode, TaskId};
use crate::error::{Error, Result};
use crate::storage::{EdgeReader, TraversalRow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A way of expanding the graph from a root.
#[async_trait]
pub trait TraversalStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Breadth-first labeling from `root`, root included at level 0.
    async fn hierarchy(
        &self,
        reader: &dyn EdgeReader,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<HierarchyNode>>;

    /// Path of ids from `from` to `to` following edges forwards, or `None`
    /// if `to` is not reachable.
    async fn path(
        &self,
        reader: &dyn EdgeReader,
        from: &TaskId,
        to: &TaskId,
    ) -> Result<Option<Vec<TaskId>>> {
        let nodes = self.hierarchy(reader, from, Direction::Dependencies).await?;
        Ok(nodes.into_iter().find(|n| &n.id == to).map(|n| n.path))
    }
}

/// Delegates traversal to the store's recursive query.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursiveQueryStrategy;

#[async_trait]
impl TraversalStrategy for RecursiveQueryStrategy {
    fn name(&self) -> &'static str {
        "recursive-query"
    }

    async fn hierarchy(
        &self,
        reader: &dyn EdgeReader,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<HierarchyNode>> {
        let rows = reader.traverse_recursive(root, direction).await?;
        reduce_rows(root, rows)
    }
}

/// Reduce raw recursive-query rows to one [`HierarchyNode`] per task.
///
/// Each task keeps its minimum depth; among rows at that depth the lowest
/// parent id wins. Every such parent sits exactly one level higher, so paths
/// can be built level by level.
pub(crate) fn reduce_rows(root: &TaskId, rows: Vec<TraversalRow>) -> Result<Vec<HierarchyNode>> {
    let mut best: HashMap<TaskId, (usize, Option<TaskId>)> = HashMap::new();
    best.insert(root.clone(), (0, None));

    for row in rows {
        if &row.id == root {
            continue;
        }
        match best.get_mut(&row.id) {
            Some(entry) => {
                if (row.depth, &row.parent) < (entry.0, &entry.1) {
                    *entry = (row.depth, row.parent);
                }
            }
            None => {
                best.insert(row.id, (row.depth, row.parent));
            }
        }
    }

    let mut ordered: Vec<(TaskId, usize, Option<TaskId>)> = best
        .into_iter()
        .map(|(id, (depth, parent))| (id, depth, parent))
        .collect();
    ordered.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));

    let mut paths: HashMap<TaskId, Vec<TaskId>> = HashMap::with_capacity(ordered.len());
    let mut nodes = Vec::with_capacity(ordered.len());
    for (id, level, parent) in ordered {
        let path = match parent {
            None => vec![id.clone()],
            Some(parent) => {
                let mut path = paths.get(&parent).cloned().ok_or_else(|| {
                    Error::Storage(format!(
                        "traversal row for {id} references unreached parent {parent}"
                    ))
                })?;
                path.push(id.clone());
                path
            }
        };
        paths.insert(id.clone(), path.clone());
        nodes.push(HierarchyNode { id, level, path });
    }

    Ok(nodes)
}

/// Level-by-level expansion through direct neighbor lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterativeStrategy;

impl IterativeStrategy {
    /// Breadth-first search from `root`; stops as soon as `target` is found.
    async fn expand(
        reader: &dyn EdgeReader,
        root: &TaskId,
        direction: Direction,
        target: Option<&TaskId>,
    ) -> Result<Vec<HierarchyNode>> {
        let mut nodes = vec![HierarchyNode {
            id: root.clone(),
            level: 0,
            path: vec![root.clone()],
        }];
        if target == Some(root) {
            return Ok(nodes);
        }

        let mut visited: HashSet<TaskId> = HashSet::from([root.clone()]);
        let mut frontier: Vec<usize> = vec![0];
        let mut level = 0;

        while !frontier.is_empty() {
            level += 1;
            let mut next: Vec<HierarchyNode> = Vec::new();

            for &index in &frontier {
                let current = &nodes[index];
                let neighbors = match direction {
                    Direction::Dependents => reader.edges_to(&current.id).await?,
                    Direction::Dependencies => reader.edges_from(&current.id).await?,
                };
                for neighbor in neighbors {
                    if visited.insert(neighbor.clone()) {
                        let mut path = current.path.clone();
                        path.push(neighbor.clone());
                        next.push(HierarchyNode {
                            id: neighbor,
                            level,
                            path,
                        });
                    }
                }
            }

            next.sort_by(|a, b| a.id.cmp(&b.id));
            let start = nodes.len();
            let found = target.is_some_and(|t| next.iter().any(|n| &n.id == t));
            nodes.extend(next);
            if found {
                break;
            }
            frontier = (start..nodes.len()).collect();
        }

        Ok(nodes)
    }
}

#[async_trait]
impl TraversalStrategy for IterativeStrategy {
    fn name(&self) -> &'static str {
        "iterative"
    }

    async fn hierarchy(
        &self,
        reader: &dyn EdgeReader,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<HierarchyNode>> {
        Self::expand(reader, root, direction, None).await
    }

    async fn path(
        &self,
        reader: &dyn EdgeReader,
        from: &TaskId,
        to: &TaskId,
    ) -> Result<Option<Vec<TaskId>>> {
        let nodes = Self::expand(reader, from, Direction::Dependencies, Some(to)).await?;
        Ok(nodes.into_iter().find(|n| &n.id == to).map(|n| n.path))
    }
}

/// Transitive queries over whichever strategy was selected.
///
/// Cheap to clone. Every method takes the reader to run against, so the same
/// engine serves plain store reads and reads inside a write transaction.
#[derive(Debug, Clone)]
pub struct TraversalEngine {
    strategy: Arc<dyn TraversalStrategy>,
}

impl TraversalEngine {
    /// Create an engine backed by `strategy`.
    pub fn new(strategy: Arc<dyn TraversalStrategy>) -> Self {
        Self { strategy }
    }

    /// Name of the active strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Every task that transitively depends on `root`, ordered by
    /// `(level, id)`, root excluded.
    pub async fn descendants(&self, reader: &dyn EdgeReader, root: &TaskId) -> Result<Vec<TaskId>> {
        self.transitive(reader, root, Direction::Dependents).await
    }

    /// Every task `root` transitively depends on, ordered by `(level, id)`,
    /// root excluded.
    pub async fn ancestors(&self, reader: &dyn EdgeReader, root: &TaskId) -> Result<Vec<TaskId>> {
        self.transitive(reader, root, Direction::Dependencies).await
    }

    async fn transitive(
        &self,
        reader: &dyn EdgeReader,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TaskId>> {
        let nodes = self.strategy.hierarchy(reader, root, direction).await?;
        Ok(nodes.into_iter().skip(1).map(|n| n.id).collect())
    }

    /// Breadth-first labeling from `root` in `direction`.
    pub async fn hierarchy(
        &self,
        reader: &dyn EdgeReader,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<HierarchyNode>> {
        self.strategy.hierarchy(reader, root, direction).await
    }

    /// Whether `from == to` or a path of edges leads from `from` to `to`,
    /// i.e. `from` transitively depends on `to`.
    pub async fn reachable(
        &self,
        reader: &dyn EdgeReader,
        from: &TaskId,
        to: &TaskId,
    ) -> Result<bool> {
        if from == to {
            return Ok(true);
        }
        Ok(self.strategy.path(reader, from, to).await?.is_some())
    }

    /// The path from `from` to `to` along edges, if one exists.
    pub async fn path(
        &self,
        reader: &dyn EdgeReader,
        from: &TaskId,
        to: &TaskId,
    ) -> Result<Option<Vec<TaskId>>> {
        self.strategy.path(reader, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use crate::storage::{GraphStore, InMemoryGraphStore, SqliteGraphStore};
    use rstest::rstest;

    fn ids(raw: &[&str]) -> Vec<TaskId> {
        raw.iter().map(|s| TaskId::new(*s)).collect()
    }

    fn row(id: &str, depth: usize, parent: Option<&str>) -> TraversalRow {
        TraversalRow {
            id: id.into(),
            depth,
            parent: parent.map(TaskId::from),
        }
    }

    /// Diamond with a shortcut: d -> b -> a, d -> c -> a, e -> d, e -> a.
    const EDGES: &[(&str, &str)] = &[
        ("b", "a"),
        ("c", "a"),
        ("d", "b"),
        ("d", "c"),
        ("e", "d"),
        ("e", "a"),
    ];

    async fn sqlite_graph() -> SqliteGraphStore {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        for id in ["a", "b", "c", "d", "e"] {
            store
                .upsert_task(&id.into(), None, TaskStatus::Pending)
                .await
                .unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        for (t, d) in EDGES {
            tx.insert_edge(&(*t).into(), &(*d).into()).await.unwrap();
        }
        tx.commit().await.unwrap();
        store
    }

    #[test]
    fn test_reduce_rows_keeps_min_depth_and_lowest_parent() {
        let root = TaskId::new("a");
        let rows = vec![
            row("a", 0, None),
            row("d", 2, Some("c")),
            row("b", 1, Some("a")),
            row("d", 2, Some("b")),
            row("c", 1, Some("a")),
            row("e", 3, Some("d")),
            row("e", 1, Some("a")),
        ];

        let nodes = reduce_rows(&root, rows).unwrap();

        assert_eq!(
            nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>(),
            ids(&["a", "b", "c", "e", "d"])
        );
        let d = nodes.iter().find(|n| n.id.as_str() == "d").unwrap();
        assert_eq!(d.level, 2);
        assert_eq!(d.path, ids(&["a", "b", "d"]));
        let e = nodes.iter().find(|n| n.id.as_str() == "e").unwrap();
        assert_eq!(e.level, 1);
        assert_eq!(e.path, ids(&["a", "e"]));
    }

    #[test]
    fn test_reduce_rows_rejects_orphan_parent() {
        let root = TaskId::new("a");
        let rows = vec![row("a", 0, None), row("x", 2, Some("ghost"))];
        assert!(matches!(reduce_rows(&root, rows), Err(Error::Storage(_))));
    }

    #[rstest]
    #[case(Direction::Dependents, "a")]
    #[case(Direction::Dependencies, "e")]
    #[case(Direction::Dependents, "c")]
    #[case(Direction::Dependencies, "d")]
    #[tokio::test]
    async fn test_strategies_agree(#[case] direction: Direction, #[case] root: &str) {
        let store = sqlite_graph().await;
        let root = TaskId::new(root);

        let recursive = RecursiveQueryStrategy
            .hierarchy(&store, &root, direction)
            .await
            .unwrap();
        let iterative = IterativeStrategy
            .hierarchy(&store, &root, direction)
            .await
            .unwrap();

        assert_eq!(recursive, iterative);
    }

    #[tokio::test]
    async fn test_descendants_order_by_level_then_id() {
        let store = sqlite_graph().await;
        let engine = TraversalEngine::new(Arc::new(IterativeStrategy));

        assert_eq!(
            engine.descendants(&store, &"a".into()).await.unwrap(),
            ids(&["b", "c", "e", "d"])
        );
        assert_eq!(
            engine.ancestors(&store, &"e".into()).await.unwrap(),
            ids(&["a", "d", "b", "c"])
        );
    }

    #[rstest]
    #[case(RecursiveQueryStrategy.name())]
    #[case(IterativeStrategy.name())]
    #[tokio::test]
    async fn test_reachable_follows_edge_direction(#[case] strategy: &str) {
        let store = sqlite_graph().await;
        let strategy: Arc<dyn TraversalStrategy> = if strategy == "iterative" {
            Arc::new(IterativeStrategy)
        } else {
            Arc::new(RecursiveQueryStrategy)
        };
        let engine = TraversalEngine::new(strategy);

        assert!(engine.reachable(&store, &"e".into(), &"a".into()).await.unwrap());
        assert!(engine.reachable(&store, &"d".into(), &"a".into()).await.unwrap());
        assert!(!engine.reachable(&store, &"a".into(), &"e".into()).await.unwrap());
        assert!(!engine.reachable(&store, &"b".into(), &"c".into()).await.unwrap());
        assert!(engine.reachable(&store, &"b".into(), &"b".into()).await.unwrap());
        assert_eq!(
            engine.path(&store, &"e".into(), &"b".into()).await.unwrap(),
            Some(ids(&["e", "d", "b"]))
        );
    }

    #[tokio::test]
    async fn test_iterative_on_in_memory_store() {
        let store = InMemoryGraphStore::new();
        for id in ["a", "b", "c"] {
            store.add_task(id, TaskStatus::Pending).await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        tx.insert_edge(&"b".into(), &"a".into()).await.unwrap();
        tx.insert_edge(&"c".into(), &"b".into()).await.unwrap();
        tx.commit().await.unwrap();

        let nodes = IterativeStrategy
            .hierarchy(&store, &"c".into(), Direction::Dependencies)
            .await
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                HierarchyNode {
                    id: "c".into(),
                    level: 0,
                    path: ids(&["c"]),
                },
                HierarchyNode {
                    id: "b".into(),
                    level: 1,
                    path: ids(&["c", "b"]),
                },
                HierarchyNode {
                    id: "a".into(),
                    level: 2,
                    path: ids(&["c", "b", "a"]),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_root_yields_only_itself() {
        let store = InMemoryGraphStore::new();
        let nodes = IterativeStrategy
            .hierarchy(&store, &"ghost".into(), Direction::Dependents)
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
    }
}
