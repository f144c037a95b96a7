//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all data
//! and is wrapped in `Arc<Mutex<>>` for thread safety.

use crate::domain::{DependencyEdge, DependencyStats, TaskId, TaskStatus};
use crate::error::{Error, Result};
use crate::storage::summarize_counts;
use chrono::{DateTime, Utc};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction as EdgeDirection;
use std::collections::HashMap;

/// Inner storage structure (not thread-safe).
///
/// # Graph Representation
///
/// Edges are directed from **dependent to dependency** (source depends on
/// target) and weighted with their creation time. A `StableDiGraph` keeps
/// node indices valid when tasks are removed, so `node_map` never needs
/// rebuilding.
#[derive(Debug, Default)]
pub(crate) struct GraphInner {
    /// Task statuses indexed by ID
    tasks: HashMap<TaskId, TaskStatus>,

    /// Dependency graph; nodes hold task ids, edges hold creation time
    graph: StableDiGraph<TaskId, DateTime<Utc>>,

    /// Mapping from TaskId to graph NodeIndex.
    ///
    /// Every key of `tasks` has an entry here.
    node_map: HashMap<TaskId, NodeIndex>,
}

impl GraphInner {
    pub(super) fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub(super) fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.tasks.get(id).copied()
    }

    /// Insert a task or overwrite its status.
    pub(super) fn upsert_task(&mut self, id: TaskId, status: TaskStatus) -> Result<()> {
        if id.is_blank() {
            return Err(Error::Validation("task id cannot be empty".to_string()));
        }
        if !self.node_map.contains_key(&id) {
            let node = self.graph.add_node(id.clone());
            self.node_map.insert(id.clone(), node);
        }
        self.tasks.insert(id, status);
        Ok(())
    }

    pub(super) fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let current = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
        *current = status;
        Ok(())
    }

    /// Remove a task together with every edge touching it.
    ///
    /// Returns the number of edges removed.
    pub(super) fn remove_task(&mut self, id: &TaskId) -> Result<usize> {
        let node = self
            .node_map
            .remove(id)
            .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
        let edges = self.graph.edges_directed(node, EdgeDirection::Outgoing).count()
            + self.graph.edges_directed(node, EdgeDirection::Incoming).count();
        self.graph.remove_node(node);
        self.tasks.remove(id);
        Ok(edges)
    }

    pub(super) fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> bool {
        match (self.node_map.get(task), self.node_map.get(dependency)) {
            (Some(&from), Some(&to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// Tasks `task` depends on, sorted by id.
    pub(super) fn dependencies_of(&self, task: &TaskId) -> Vec<TaskId> {
        self.neighbors(task, EdgeDirection::Outgoing)
    }

    /// Tasks depending on `dependency`, sorted by id.
    pub(super) fn dependents_of(&self, dependency: &TaskId) -> Vec<TaskId> {
        self.neighbors(dependency, EdgeDirection::Incoming)
    }

    fn neighbors(&self, id: &TaskId, direction: EdgeDirection) -> Vec<TaskId> {
        let Some(&node) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<TaskId> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        ids.sort();
        ids
    }

    /// Add an edge after enforcing the same constraints the SQLite schema does.
    pub(super) fn add_edge(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
        created_at: DateTime<Utc>,
    ) -> Result<DependencyEdge> {
        if task == dependency {
            return Err(Error::Validation(format!(
                "task {task} cannot depend on itself"
            )));
        }
        let from = *self
            .node_map
            .get(task)
            .ok_or_else(|| Error::TaskNotFound(task.clone()))?;
        let to = *self
            .node_map
            .get(dependency)
            .ok_or_else(|| Error::TaskNotFound(dependency.clone()))?;
        if self.graph.find_edge(from, to).is_some() {
            return Err(Error::DuplicateDependency {
                task: task.clone(),
                dependency: dependency.clone(),
            });
        }

        self.graph.add_edge(from, to, created_at);
        Ok(DependencyEdge {
            task_id: task.clone(),
            dependency_task_id: dependency.clone(),
            created_at,
        })
    }

    /// Remove an edge, returning its creation time if it existed.
    pub(super) fn remove_edge(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Option<DateTime<Utc>> {
        let from = *self.node_map.get(task)?;
        let to = *self.node_map.get(dependency)?;
        let edge = self.graph.find_edge(from, to)?;
        self.graph.remove_edge(edge)
    }

    /// All edges as `(task, dependency)` pairs, sorted.
    pub(super) fn edges(&self) -> Vec<(TaskId, TaskId)> {
        let mut edges: Vec<(TaskId, TaskId)> = self
            .graph
            .edge_references()
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()))
            .collect();
        edges.sort();
        edges
    }

    pub(super) fn stats(&self) -> DependencyStats {
        let counts: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, EdgeDirection::Outgoing).count())
            .filter(|&count| count > 0)
            .collect();

        let two_node_cycles = self
            .graph
            .edge_references()
            .filter(|e| self.graph.find_edge(e.target(), e.source()).is_some())
            .count();

        summarize_counts(&counts, two_node_cycles)
    }
}
