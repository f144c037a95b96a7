//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use taskdeps::cache::MemoryCache;
use taskdeps::config::GraphConfig;
use taskdeps::domain::{DependencyEdge, DependencyStats, Direction, TaskId, TaskStatus};
use taskdeps::engine::{Capability, StrategyPreference};
use taskdeps::storage::{
    EdgeReader, GraphStore, GraphTransaction, InMemoryGraphStore, SqliteGraphStore, TraversalRow,
};
use taskdeps::{DependencyGraphService, Error, Result};

/// Store and strategy combinations every behavioral test runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    SqliteRecursive,
    SqliteIterative,
}

impl Backend {
    pub const ALL: [Self; 3] = [Self::InMemory, Self::SqliteRecursive, Self::SqliteIterative];

    pub fn expected_capability(self) -> Capability {
        match self {
            Self::SqliteRecursive => Capability::RecursiveQuerySupported,
            Self::InMemory | Self::SqliteIterative => Capability::IterativeOnly,
        }
    }
}

/// Task-level control over whichever store backs a fixture.
#[derive(Debug, Clone)]
pub enum TaskControl {
    Memory(InMemoryGraphStore),
    Sqlite(SqliteGraphStore),
}

impl TaskControl {
    pub async fn add(&self, id: &str, status: TaskStatus) {
        match self {
            Self::Memory(store) => store.add_task(id, status).await.unwrap(),
            Self::Sqlite(store) => store
                .upsert_task(&TaskId::new(id), None, status)
                .await
                .unwrap(),
        }
    }

    pub async fn set_status(&self, id: &str, status: TaskStatus) {
        let id = TaskId::new(id);
        match self {
            Self::Memory(store) => store.set_status(&id, status).await.unwrap(),
            Self::Sqlite(store) => store.set_status(&id, status).await.unwrap(),
        }
    }

    pub async fn delete(&self, id: &str) {
        let id = TaskId::new(id);
        match self {
            Self::Memory(store) => {
                store.remove_task(&id).await.unwrap();
            }
            Self::Sqlite(store) => {
                store.delete_task(&id).await.unwrap();
            }
        }
    }

    pub async fn edge_count(&self) -> usize {
        match self {
            Self::Memory(store) => store.edge_count().await,
            Self::Sqlite(store) => store.edge_count().await.unwrap(),
        }
    }

    pub fn as_graph_store(&self) -> Arc<dyn GraphStore> {
        match self {
            Self::Memory(store) => Arc::new(store.clone()),
            Self::Sqlite(store) => Arc::new(store.clone()),
        }
    }
}

/// A service plus direct access to its store and cache.
pub struct Fixture {
    pub service: DependencyGraphService,
    pub tasks: TaskControl,
    pub cache: MemoryCache,
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

/// Build a fixture with the given tasks, all `Pending`.
pub async fn fixture(backend: Backend, ids: &[&str]) -> Fixture {
    fixture_with(backend, ids, |store| store).await
}

/// Build a fixture whose store fails at `fault` once the returned switch is
/// turned on.
pub async fn faulty_fixture(
    backend: Backend,
    ids: &[&str],
    fault: Fault,
) -> (Fixture, Arc<AtomicBool>) {
    let armed = Arc::new(AtomicBool::new(false));
    let switch = Arc::clone(&armed);
    let fx = fixture_with(backend, ids, move |inner| {
        let store: Arc<dyn GraphStore> = Arc::new(FaultyStore {
            inner,
            fault,
            armed: switch,
        });
        store
    })
    .await;
    (fx, armed)
}

async fn fixture_with(
    backend: Backend,
    ids: &[&str],
    wrap: impl FnOnce(Arc<dyn GraphStore>) -> Arc<dyn GraphStore>,
) -> Fixture {
    let (tasks, strategy) = match backend {
        Backend::InMemory => (
            TaskControl::Memory(InMemoryGraphStore::new()),
            StrategyPreference::Auto,
        ),
        Backend::SqliteRecursive => (
            TaskControl::Sqlite(SqliteGraphStore::open_in_memory().unwrap()),
            StrategyPreference::Auto,
        ),
        Backend::SqliteIterative => (
            TaskControl::Sqlite(SqliteGraphStore::open_in_memory().unwrap()),
            StrategyPreference::Iterative,
        ),
    };

    for id in ids {
        tasks.add(id, TaskStatus::Pending).await;
    }

    let cache = MemoryCache::new();
    let config = GraphConfig {
        strategy,
        ..GraphConfig::default()
    };
    let service =
        DependencyGraphService::new(wrap(tasks.as_graph_store()), Arc::new(cache.clone()), &config)
            .await
            .unwrap();
    assert_eq!(service.capability(), backend.expected_capability());

    Fixture {
        service,
        tasks,
        cache,
    }
}

/// Shorthand for a list of task ids.
pub fn ids(items: &[&str]) -> Vec<TaskId> {
    items.iter().map(|s| TaskId::new(*s)).collect()
}

/// Store wrapper that counts every call reaching the wrapped store,
/// transactions included.
pub struct CountingStore {
    inner: Arc<dyn GraphStore>,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn GraphStore>) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EdgeReader for CountingStore {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        self.hit();
        self.inner.task_exists(id).await
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        self.hit();
        self.inner.task_status(id).await
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        self.hit();
        self.inner.has_edge(task, dependency).await
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        self.hit();
        self.inner.edges_from(task).await
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        self.hit();
        self.inner.edges_to(dependency).await
    }

    async fn probe_recursive_query(&self) -> Result<()> {
        self.hit();
        self.inner.probe_recursive_query().await
    }

    async fn traverse_recursive(
        &self,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TraversalRow>> {
        self.hit();
        self.inner.traverse_recursive(root, direction).await
    }
}

#[async_trait]
impl GraphStore for CountingStore {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        self.hit();
        self.inner.begin().await
    }

    async fn stats(&self) -> Result<DependencyStats> {
        self.hit();
        self.inner.stats().await
    }
}

/// Where a [`FaultyStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `insert_edge` writes the edge, then reports an error
    AfterInsert,
    /// `delete_edge` deletes the edge, then reports an error
    AfterDelete,
    /// `commit` fails and the writes are discarded
    Commit,
}

fn injected(fault: Fault) -> Error {
    Error::Storage(format!("injected failure: {fault:?}"))
}

/// Store wrapper that makes write transactions fail at a chosen point.
pub struct FaultyStore {
    inner: Arc<dyn GraphStore>,
    fault: Fault,
    armed: Arc<AtomicBool>,
}

struct FaultyTransaction {
    inner: Box<dyn GraphTransaction>,
    fault: Option<Fault>,
}

#[async_trait]
impl EdgeReader for FaultyStore {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        self.inner.task_exists(id).await
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        self.inner.task_status(id).await
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        self.inner.has_edge(task, dependency).await
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        self.inner.edges_from(task).await
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        self.inner.edges_to(dependency).await
    }

    async fn probe_recursive_query(&self) -> Result<()> {
        self.inner.probe_recursive_query().await
    }

    async fn traverse_recursive(
        &self,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TraversalRow>> {
        self.inner.traverse_recursive(root, direction).await
    }
}

#[async_trait]
impl GraphStore for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        let inner = self.inner.begin().await?;
        let fault = self.armed.load(Ordering::SeqCst).then_some(self.fault);
        Ok(Box::new(FaultyTransaction { inner, fault }))
    }

    async fn stats(&self) -> Result<DependencyStats> {
        self.inner.stats().await
    }
}

#[async_trait]
impl EdgeReader for FaultyTransaction {
    async fn task_exists(&self, id: &TaskId) -> Result<bool> {
        self.inner.task_exists(id).await
    }

    async fn task_status(&self, id: &TaskId) -> Result<Option<TaskStatus>> {
        self.inner.task_status(id).await
    }

    async fn has_edge(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        self.inner.has_edge(task, dependency).await
    }

    async fn edges_from(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        self.inner.edges_from(task).await
    }

    async fn edges_to(&self, dependency: &TaskId) -> Result<Vec<TaskId>> {
        self.inner.edges_to(dependency).await
    }

    async fn probe_recursive_query(&self) -> Result<()> {
        self.inner.probe_recursive_query().await
    }

    async fn traverse_recursive(
        &self,
        root: &TaskId,
        direction: Direction,
    ) -> Result<Vec<TraversalRow>> {
        self.inner.traverse_recursive(root, direction).await
    }
}

#[async_trait]
impl GraphTransaction for FaultyTransaction {
    async fn insert_edge(
        &mut self,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<DependencyEdge> {
        let edge = self.inner.insert_edge(task, dependency).await?;
        match self.fault {
            Some(fault @ Fault::AfterInsert) => Err(injected(fault)),
            _ => Ok(edge),
        }
    }

    async fn delete_edge(&mut self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        let deleted = self.inner.delete_edge(task, dependency).await?;
        match self.fault {
            Some(fault @ Fault::AfterDelete) => Err(injected(fault)),
            _ => Ok(deleted),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { inner, fault } = *self;
        match fault {
            Some(fault @ Fault::Commit) => {
                inner.rollback().await?;
                Err(injected(fault))
            }
            _ => inner.commit().await,
        }
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }
}
