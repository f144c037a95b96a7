//! The dependency graph façade.
//!
//! [`DependencyGraphService`] is the only entry point the task layer needs:
//! guarded edge mutations, cached queries, and the notification hooks that
//! keep the cache coherent when task status or existence changes elsewhere.
//!
//! # Mutation Protocol
//!
//! 1. Validate ids (no store call for malformed input or self edges)
//! 2. Open an exclusive store transaction
//! 3. Check existence, duplicates and cycles through that transaction
//! 4. Collect the affected task set, then write
//! 5. Commit, and only then invalidate the affected cache entries
//!
//! Any failure before the commit rolls the transaction back and leaves the
//! cache untouched.

use crate::cache::{CacheLayer, CacheNamespace, CacheStore};
use crate::config::GraphConfig;
use crate::domain::{DependencyEdge, DependencyStats, Direction, HierarchyNode, TaskId};
use crate::engine::{Capability, CapabilityProbe, CompletionGate, CycleGuard, TraversalEngine};
use crate::error::{Error, Result};
use crate::storage::{EdgeReader, GraphStore, GraphTransaction};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Public façade over the dependency graph.
pub struct DependencyGraphService {
    store: Arc<dyn GraphStore>,
    cache: CacheLayer,
    engine: TraversalEngine,
    guard: CycleGuard,
    gate: CompletionGate,
    capability: Capability,
    ttl: Duration,
}

impl fmt::Debug for DependencyGraphService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraphService")
            .field("store", &"<dyn GraphStore>")
            .field("cache", &self.cache)
            .field("capability", &self.capability)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl DependencyGraphService {
    /// Build a service, probing the store for recursive query support.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the configuration is invalid. The probe
    /// itself never fails.
    pub async fn new(
        store: Arc<dyn GraphStore>,
        cache: Arc<dyn CacheStore>,
        config: &GraphConfig,
    ) -> Result<Self> {
        config.validate()?;
        let capability = CapabilityProbe::new(config.strategy)
            .detect(store.as_ref())
            .await;
        Ok(Self::with_capability(store, cache, config, capability))
    }

    /// Build a service with a known capability, skipping the probe.
    ///
    /// Selecting [`Capability::RecursiveQuerySupported`] for a store that
    /// cannot run recursive queries makes every traversal fail.
    pub fn with_capability(
        store: Arc<dyn GraphStore>,
        cache: Arc<dyn CacheStore>,
        config: &GraphConfig,
        capability: Capability,
    ) -> Self {
        let engine = TraversalEngine::new(capability.strategy());
        tracing::debug!(
            capability = %capability,
            strategy = engine.strategy_name(),
            "Dependency graph service ready"
        );
        Self {
            store,
            cache: CacheLayer::new(cache, config.cache_prefix.clone()),
            guard: CycleGuard::new(engine.clone()),
            engine,
            gate: CompletionGate,
            capability,
            ttl: config.cache_ttl(),
        }
    }

    /// The capability selected at construction time.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Record that `task` depends on `dependency`.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for blank ids or `task == dependency`, before
    ///   any store call
    /// - `Error::TaskNotFound` if either task is missing
    /// - `Error::DuplicateDependency` if the edge already exists
    /// - `Error::CircularDependency` if `dependency` already depends on
    ///   `task`, directly or transitively
    /// - storage errors, after which nothing was written
    pub async fn add_dependency(
        &self,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<DependencyEdge> {
        validate_pair(task, dependency)?;

        let mut tx = self.store.begin().await?;
        let (edge, affected) = match self.add_in(tx.as_mut(), task, dependency).await {
            Ok(result) => result,
            Err(e) => return Err(rollback(tx, e).await),
        };
        tx.commit().await?;

        tracing::info!(
            task = %task,
            dependency = %dependency,
            affected = affected.len(),
            "Dependency added"
        );
        self.invalidate(&affected).await?;
        Ok(edge)
    }

    async fn add_in(
        &self,
        tx: &mut dyn GraphTransaction,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<(DependencyEdge, BTreeSet<TaskId>)> {
        for id in [task, dependency] {
            if !tx.task_exists(id).await? {
                return Err(Error::TaskNotFound(id.clone()));
            }
        }
        if tx.has_edge(task, dependency).await? {
            return Err(Error::DuplicateDependency {
                task: task.clone(),
                dependency: dependency.clone(),
            });
        }
        self.guard.check(&*tx, task, dependency).await?;

        let affected = self.affected_by_edge(&*tx, task, dependency).await?;
        let edge = tx.insert_edge(task, dependency).await?;
        Ok((edge, affected))
    }

    /// Remove the edge `task -> dependency`.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for blank ids or `task == dependency`
    /// - `Error::DependencyNotFound` if the edge is absent
    /// - storage errors, after which nothing was written
    pub async fn remove_dependency(&self, task: &TaskId, dependency: &TaskId) -> Result<()> {
        validate_pair(task, dependency)?;

        let mut tx = self.store.begin().await?;
        let affected = match self.remove_in(tx.as_mut(), task, dependency).await {
            Ok(affected) => affected,
            Err(e) => return Err(rollback(tx, e).await),
        };
        tx.commit().await?;

        tracing::info!(
            task = %task,
            dependency = %dependency,
            affected = affected.len(),
            "Dependency removed"
        );
        self.invalidate(&affected).await
    }

    async fn remove_in(
        &self,
        tx: &mut dyn GraphTransaction,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<BTreeSet<TaskId>> {
        if !tx.has_edge(task, dependency).await? {
            return Err(Error::DependencyNotFound {
                task: task.clone(),
                dependency: dependency.clone(),
            });
        }
        let affected = self.affected_by_edge(&*tx, task, dependency).await?;
        if !tx.delete_edge(task, dependency).await? {
            return Err(Error::Storage(format!(
                "edge {task} -> {dependency} vanished inside its transaction"
            )));
        }
        Ok(affected)
    }

    /// Tasks whose cached results change when `task -> dependency` is added
    /// or removed: both endpoints, everything depending on `task`, and
    /// everything `dependency` depends on.
    async fn affected_by_edge(
        &self,
        reader: &dyn EdgeReader,
        task: &TaskId,
        dependency: &TaskId,
    ) -> Result<BTreeSet<TaskId>> {
        let mut affected = BTreeSet::from([task.clone(), dependency.clone()]);
        affected.extend(self.engine.descendants(reader, task).await?);
        affected.extend(self.engine.ancestors(reader, dependency).await?);
        Ok(affected)
    }

    /// Every task that transitively depends on `task`, ordered by distance
    /// then id.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn dependents(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        self.cache
            .get_or_compute(CacheNamespace::Dependents, task, self.ttl, || async {
                self.ensure_exists(task).await?;
                self.engine.descendants(self.reader(), task).await
            })
            .await
    }

    /// Every task `task` transitively depends on, ordered by distance then id.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn dependencies(&self, task: &TaskId) -> Result<Vec<TaskId>> {
        self.cache
            .get_or_compute(CacheNamespace::Dependencies, task, self.ttl, || async {
                self.ensure_exists(task).await?;
                self.engine.ancestors(self.reader(), task).await
            })
            .await
    }

    /// Leveled view of everything `task` depends on, `task` itself first.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn hierarchy(&self, task: &TaskId) -> Result<Vec<HierarchyNode>> {
        self.cache
            .get_or_compute(CacheNamespace::Hierarchy, task, self.ttl, || async {
                self.ensure_exists(task).await?;
                self.engine
                    .hierarchy(self.reader(), task, Direction::Dependencies)
                    .await
            })
            .await
    }

    /// Whether every direct dependency of `task` is completed.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task doesn't exist.
    pub async fn is_completion_allowed(&self, task: &TaskId) -> Result<bool> {
        self.cache
            .get_or_compute(CacheNamespace::Completion, task, self.ttl, || async {
                self.ensure_exists(task).await?;
                self.gate.is_completion_allowed(self.reader(), task).await
            })
            .await
    }

    /// [`is_completion_allowed`](Self::is_completion_allowed) for several
    /// tasks at once. Duplicate ids collapse into one entry.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown task.
    pub async fn batch_completion_allowed(
        &self,
        tasks: &[TaskId],
    ) -> Result<BTreeMap<TaskId, bool>> {
        let mut decisions = BTreeMap::new();
        for task in tasks {
            if !decisions.contains_key(task) {
                let allowed = self.is_completion_allowed(task).await?;
                decisions.insert(task.clone(), allowed);
            }
        }
        Ok(decisions)
    }

    /// Whether adding `task -> dependency` would be rejected as a cycle.
    ///
    /// Read-only and uncached; a later [`add_dependency`] re-checks inside
    /// its own transaction.
    ///
    /// [`add_dependency`]: Self::add_dependency
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for blank ids and `Error::TaskNotFound`
    /// for unknown tasks.
    pub async fn would_create_cycle(&self, task: &TaskId, dependency: &TaskId) -> Result<bool> {
        validate_id(task)?;
        validate_id(dependency)?;
        self.ensure_exists(task).await?;
        self.ensure_exists(dependency).await?;
        self.guard
            .would_create_cycle(self.reader(), task, dependency)
            .await
    }

    /// Hook: the status of `task` changed.
    ///
    /// Drops cached results for `task` and for every task depending on it,
    /// since their completion decisions and hierarchy views may change.
    pub async fn on_status_changed(&self, task: &TaskId) -> Result<()> {
        let mut affected = BTreeSet::from([task.clone()]);
        affected.extend(self.engine.descendants(self.reader(), task).await?);

        tracing::debug!(task = %task, affected = affected.len(), "Status change invalidation");
        self.invalidate(&affected).await
    }

    /// Hook: `task` is being deleted, or has just been deleted.
    ///
    /// Drops cached results for the task, its dependents and its
    /// dependencies. The affected set combines any transitive lists still
    /// cached for the task with a live traversal when the task still exists.
    /// Call it before deleting to get a precise set. Called afterwards, the
    /// cached lists only suffice when both directions are cached; otherwise
    /// the whole cache is flushed.
    pub async fn on_task_deleted(&self, task: &TaskId) -> Result<()> {
        let mut affected = BTreeSet::from([task.clone()]);
        let mut cached_directions = 0;

        for namespace in [CacheNamespace::Dependents, CacheNamespace::Dependencies] {
            if let Some(ids) = self.cache.peek::<Vec<TaskId>>(namespace, task).await? {
                affected.extend(ids);
                cached_directions += 1;
            }
        }

        let reader = self.reader();
        let known = if reader.task_exists(task).await? {
            affected.extend(self.engine.descendants(reader, task).await?);
            affected.extend(self.engine.ancestors(reader, task).await?);
            true
        } else {
            cached_directions == 2
        };

        if !known {
            tracing::info!(
                task = %task,
                "Deleted task has no complete cached neighborhood, flushing the cache"
            );
            return self.cache.flush_all().await;
        }

        tracing::debug!(task = %task, affected = affected.len(), "Task deletion invalidation");
        self.invalidate(&affected).await
    }

    /// Drop every cached result.
    pub async fn flush_cache(&self) -> Result<()> {
        tracing::info!("Flushing dependency cache");
        self.cache.flush_all().await
    }

    /// Aggregate statistics about the stored edges.
    pub async fn stats(&self) -> Result<DependencyStats> {
        self.store.stats().await
    }

    fn reader(&self) -> &dyn EdgeReader {
        self.store.as_ref()
    }

    async fn ensure_exists(&self, task: &TaskId) -> Result<()> {
        if self.store.task_exists(task).await? {
            Ok(())
        } else {
            Err(Error::TaskNotFound(task.clone()))
        }
    }

    async fn invalidate(&self, affected: &BTreeSet<TaskId>) -> Result<()> {
        for task in affected {
            self.cache.invalidate_all(task).await?;
        }
        Ok(())
    }
}

fn validate_id(id: &TaskId) -> Result<()> {
    if id.is_blank() {
        return Err(Error::Validation("task id cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_pair(task: &TaskId, dependency: &TaskId) -> Result<()> {
    validate_id(task)?;
    validate_id(dependency)?;
    if task == dependency {
        return Err(Error::Validation(format!(
            "task {task} cannot depend on itself"
        )));
    }
    Ok(())
}

/// Roll back after `cause`, returning `cause`. A failed rollback is logged;
/// dropping the transaction retries it.
async fn rollback(tx: Box<dyn GraphTransaction>, cause: Error) -> Error {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, cause = %cause, "Rollback failed");
    }
    cause
}
