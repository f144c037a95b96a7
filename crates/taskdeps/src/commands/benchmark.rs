//! Implementation of the `benchmark` command.
//!
//! Runs the transitive queries for one task under each traversal strategy
//! against the same SQLite store, timing them and checking that both
//! strategies return identical results.

use crate::cache::MemoryCache;
use crate::config::GraphConfig;
use crate::domain::{HierarchyNode, TaskId};
use crate::engine::Capability;
use crate::error::{Error, Result};
use crate::service::DependencyGraphService;
use crate::storage::{EdgeReader, SqliteGraphStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Timings for one strategy, averaged over all iterations.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyTiming {
    /// Capability the service was built with
    pub capability: Capability,
    /// Mean time for `dependents`, in milliseconds
    pub dependents_ms: f64,
    /// Mean time for `dependencies`, in milliseconds
    pub dependencies_ms: f64,
    /// Mean time for `hierarchy`, in milliseconds
    pub hierarchy_ms: f64,
}

/// Result of a benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// Task the queries were rooted at
    pub task: TaskId,
    /// Cold-cache runs per strategy
    pub iterations: u32,
    /// Number of transitive dependents
    pub dependents: usize,
    /// Number of transitive dependencies
    pub dependencies: usize,
    /// Number of hierarchy nodes, the task included
    pub hierarchy_nodes: usize,
    /// One entry per strategy that could run
    pub timings: Vec<StrategyTiming>,
    /// Whether every strategy returned identical results
    pub consistent: bool,
}

#[derive(Debug, PartialEq)]
struct QueryResults {
    dependents: Vec<TaskId>,
    dependencies: Vec<TaskId>,
    hierarchy: Vec<HierarchyNode>,
}

/// Benchmark both traversal strategies for `task`.
///
/// Each iteration starts from an empty cache, so every query reaches the
/// store. The recursive strategy is skipped (with a warning) if the store
/// fails the recursive query probe.
///
/// # Errors
///
/// Returns `Error::Validation` if `iterations` is zero, and
/// `Error::TaskNotFound` if the task doesn't exist.
pub async fn run(
    store: &SqliteGraphStore,
    config: &GraphConfig,
    task: &TaskId,
    iterations: u32,
) -> Result<BenchmarkReport> {
    if iterations == 0 {
        return Err(Error::Validation(
            "iterations must be at least 1".to_string(),
        ));
    }

    let mut timings = Vec::new();
    let mut results: Vec<QueryResults> = Vec::new();

    for capability in [Capability::RecursiveQuerySupported, Capability::IterativeOnly] {
        if capability == Capability::RecursiveQuerySupported {
            if let Err(e) = store.probe_recursive_query().await {
                tracing::warn!(error = %e, "Skipping recursive strategy, probe failed");
                continue;
            }
        }

        let service = DependencyGraphService::with_capability(
            Arc::new(store.clone()),
            Arc::new(MemoryCache::new()),
            config,
            capability,
        );

        let (timing, last) = measure(&service, capability, task, iterations).await?;
        tracing::debug!(
            capability = %capability,
            dependents_ms = timing.dependents_ms,
            "Strategy benchmarked"
        );
        timings.push(timing);
        results.push(last);
    }

    let consistent = results.windows(2).all(|pair| pair[0] == pair[1]);
    if !consistent {
        tracing::warn!(task = %task, "Traversal strategies disagree");
    }

    let (dependents, dependencies, hierarchy_nodes) = results
        .first()
        .map(|r| (r.dependents.len(), r.dependencies.len(), r.hierarchy.len()))
        .unwrap_or_default();

    Ok(BenchmarkReport {
        task: task.clone(),
        iterations,
        dependents,
        dependencies,
        hierarchy_nodes,
        timings,
        consistent,
    })
}

async fn measure(
    service: &DependencyGraphService,
    capability: Capability,
    task: &TaskId,
    iterations: u32,
) -> Result<(StrategyTiming, QueryResults)> {
    let mut totals = [Duration::ZERO; 3];
    let mut last = None;

    for _ in 0..iterations {
        service.flush_cache().await?;

        let start = Instant::now();
        let dependents = service.dependents(task).await?;
        totals[0] += start.elapsed();

        let start = Instant::now();
        let dependencies = service.dependencies(task).await?;
        totals[1] += start.elapsed();

        let start = Instant::now();
        let hierarchy = service.hierarchy(task).await?;
        totals[2] += start.elapsed();

        last = Some(QueryResults {
            dependents,
            dependencies,
            hierarchy,
        });
    }

    let mean_ms = |total: Duration| total.as_secs_f64() * 1000.0 / f64::from(iterations);
    let timing = StrategyTiming {
        capability,
        dependents_ms: mean_ms(totals[0]),
        dependencies_ms: mean_ms(totals[1]),
        hierarchy_ms: mean_ms(totals[2]),
    };

    let last = last.ok_or_else(|| Error::Validation("iterations must be at least 1".to_string()))?;
    Ok((timing, last))
}
