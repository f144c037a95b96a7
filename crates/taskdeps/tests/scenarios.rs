//! End-to-end behavior of the dependency graph service.
//!
//! Every test runs against the in-memory store and against SQLite with both
//! traversal strategies.

use rstest::rstest;
use std::sync::Arc;
use taskdeps::cache::MemoryCache;
use taskdeps::config::GraphConfig;
use taskdeps::domain::{TaskId, TaskStatus};
use taskdeps::engine::Capability;
use taskdeps::storage::InMemoryGraphStore;
use taskdeps::{DependencyGraphService, Error, ErrorKind};

mod common;
use common::{fixture, ids, Backend, CountingStore};

// ============================================================================
// Cycle Prevention
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_closing_a_three_cycle_is_rejected(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A", "B", "C"]).await;

    fx.service
        .add_dependency(&"B".into(), &"A".into())
        .await
        .unwrap();
    fx.service
        .add_dependency(&"C".into(), &"B".into())
        .await
        .unwrap();

    let err = fx
        .service
        .add_dependency(&"A".into(), &"C".into())
        .await
        .unwrap_err();

    match err {
        Error::CircularDependency {
            task,
            dependency,
            path,
        } => {
            assert_eq!(task, TaskId::new("A"));
            assert_eq!(dependency, TaskId::new("C"));
            assert_eq!(path, ids(&["A", "C", "B", "A"]));
        }
        other => panic!("Expected CircularDependency, got {other:?}"),
    }
    assert_eq!(fx.tasks.edge_count().await, 2);
}

#[rstest]
#[tokio::test]
async fn test_two_cycle_is_rejected(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A", "B"]).await;
    fx.service
        .add_dependency(&"A".into(), &"B".into())
        .await
        .unwrap();

    let err = fx
        .service
        .add_dependency(&"B".into(), &"A".into())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
}

#[rstest]
#[tokio::test]
async fn test_diamond_is_not_a_cycle(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["top", "left", "right", "base"]).await;
    for (t, d) in [
        ("top", "left"),
        ("top", "right"),
        ("left", "base"),
        ("right", "base"),
    ] {
        fx.service.add_dependency(&t.into(), &d.into()).await.unwrap();
    }

    assert_eq!(
        fx.service.dependencies(&"top".into()).await.unwrap(),
        ids(&["left", "right", "base"])
    );
    assert_eq!(
        fx.service.dependents(&"base".into()).await.unwrap(),
        ids(&["left", "right", "top"])
    );
}

// ============================================================================
// Completion Gate
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_completion_follows_status_changes(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A", "B", "D"]).await;
    fx.tasks.set_status("A", TaskStatus::Completed).await;
    fx.service
        .add_dependency(&"D".into(), &"A".into())
        .await
        .unwrap();
    fx.service
        .add_dependency(&"D".into(), &"B".into())
        .await
        .unwrap();

    assert!(!fx.service.is_completion_allowed(&"D".into()).await.unwrap());

    fx.tasks.set_status("B", TaskStatus::Completed).await;
    fx.service.on_status_changed(&"B".into()).await.unwrap();

    assert!(fx.service.is_completion_allowed(&"D".into()).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_task_without_dependencies_can_complete(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["solo"]).await;
    assert!(fx
        .service
        .is_completion_allowed(&"solo".into())
        .await
        .unwrap());
}

#[rstest]
#[tokio::test]
async fn test_cancelled_dependency_blocks_completion(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A", "B"]).await;
    fx.tasks.set_status("A", TaskStatus::Cancelled).await;
    fx.service
        .add_dependency(&"B".into(), &"A".into())
        .await
        .unwrap();

    assert!(!fx.service.is_completion_allowed(&"B".into()).await.unwrap());
}

// ============================================================================
// Transitive Queries
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_dependents_of_chain_root(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A", "B", "C", "D"]).await;
    for (t, d) in [("B", "A"), ("C", "B"), ("D", "C")] {
        fx.service.add_dependency(&t.into(), &d.into()).await.unwrap();
    }

    assert_eq!(
        fx.service.dependents(&"A".into()).await.unwrap(),
        ids(&["B", "C", "D"])
    );
    assert_eq!(
        fx.service.dependencies(&"D".into()).await.unwrap(),
        ids(&["C", "B", "A"])
    );
    assert!(fx.service.dependents(&"D".into()).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_hierarchy_levels_and_paths(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["app", "api", "db", "ui"]).await;
    for (t, d) in [("app", "api"), ("app", "ui"), ("api", "db"), ("ui", "db")] {
        fx.service.add_dependency(&t.into(), &d.into()).await.unwrap();
    }

    let nodes = fx.service.hierarchy(&"app".into()).await.unwrap();
    let summary: Vec<(&str, usize, Vec<TaskId>)> = nodes
        .iter()
        .map(|n| (n.id.as_str(), n.level, n.path.clone()))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("app", 0, ids(&["app"])),
            ("api", 1, ids(&["app", "api"])),
            ("ui", 1, ids(&["app", "ui"])),
            ("db", 2, ids(&["app", "api", "db"])),
        ]
    );
}

// ============================================================================
// Validation and Duplicates
// ============================================================================

#[tokio::test]
async fn test_self_dependency_never_reaches_the_store() {
    let inner = InMemoryGraphStore::new();
    inner.add_task("A", TaskStatus::Pending).await.unwrap();
    let counting = CountingStore::new(Arc::new(inner.clone()));
    let counter = counting.counter();

    let service = DependencyGraphService::with_capability(
        Arc::new(counting),
        Arc::new(MemoryCache::new()),
        &GraphConfig::default(),
        Capability::IterativeOnly,
    );

    let err = service
        .add_dependency(&"A".into(), &"A".into())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(inner.edge_count().await, 0);
}

#[tokio::test]
async fn test_blank_ids_never_reach_the_store() {
    let counting = CountingStore::new(Arc::new(InMemoryGraphStore::new()));
    let counter = counting.counter();
    let service = DependencyGraphService::with_capability(
        Arc::new(counting),
        Arc::new(MemoryCache::new()),
        &GraphConfig::default(),
        Capability::IterativeOnly,
    );

    for (t, d) in [("", "b"), ("a", "  "), (" ", "")] {
        let err = service
            .add_dependency(&t.into(), &d.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .remove_dependency(&t.into(), &d.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_duplicate_edge_is_rejected(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["T", "D"]).await;
    fx.service
        .add_dependency(&"T".into(), &"D".into())
        .await
        .unwrap();

    let err = fx
        .service
        .add_dependency(&"T".into(), &"D".into())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateDependency { .. }));
    assert_eq!(fx.tasks.edge_count().await, 1);
}

#[rstest]
#[tokio::test]
async fn test_unknown_tasks_are_not_found(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A"]).await;

    for err in [
        fx.service
            .add_dependency(&"A".into(), &"ghost".into())
            .await
            .unwrap_err(),
        fx.service
            .add_dependency(&"ghost".into(), &"A".into())
            .await
            .unwrap_err(),
        fx.service.dependents(&"ghost".into()).await.unwrap_err(),
        fx.service.hierarchy(&"ghost".into()).await.unwrap_err(),
        fx.service
            .is_completion_allowed(&"ghost".into())
            .await
            .unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert_eq!(fx.tasks.edge_count().await, 0);
}

// ============================================================================
// Remove and Re-add
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_remove_then_add_restores_queries(
    #[values(Backend::InMemory, Backend::SqliteRecursive, Backend::SqliteIterative)]
    backend: Backend,
) {
    let fx = fixture(backend, &["A", "B", "C"]).await;
    fx.service
        .add_dependency(&"B".into(), &"A".into())
        .await
        .unwrap();
    fx.service
        .add_dependency(&"C".into(), &"B".into())
        .await
        .unwrap();
    let before = fx.service.dependents(&"A".into()).await.unwrap();

    fx.service
        .remove_dependency(&"B".into(), &"A".into())
        .await
        .unwrap();
    assert!(fx.service.dependents(&"A".into()).await.unwrap().is_empty());

    // The reverse edge is legal once the original is gone.
    assert!(!fx
        .service
        .would_create_cycle(&"A".into(), &"B".into())
        .await
        .unwrap());

    fx.service
        .add_dependency(&"B".into(), &"A".into())
        .await
        .unwrap();
    assert_eq!(fx.service.dependents(&"A".into()).await.unwrap(), before);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite_recursive(Backend::SqliteRecursive)]
#[case::sqlite_iterative(Backend::SqliteIterative)]
#[tokio::test]
async fn test_stats_after_mutations(#[case] backend: Backend) {
    let fx = fixture(backend, &["a", "b", "c"]).await;
    for (t, d) in [("c", "a"), ("c", "b"), ("b", "a")] {
        fx.service.add_dependency(&t.into(), &d.into()).await.unwrap();
    }

    let stats = fx.service.stats().await.unwrap();
    assert_eq!(stats.tasks_with_dependencies, 2);
    assert_eq!(stats.total_dependencies, 3);
    assert!((stats.avg_dependencies_per_task - 1.5).abs() < f64::EPSILON);
    assert_eq!(stats.max_dependencies_per_task, 2);
    assert_eq!(stats.potential_circular_dependencies, 0);
}
