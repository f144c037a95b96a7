//! taskdeps - a task dependency graph engine.
//!
//! Tasks record "must complete before" edges. The engine rejects edges that
//! would close a cycle, answers transitive dependents/dependencies and
//! hierarchy queries, gates task completion on direct dependencies, and
//! keeps a TTL cache of query results coherent across mutations.
//!
//! The entry point is [`DependencyGraphService`]. Storage is pluggable via
//! [`storage::GraphStore`]; an in-memory and a SQLite backend are provided.
//! Traversal uses recursive SQL when the store supports it and an iterative
//! breadth-first walk otherwise.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskdeps::cache::MemoryCache;
//! use taskdeps::config::GraphConfig;
//! use taskdeps::domain::TaskStatus;
//! use taskdeps::storage::SqliteGraphStore;
//! use taskdeps::DependencyGraphService;
//!
//! # async fn demo() -> taskdeps::Result<()> {
//! let store = SqliteGraphStore::open_in_memory()?;
//! store.upsert_task(&"build".into(), None, TaskStatus::Pending).await?;
//! store.upsert_task(&"deploy".into(), None, TaskStatus::Pending).await?;
//!
//! let service = DependencyGraphService::new(
//!     Arc::new(store.clone()),
//!     Arc::new(MemoryCache::new()),
//!     &GraphConfig::default(),
//! )
//! .await?;
//!
//! service.add_dependency(&"deploy".into(), &"build".into()).await?;
//! assert!(!service.is_completion_allowed(&"deploy".into()).await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod service;
pub mod storage;

// CLI support (needed by binary)
pub mod app;
pub mod cli;
pub mod commands;
pub mod output;

pub use error::{Error, ErrorKind, Result};
pub use service::DependencyGraphService;
