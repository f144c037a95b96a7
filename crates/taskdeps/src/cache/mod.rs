//! Result cache for traversal and completion queries.
//!
//! The cache is never authoritative: every entry can be rebuilt from the
//! store. [`CacheLayer`] renders keys as `{prefix}:{namespace}:{task}`,
//! stores values as JSON strings, and never stores a failed computation.
//!
//! The backing [`CacheStore`] is injected, so a shared cache (or a test
//! double) can stand in for the process-local [`MemoryCache`].

mod memory;

pub use memory::MemoryCache;

use crate::domain::TaskId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Key/value store with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` for at most `ttl`.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Remove `key`. Missing keys are not an error.
    async fn forget(&self, key: &str) -> Result<()>;

    /// Remove every entry.
    async fn flush(&self) -> Result<()>;
}

/// The kinds of per-task results that get cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Transitive dependents
    Dependents,
    /// Transitive dependencies
    Dependencies,
    /// Completion gate decision
    Completion,
    /// Hierarchy view
    Hierarchy,
}

impl CacheNamespace {
    /// Every namespace, in key order.
    pub const ALL: [Self; 4] = [
        Self::Dependents,
        Self::Dependencies,
        Self::Completion,
        Self::Hierarchy,
    ];

    /// The namespace segment of a cache key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dependents => "dependents",
            Self::Dependencies => "dependencies",
            Self::Completion => "completion",
            Self::Hierarchy => "hierarchy",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed memoization over a [`CacheStore`].
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    prefix: String,
}

impl fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLayer")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl CacheLayer {
    /// Wrap `store`, namespacing every key under `prefix`.
    pub fn new(store: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Render the key for `(namespace, task)`.
    pub fn key(&self, namespace: CacheNamespace, task: &TaskId) -> String {
        format!("{}:{}:{}", self.prefix, namespace, task)
    }

    /// Return the cached value, or compute, store and return it.
    ///
    /// An error from `producer` is returned as-is and nothing is stored. A
    /// cached value that no longer decodes is logged and recomputed.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        namespace: CacheNamespace,
        task: &TaskId,
        ttl: Duration,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = self.key(namespace, task);
        if let Some(value) = self.lookup(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        tracing::debug!(key = %key, "Cache miss");
        let value = producer().await?;
        let encoded = serde_json::to_string(&value)
            .map_err(|e| Error::Cache(format!("failed to encode {key}: {e}")))?;
        self.store.put(&key, encoded, ttl).await?;
        Ok(value)
    }

    /// Read a cached value without computing anything.
    pub async fn peek<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        task: &TaskId,
    ) -> Result<Option<T>> {
        self.lookup(&self.key(namespace, task)).await
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Drop one cached result.
    pub async fn invalidate(&self, namespace: CacheNamespace, task: &TaskId) -> Result<()> {
        self.store.forget(&self.key(namespace, task)).await
    }

    /// Drop every cached result for `task`.
    pub async fn invalidate_all(&self, task: &TaskId) -> Result<()> {
        for namespace in CacheNamespace::ALL {
            self.invalidate(namespace, task).await?;
        }
        Ok(())
    }

    /// Drop every cached result for every task.
    pub async fn flush_all(&self) -> Result<()> {
        self.store.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn layer() -> (CacheLayer, MemoryCache) {
        let store = MemoryCache::new();
        (CacheLayer::new(Arc::new(store.clone()), "test"), store)
    }

    #[test]
    fn test_key_format() {
        let (layer, _) = layer();
        assert_eq!(
            layer.key(CacheNamespace::Completion, &TaskId::new("t1")),
            "test:completion:t1"
        );
    }

    #[tokio::test]
    async fn test_producer_runs_once_until_invalidated() {
        let (layer, _) = layer();
        let calls = AtomicUsize::new(0);
        let task = TaskId::new("t");

        for _ in 0..3 {
            let value: Vec<TaskId> = layer
                .get_or_compute(CacheNamespace::Dependents, &task, TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![TaskId::new("x")])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![TaskId::new("x")]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        layer.invalidate_all(&task).await.unwrap();
        let _: Vec<TaskId> = layer
            .get_or_compute(CacheNamespace::Dependents, &task, TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_producer_error_is_not_cached() {
        let (layer, store) = layer();
        let task = TaskId::new("t");

        let result: Result<bool> = layer
            .get_or_compute(CacheNamespace::Completion, &task, TTL, || async {
                Err(Error::Storage("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
        assert_eq!(
            layer
                .peek::<bool>(CacheNamespace::Completion, &task)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_recomputed() {
        let (layer, store) = layer();
        let task = TaskId::new("t");
        store
            .put("test:completion:t", "not json".to_string(), TTL)
            .await
            .unwrap();

        let value: bool = layer
            .get_or_compute(CacheNamespace::Completion, &task, TTL, || async { Ok(true) })
            .await
            .unwrap();
        assert!(value);
        assert_eq!(
            store.get("test:completion:t").await.unwrap().as_deref(),
            Some("true")
        );
    }
}
