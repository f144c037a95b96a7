//! Process-local TTL cache.

use super::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Entry count at which a `put` first sweeps expired entries.
const PRUNE_THRESHOLD: usize = 256;

#[derive(Debug)]
struct Entry {
    value: String,
    /// `None` when the TTL is too large to represent on the clock
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug)]
struct Entries {
    map: HashMap<String, Entry>,
    prune_at: usize,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }
}

impl Entries {
    /// Drop expired entries once the map outgrows the sweep threshold. The
    /// next threshold doubles the surviving count, so sweeps stay amortized.
    fn prune_if_large(&mut self, now: Instant) {
        if self.map.len() < self.prune_at {
            return;
        }
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live(now));
        self.prune_at = (self.map.len() * 2).max(PRUNE_THRESHOLD);
        tracing::debug!(
            removed = before - self.map.len(),
            remaining = self.map.len(),
            "Pruned expired cache entries"
        );
    }
}

/// In-memory [`CacheStore`] with per-entry expiry.
///
/// Expired entries are dropped when read, and swept in bulk on insert once
/// the cache grows past a threshold. Uses tokio's clock, so tests can pause
/// and advance time.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.map.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.map.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: now.checked_add(ttl),
        };
        let mut entries = self.entries.lock().await;
        entries.prune_if_large(now);
        entries.map.insert(key.to_string(), entry);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        self.entries.lock().await.map.remove(key);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.map.clear();
        entries.prune_at = PRUNE_THRESHOLD;
        Ok(())
    }
}
