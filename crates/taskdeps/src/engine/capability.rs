//! Store capability detection and strategy selection.

use super::traversal::{IterativeStrategy, RecursiveQueryStrategy, TraversalStrategy};
use crate::storage::EdgeReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// What the store can do for traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The store answers a whole traversal in one recursive query
    RecursiveQuerySupported,
    /// Traversal must be expanded level by level in the application
    IterativeOnly,
}

impl Capability {
    /// The traversal strategy backing this capability.
    pub fn strategy(self) -> Arc<dyn TraversalStrategy> {
        match self {
            Self::RecursiveQuerySupported => Arc::new(RecursiveQueryStrategy),
            Self::IterativeOnly => Arc::new(IterativeStrategy),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecursiveQuerySupported => write!(f, "recursive-query"),
            Self::IterativeOnly => write!(f, "iterative"),
        }
    }
}

/// Configured traversal strategy preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    /// Probe the store and use recursive queries when they work
    #[default]
    Auto,
    /// Use recursive queries; downgraded if the probe fails
    Recursive,
    /// Always expand iteratively, without probing
    Iterative,
}

/// One-shot capability detection.
///
/// The first call to [`detect`](Self::detect) runs the probe; later calls
/// return the memoized answer.
#[derive(Debug, Default)]
pub struct CapabilityProbe {
    preference: StrategyPreference,
    detected: OnceCell<Capability>,
}

impl CapabilityProbe {
    /// Create a probe honoring `preference`.
    pub fn new(preference: StrategyPreference) -> Self {
        Self {
            preference,
            detected: OnceCell::new(),
        }
    }

    /// Detect the capability of `reader`, probing at most once.
    ///
    /// Never fails: any probe error resolves to [`Capability::IterativeOnly`].
    pub async fn detect(&self, reader: &dyn EdgeReader) -> Capability {
        *self
            .detected
            .get_or_init(|| self.resolve(reader))
            .await
    }

    async fn resolve(&self, reader: &dyn EdgeReader) -> Capability {
        if self.preference == StrategyPreference::Iterative {
            tracing::debug!("Iterative traversal configured, skipping capability probe");
            return Capability::IterativeOnly;
        }

        match reader.probe_recursive_query().await {
            Ok(()) => {
                tracing::debug!("Store supports recursive queries");
                Capability::RecursiveQuerySupported
            }
            Err(e) if self.preference == StrategyPreference::Recursive => {
                tracing::warn!(
                    error = %e,
                    "Recursive traversal configured but the store cannot run recursive queries; using iterative traversal"
                );
                Capability::IterativeOnly
            }
            Err(e) => {
                tracing::debug!(error = %e, "Recursive probe failed, using iterative traversal");
                Capability::IterativeOnly
            }
        }
    }
}
