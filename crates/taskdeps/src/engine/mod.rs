//! The dependency graph engine.
//!
//! - [`capability`]: probes the store once and picks a traversal strategy
//! - [`traversal`]: transitive dependents/dependencies, hierarchy, reachability
//! - [`cycle`]: rejects edges that would close a cycle
//! - [`completion`]: direct-dependency completion gate
//!
//! Nothing here holds a store handle. Every operation takes the
//! [`EdgeReader`](crate::storage::EdgeReader) to run against, which is either
//! the store itself or an open write transaction.

pub mod capability;
pub mod completion;
pub mod cycle;
pub mod traversal;

pub use capability::{Capability, CapabilityProbe, StrategyPreference};
pub use completion::CompletionGate;
pub use cycle::CycleGuard;
pub use traversal::{IterativeStrategy, RecursiveQueryStrategy, TraversalEngine, TraversalStrategy};
