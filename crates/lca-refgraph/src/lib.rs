//! LCA Reference Graph
//!
//! Reference-integrity resolution and review gating for LCA datasets:
//! - Walks the transitive closure of references below a root dataset
//! - Fetches each distinct identity at most once per resolution
//! - Classifies every reachable record by lifecycle state
//! - Flags references whose id has a newer released or under-review version
//! - Collects problem references together with their path from the root
//!
//! # Example
//!
//! ```rust,ignore
//! use lca_refgraph::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<MemoryRefStore>, root: RefPointer) -> Result<(), ResolveError> {
//! let gate = ReviewGate::new(GraphResolver::new(store));
//! let report = gate.evaluate(root, CheckMode::Review).await?;
//!
//! for problem in &report.problems {
//!     println!("{} {:?}", problem.pointer, problem.reasons);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod buckets;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod problems;
pub mod queue;
pub mod resolver;
pub mod store;
pub mod tree;

// Re-exports for convenience
pub use buckets::{Bucket, BucketSnapshot, ClassificationBuckets};
pub use cache::{CacheOutcome, RefCache};
pub use config::ResolverConfig;
pub use error::{QueueError, ResolveError, StoreError};
pub use gate::{GateReport, ReviewGate};
pub use problems::{
    find_problem_nodes, problem_kinds, CheckMode, ProblemKind, ProblemNode, ProblemSummary,
};
pub use queue::{BoundedTaskQueue, TaskHandle};
pub use resolver::{GraphResolver, Resolution, TraversalStats, VersionFindings};
pub use store::{LinkedModel, MemoryRefStore, RefStore};
pub use tree::{ReferenceTree, ReferenceTreeNode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for resolving and gating datasets
    pub use crate::{
        find_problem_nodes, BoundedTaskQueue, Bucket, CheckMode, ClassificationBuckets, GateReport,
        GraphResolver, MemoryRefStore, ProblemKind, RefStore, ReferenceTree, ResolveError,
        ResolverConfig, ReviewGate, StoreError,
    };
    pub use lca_dataset::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
