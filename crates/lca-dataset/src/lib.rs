//! LCA Dataset Model
//!
//! Identities and records for Life-Cycle-Assessment datasets.
//!
//! # Core Concepts
//!
//! - [`DatasetKind`]: Closed set of dataset kinds, each backed by a storage collection
//! - [`RefPointer`]: `(kind, id, version)` triple identifying one dataset
//! - [`DatasetRecord`]: Fetched record with lifecycle state and opaque payload
//! - [`ReviewStage`]: Lifecycle stage decoded from a record's state code
//! - [`version`]: Dotted numeric version ordering
//! - [`extract`]: Reference discovery inside JSON payloads
//!
//! # Example
//!
//! ```rust
//! use lca_dataset::{extract_references, DatasetKind, ReferenceFields};
//! use serde_json::json;
//!
//! let payload = json!({
//!     "referenceToFlowDataSet": {
//!         "@refObjectId": "6f0a1e0c-58a7-4bd1-9c8a-3b0f5a3c1d20",
//!         "@version": "01.00.000",
//!         "@type": "flow data set"
//!     }
//! });
//!
//! let refs = extract_references(&payload, &ReferenceFields::default());
//! assert_eq!(refs.len(), 1);
//! assert_eq!(refs[0].kind, DatasetKind::Flow);
//! ```

#![warn(unreachable_pub)]

mod error;
pub mod extract;
mod kind;
mod pointer;
mod record;
pub mod version;

// Re-exports
pub use error::DatasetError;
pub use extract::{extract_references, ReferenceFields};
pub use kind::DatasetKind;
pub use pointer::RefPointer;
pub use record::{DatasetRecord, ReviewStage, VersionRecord};
pub use version::{compare_versions, is_stale};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with dataset identities
    pub use crate::{
        compare_versions, extract_references, is_stale, DatasetKind, DatasetRecord, RefPointer,
        ReferenceFields, ReviewStage, VersionRecord,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
