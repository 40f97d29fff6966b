//! Record store seam
//!
//! The resolver never talks to a database directly. Everything it needs from
//! the backend goes through [`RefStore`]:
//! - point lookups by `(kind, id, version)`
//! - batch lookups of the authoritative version per id, for version checks
//! - the life-cycle model governing a process

mod memory;

pub use memory::MemoryRefStore;

use crate::error::StoreError;
use async_trait::async_trait;
use lca_dataset::{DatasetKind, DatasetRecord, RefPointer, VersionRecord};
use std::sync::Arc;
use uuid::Uuid;

/// Life-cycle model found for a process
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedModel {
    /// Identity of the model
    pub pointer: RefPointer,
    /// Model record
    pub record: DatasetRecord,
}

/// Fetch-by-identity access to dataset records
///
/// Implementations report a missing record as `StoreError::NotFound`; every
/// other error aborts the resolution that triggered it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefStore: Send + Sync {
    /// Point lookup of one record
    async fn fetch_by_identity(&self, pointer: &RefPointer) -> Result<DatasetRecord, StoreError>;

    /// Authoritative (typically latest) version of each id of `kind`
    ///
    /// Ids with no record are simply absent from the result.
    async fn fetch_batch_by_ids_and_kind(
        &self,
        kind: DatasetKind,
        ids: &[Uuid],
    ) -> Result<Vec<VersionRecord>, StoreError>;

    /// Life-cycle model whose quantitative reference is the given process
    async fn fetch_life_cycle_model_for_process(
        &self,
        process_id: Uuid,
        version: &str,
    ) -> Result<Option<LinkedModel>, StoreError>;
}

#[async_trait]
impl<S: RefStore + ?Sized> RefStore for Arc<S> {
    async fn fetch_by_identity(&self, pointer: &RefPointer) -> Result<DatasetRecord, StoreError> {
        (**self).fetch_by_identity(pointer).await
    }

    async fn fetch_batch_by_ids_and_kind(
        &self,
        kind: DatasetKind,
        ids: &[Uuid],
    ) -> Result<Vec<VersionRecord>, StoreError> {
        (**self).fetch_batch_by_ids_and_kind(kind, ids).await
    }

    async fn fetch_life_cycle_model_for_process(
        &self,
        process_id: Uuid,
        version: &str,
    ) -> Result<Option<LinkedModel>, StoreError> {
        (**self)
            .fetch_life_cycle_model_for_process(process_id, version)
            .await
    }
}
