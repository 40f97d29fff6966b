//! In-memory record store

use super::{LinkedModel, RefStore};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use lca_dataset::{compare_versions, DatasetKind, DatasetRecord, RefPointer, VersionRecord};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// Concurrent in-memory [`RefStore`]
///
/// The authoritative version of an id is its highest stored version. A
/// life-cycle model governs the process sharing its id and version.
#[derive(Debug, Default)]
pub struct MemoryRefStore {
    records: DashMap<RefPointer, DatasetRecord>,
}

impl MemoryRefStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub fn insert(&self, pointer: RefPointer, record: DatasetRecord) -> Option<DatasetRecord> {
        self.records.insert(pointer, record)
    }

    /// Remove a record
    pub fn remove(&self, pointer: &RefPointer) -> Option<DatasetRecord> {
        self.records.remove(pointer).map(|(_, record)| record)
    }

    /// Get a copy of a record
    #[must_use]
    pub fn get(&self, pointer: &RefPointer) -> Option<DatasetRecord> {
        self.records.get(pointer).map(|entry| entry.value().clone())
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(RefPointer, DatasetRecord)> for MemoryRefStore {
    fn from_iter<I: IntoIterator<Item = (RefPointer, DatasetRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RefStore for MemoryRefStore {
    async fn fetch_by_identity(&self, pointer: &RefPointer) -> Result<DatasetRecord, StoreError> {
        self.get(pointer)
            .ok_or_else(|| StoreError::NotFound(pointer.clone()))
    }

    async fn fetch_batch_by_ids_and_kind(
        &self,
        kind: DatasetKind,
        ids: &[Uuid],
    ) -> Result<Vec<VersionRecord>, StoreError> {
        let mut latest: HashMap<Uuid, VersionRecord> = HashMap::with_capacity(ids.len());

        for entry in self.records.iter() {
            let pointer = entry.key();
            if pointer.kind != kind || !ids.contains(&pointer.id) {
                continue;
            }
            let newer = latest.get(&pointer.id).map_or(true, |current| {
                compare_versions(&pointer.version, &current.version) == Ordering::Greater
            });
            if newer {
                let record = entry.value();
                latest.insert(
                    pointer.id,
                    VersionRecord {
                        id: pointer.id,
                        version: pointer.version.clone(),
                        state_code: record.state_code,
                        rule_verification: record.rule_verification,
                    },
                );
            }
        }

        Ok(ids.iter().filter_map(|id| latest.remove(id)).collect())
    }

    async fn fetch_life_cycle_model_for_process(
        &self,
        process_id: Uuid,
        version: &str,
    ) -> Result<Option<LinkedModel>, StoreError> {
        let pointer = RefPointer::new(DatasetKind::LifeCycleModel, process_id, version);
        Ok(self
            .get(&pointer)
            .map(|record| LinkedModel { pointer, record }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn flow(n: u128, version: &str) -> RefPointer {
        RefPointer::new(DatasetKind::Flow, Uuid::from_u128(n), version)
    }

    fn record(state_code: i32) -> DatasetRecord {
        DatasetRecord::new(state_code, true, Value::Null)
    }

    #[tokio::test]
    async fn point_lookup_and_not_found() {
        let store = MemoryRefStore::new();
        store.insert(flow(1, "1.0"), record(0));

        assert_eq!(store.fetch_by_identity(&flow(1, "1.0")).await.unwrap().state_code, 0);
        let err = store.fetch_by_identity(&flow(1, "2.0")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn batch_returns_highest_version_per_id() {
        let store: MemoryRefStore = [
            (flow(1, "1.2.0"), record(100)),
            (flow(1, "1.10.0"), record(30)),
            (flow(2, "01.00.000"), record(100)),
            (flow(3, "9.0"), record(0)),
        ]
        .into_iter()
        .collect();

        let ids = [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(4)];
        let batch = store
            .fetch_batch_by_ids_and_kind(DatasetKind::Flow, &ids)
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, Uuid::from_u128(1));
        assert_eq!(batch[0].version, "1.10.0");
        assert_eq!(batch[0].state_code, 30);
        assert_eq!(batch[1].version, "01.00.000");
    }

    #[tokio::test]
    async fn batch_filters_by_kind() {
        let store = MemoryRefStore::new();
        store.insert(flow(1, "1.0"), record(100));

        let batch = store
            .fetch_batch_by_ids_and_kind(DatasetKind::Process, &[Uuid::from_u128(1)])
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn model_shares_process_id_and_version() {
        let store = MemoryRefStore::new();
        let model = RefPointer::new(DatasetKind::LifeCycleModel, Uuid::from_u128(5), "1.0");
        store.insert(model.clone(), record(0));

        let found = store
            .fetch_life_cycle_model_for_process(Uuid::from_u128(5), "1.0")
            .await
            .unwrap();
        assert_eq!(found.map(|m| m.pointer), Some(model));

        let missing = store
            .fetch_life_cycle_model_for_process(Uuid::from_u128(5), "2.0")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn removed_record_is_not_found() {
        let store = MemoryRefStore::new();
        store.insert(flow(1, "1.0"), record(0));

        assert_eq!(store.remove(&flow(1, "1.0")).map(|r| r.state_code), Some(0));
        assert!(store.remove(&flow(1, "1.0")).is_none());

        let err = store.fetch_by_identity(&flow(1, "1.0")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
