//! Testing utilities for the LCA reference graph workspace
//!
//! Shared graph fixtures, an instrumented store wrapper and tracing setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use lca_dataset::{DatasetKind, DatasetRecord, RefPointer, VersionRecord};
use lca_refgraph::{LinkedModel, MemoryRefStore, RefStore, StoreError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const DRAFT: i32 = 0;
pub const UNDER_REVIEW: i32 = 20;
pub const RELEASED: i32 = 100;
pub const CANDIDATE_RELEASE: i32 = 200;

/// Pointer with a readable numeric id
pub fn pointer(kind: DatasetKind, n: u128, version: &str) -> RefPointer {
    RefPointer::new(kind, Uuid::from_u128(n), version)
}

/// ILCD-style reference object for one pointer
pub fn ref_object(pointer: &RefPointer) -> Value {
    json!({
        "@refObjectId": pointer.id.to_string(),
        "@version": pointer.version,
        "@type": pointer.kind.type_label(),
        "common:shortDescription": { "#text": pointer.to_string() }
    })
}

/// Payload embedding every pointer in `refs`
pub fn ref_payload(refs: &[&RefPointer]) -> Value {
    let exchanges: Vec<Value> = refs.iter().map(|r| ref_object(r)).collect();
    json!({ "dataSet": { "exchanges": { "exchange": exchanges } } })
}

/// Builder for an in-memory reference graph
#[derive(Debug, Default)]
pub struct GraphFixture {
    store: MemoryRefStore,
}

impl GraphFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with explicit state
    #[must_use]
    pub fn record(
        self,
        node: &RefPointer,
        state_code: i32,
        rule_verification: bool,
        refs: &[&RefPointer],
    ) -> Self {
        self.store.insert(
            node.clone(),
            DatasetRecord::new(state_code, rule_verification, ref_payload(refs)),
        );
        self
    }

    /// Compliant draft referencing `refs`
    #[must_use]
    pub fn draft(self, node: &RefPointer, refs: &[&RefPointer]) -> Self {
        self.record(node, DRAFT, true, refs)
    }

    /// Compliant record under review referencing `refs`
    #[must_use]
    pub fn under_review(self, node: &RefPointer, refs: &[&RefPointer]) -> Self {
        self.record(node, UNDER_REVIEW, true, refs)
    }

    /// Compliant released record
    #[must_use]
    pub fn released(self, node: &RefPointer) -> Self {
        self.record(node, RELEASED, true, &[])
    }

    /// Life-cycle model built on `process`; returns the model pointer
    #[must_use]
    pub fn model_for_process(
        self,
        process: &RefPointer,
        state_code: i32,
        refs: &[&RefPointer],
    ) -> (Self, RefPointer) {
        let model = RefPointer::new(
            DatasetKind::LifeCycleModel,
            process.id,
            process.version.clone(),
        );
        (self.record(&model, state_code, true, refs), model)
    }

    pub fn build(self) -> MemoryRefStore {
        self.store
    }

    pub fn build_arc(self) -> Arc<MemoryRefStore> {
        Arc::new(self.store)
    }
}

/// Store wrapper recording every call made through it
#[derive(Debug)]
pub struct RecordingStore<S> {
    inner: S,
    delay: Option<Duration>,
    failing: DashSet<RefPointer>,
    fetches: DashMap<RefPointer, usize>,
    batch_calls: AtomicUsize,
    model_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<S: RefStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            delay: None,
            failing: DashSet::new(),
            fetches: DashMap::new(),
            batch_calls: AtomicUsize::new(0),
            model_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every point lookup
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail point lookups of `pointer` with a backend error
    #[must_use]
    pub fn failing_on(self, pointer: RefPointer) -> Self {
        self.failing.insert(pointer);
        self
    }

    /// Point lookups made for `pointer`
    pub fn fetch_count(&self, pointer: &RefPointer) -> usize {
        self.fetches.get(pointer).map_or(0, |count| *count)
    }

    /// Point lookups made in total
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }

    /// Highest fetch count seen for any single pointer
    pub fn max_fetches_per_pointer(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).max().unwrap_or(0)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::SeqCst)
    }

    /// Most point lookups observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: RefStore> RefStore for RecordingStore<S> {
    async fn fetch_by_identity(&self, pointer: &RefPointer) -> Result<DatasetRecord, StoreError> {
        *self.fetches.entry(pointer.clone()).or_insert(0) += 1;

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = if self.failing.contains(pointer) {
            Err(StoreError::backend(format!("injected failure for {pointer}")))
        } else {
            self.inner.fetch_by_identity(pointer).await
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn fetch_batch_by_ids_and_kind(
        &self,
        kind: DatasetKind,
        ids: &[Uuid],
    ) -> Result<Vec<VersionRecord>, StoreError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_batch_by_ids_and_kind(kind, ids).await
    }

    async fn fetch_life_cycle_model_for_process(
        &self,
        process_id: Uuid,
        version: &str,
    ) -> Result<Option<LinkedModel>, StoreError> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .fetch_life_cycle_model_for_process(process_id, version)
            .await
    }
}

/// Install a test subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
