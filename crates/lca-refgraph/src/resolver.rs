//! Reference graph resolver
//!
//! Walks the transitive closure of references reachable from one root
//! dataset, fetching each distinct `(kind, id, version)` at most once.
//!
//! # Traversal
//!
//! Each level of siblings gets its own [`BoundedTaskQueue`] of width
//! `level_concurrency`. Levels nest (a task recurses into its children
//! while its own level is still running), so the total number of in-flight
//! fetches is the sum over active levels, not a global cap.
//!
//! A single traversal-wide set of claimed identities is the only thing that
//! stops duplicate fetches and reference cycles. Claiming happens before a
//! task is submitted, so two tasks can never race to fetch the same identity.
//!
//! # Classification
//!
//! | Record         | Node flag      | Bucket(s)                        | Recurse |
//! |----------------|----------------|----------------------------------|---------|
//! | missing        | `non_existent` | nonexistent (except models)      | no      |
//! | `>= 100`       |                | none                             | no      |
//! | `20..100`      |                | under review (+ rule-violating)  | no      |
//! | `< 20`         |                | unreviewed (+ rule-violating)    | yes     |
//!
//! Found records carry their own `rule_verification` on the node.
//!
//! # Failure
//!
//! The first unexpected store failure marks the traversal as aborted. No
//! task starts a fetch or submits another level after that, so in-flight
//! fetches finish and the error is returned without walking the rest of
//! the graph.
//!
//! Every process additionally pulls in the life-cycle model built on it,
//! classified with the same rules and attached next to the process.

use crate::buckets::{Bucket, ClassificationBuckets};
use crate::cache::RefCache;
use crate::config::ResolverConfig;
use crate::error::{ResolveError, StoreError};
use crate::queue::BoundedTaskQueue;
use crate::store::{LinkedModel, RefStore};
use crate::tree::{NodeId, ReferenceTree, ReferenceTreeNode, TreeArena};
use dashmap::DashSet;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use lca_dataset::{
    compare_versions, extract_references, is_stale, DatasetKind, DatasetRecord, RefPointer,
    ReviewStage, VersionRecord,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one root resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Tree of visited references
    pub tree: ReferenceTree,
    /// Every identity claimed during traversal
    pub identities: BTreeSet<RefPointer>,
    /// Traversal counters
    pub stats: TraversalStats,
}

/// Traversal counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalStats {
    /// Point lookups sent to the store
    pub fetches: usize,
    /// Identities with no record
    pub missing: usize,
    /// Life-cycle model lookups for processes
    pub model_lookups: usize,
    /// Nodes in the resulting tree
    pub nodes: usize,
}

/// Flags set by [`GraphResolver::check_versions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFindings {
    /// Nodes marked as having a version under review
    pub under_review: usize,
    /// Nodes marked as stale against the released version
    pub stale: usize,
}

/// Resolves the reference graph of a dataset against a [`RefStore`]
#[derive(Debug)]
pub struct GraphResolver<S: ?Sized> {
    store: Arc<S>,
    config: ResolverConfig,
}

impl<S> GraphResolver<S>
where
    S: RefStore + ?Sized + 'static,
{
    /// Create resolver with default configuration
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: ResolverConfig::default(),
        }
    }

    /// Create resolver with custom configuration
    ///
    /// # Errors
    /// Returns `ResolveError::Config` if the configuration is invalid
    pub fn with_config(store: Arc<S>, config: ResolverConfig) -> Result<Self, ResolveError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Resolve the reference graph below `root`
    ///
    /// Classified references are recorded into `buckets`. Cache and claimed
    /// identities live only for this call.
    ///
    /// # Errors
    /// Returns the first unexpected store failure; missing records are not errors
    pub async fn resolve(
        &self,
        root: RefPointer,
        buckets: &ClassificationBuckets,
    ) -> Result<Resolution, ResolveError> {
        tracing::info!(%root, "Resolving reference graph");

        let traversal = Arc::new(Traversal {
            store: Arc::clone(&self.store),
            cache: RefCache::new(self.config.cache_capacity),
            claimed: DashSet::new(),
            arena: TreeArena::default(),
            buckets: buckets.clone(),
            config: self.config.clone(),
            aborted: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            missing: AtomicUsize::new(0),
            model_lookups: AtomicUsize::new(0),
        });

        if let Err(err) = Arc::clone(&traversal).visit_level(vec![root], None).await {
            tracing::error!(error = %err, "Resolution aborted");
            return Err(err);
        }

        let tree = traversal.arena.take_tree();
        let identities: BTreeSet<RefPointer> = traversal
            .claimed
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let stats = TraversalStats {
            fetches: traversal.fetches.load(Ordering::SeqCst),
            missing: traversal.missing.load(Ordering::SeqCst),
            model_lookups: traversal.model_lookups.load(Ordering::SeqCst),
            nodes: tree.len(),
        };

        tracing::info!(
            nodes = stats.nodes,
            fetches = stats.fetches,
            missing = stats.missing,
            "Resolution complete"
        );

        Ok(Resolution {
            tree,
            identities,
            stats,
        })
    }

    /// Flag nodes whose id has another version under review or released
    ///
    /// Groups `identities` by kind and id, fetches the authoritative record
    /// of every id in one batch per kind, then:
    /// - authoritative record under review: every referenced version of
    ///   that id gets `version_under_review` and `under_review_version`
    /// - authoritative record released (100): every referenced version
    ///   older than it gets `version_is_stale_vs_released`
    ///
    /// Run after [`resolve`](Self::resolve) so the identity set is complete.
    ///
    /// # Errors
    /// Returns the first batch lookup failure
    pub async fn check_versions(
        &self,
        identities: &BTreeSet<RefPointer>,
        tree: &mut ReferenceTree,
    ) -> Result<VersionFindings, ResolveError> {
        let mut grouped: BTreeMap<DatasetKind, BTreeMap<Uuid, BTreeSet<&str>>> = BTreeMap::new();
        for pointer in identities {
            grouped
                .entry(pointer.kind)
                .or_default()
                .entry(pointer.id)
                .or_default()
                .insert(pointer.version.as_str());
        }

        let store = &self.store;
        let lookups = grouped.iter().map(|(&kind, by_id)| {
            let ids: Vec<Uuid> = by_id.keys().copied().collect();
            async move {
                let records = store.fetch_batch_by_ids_and_kind(kind, &ids).await?;
                Ok::<_, StoreError>((kind, records))
            }
        });
        let batches = future::try_join_all(lookups).await?;

        let mut findings = VersionFindings::default();
        for (kind, records) in batches {
            let Some(by_id) = grouped.get(&kind) else {
                continue;
            };

            for authoritative in authoritative_per_id(records) {
                let Some(versions) = by_id.get(&authoritative.id) else {
                    continue;
                };

                match authoritative.stage() {
                    ReviewStage::UnderReview => {
                        for version in versions {
                            let pointer = RefPointer::new(kind, authoritative.id, *version);
                            findings.under_review += tree.update_all(&pointer, |node| {
                                node.version_under_review = true;
                                node.under_review_version = Some(authoritative.version.clone());
                            });
                        }
                    }
                    ReviewStage::Released => {
                        let stale = versions
                            .iter()
                            .filter(|version| is_stale(version, &authoritative.version));
                        for version in stale {
                            let pointer = RefPointer::new(kind, authoritative.id, *version);
                            findings.stale += tree.update_all(&pointer, |node| {
                                node.version_is_stale_vs_released = true;
                            });
                        }
                    }
                    ReviewStage::Draft | ReviewStage::CandidateRelease => {}
                }
            }
        }

        tracing::debug!(
            under_review = findings.under_review,
            stale = findings.stale,
            "Version check complete"
        );
        Ok(findings)
    }
}

/// Keep the highest version per id when a batch returns several
fn authoritative_per_id(records: Vec<VersionRecord>) -> Vec<VersionRecord> {
    let mut latest: HashMap<Uuid, VersionRecord> = HashMap::with_capacity(records.len());
    for record in records {
        let newer = latest.get(&record.id).map_or(true, |current| {
            compare_versions(&record.version, &current.version) == CmpOrdering::Greater
        });
        if newer {
            latest.insert(record.id, record);
        }
    }
    latest.into_values().collect()
}

/// State shared by every task of one resolution
struct Traversal<S: ?Sized> {
    store: Arc<S>,
    cache: RefCache,
    claimed: DashSet<RefPointer>,
    arena: TreeArena,
    buckets: ClassificationBuckets,
    config: ResolverConfig,
    aborted: AtomicBool,
    fetches: AtomicUsize,
    missing: AtomicUsize,
    model_lookups: AtomicUsize,
}

impl<S> Traversal<S>
where
    S: RefStore + ?Sized + 'static,
{
    /// Fan out over one level of siblings and wait for the level to drain
    fn visit_level(
        self: Arc<Self>,
        pointers: Vec<RefPointer>,
        parent: Option<NodeId>,
    ) -> BoxFuture<'static, Result<(), ResolveError>> {
        async move {
            let queue = BoundedTaskQueue::new(self.config.level_concurrency);
            let mut handles = Vec::with_capacity(pointers.len());

            for pointer in pointers {
                if self.is_aborted() {
                    break;
                }
                if !self.claimed.insert(pointer.clone()) {
                    tracing::trace!(%pointer, "Already claimed");
                    continue;
                }
                handles.push(queue.submit(Arc::clone(&self).visit(pointer, parent)));
            }

            queue.await_all().await;
            for handle in handles {
                handle
                    .await
                    .map_err(ResolveError::from)
                    .and_then(|visited| visited)
                    .map_err(|err| self.abort(err))?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Fetch, classify and possibly descend into one claimed reference
    async fn visit(
        self: Arc<Self>,
        pointer: RefPointer,
        parent: Option<NodeId>,
    ) -> Result<(), ResolveError> {
        if self.is_aborted() {
            return Ok(());
        }
        let Some(record) = self.fetch(&pointer).await? else {
            self.record_missing(&pointer, parent);
            return Ok(());
        };

        let node = self.arena.attach(
            parent,
            ReferenceTreeNode::new(pointer.clone(), record.rule_verification),
        );

        if self.classify(&pointer, &record) == ReviewStage::Draft {
            let children = extract_references(&record.payload, &self.config.reference_fields);
            tracing::debug!(%pointer, children = children.len(), "Descending into draft");
            Arc::clone(&self).visit_level(children, Some(node)).await?;
        }

        if pointer.kind == DatasetKind::Process {
            self.visit_process_model(pointer, parent.unwrap_or(node))
                .await?;
        }
        Ok(())
    }

    /// Pull in the life-cycle model built on a process, next to the process
    async fn visit_process_model(
        self: Arc<Self>,
        process: RefPointer,
        parent: NodeId,
    ) -> Result<(), ResolveError> {
        if self.is_aborted() {
            return Ok(());
        }
        self.model_lookups.fetch_add(1, Ordering::SeqCst);

        let linked = match self
            .store
            .fetch_life_cycle_model_for_process(process.id, &process.version)
            .await
        {
            Ok(linked) => linked,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(self.abort(err.into())),
        };
        let Some(LinkedModel { pointer, record }) = linked else {
            return Ok(());
        };

        if !self.claimed.insert(pointer.clone()) {
            tracing::trace!(%pointer, "Model already claimed");
            return Ok(());
        }

        let node = self.arena.attach(
            Some(parent),
            ReferenceTreeNode::new(pointer.clone(), record.rule_verification),
        );
        tracing::debug!(%process, model = %pointer, "Found life-cycle model for process");

        if self.classify(&pointer, &record) == ReviewStage::Draft {
            let children = extract_references(&record.payload, &self.config.reference_fields);
            self.visit_level(children, Some(node)).await?;
        }
        Ok(())
    }

    async fn fetch(
        &self,
        pointer: &RefPointer,
    ) -> Result<Option<Arc<DatasetRecord>>, ResolveError> {
        let store = &self.store;
        let fetched = self
            .cache
            .try_get_or_fetch(pointer, || store.fetch_by_identity(pointer))
            .await;

        match fetched {
            Ok((record, outcome)) => {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(
                    %pointer,
                    ?outcome,
                    state_code = record.state_code,
                    "Fetched record"
                );
                Ok(Some(record))
            }
            Err(err) if err.is_not_found() => {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
            Err(err) => {
                tracing::error!(%pointer, error = %err, "Store failure");
                Err(self.abort(err.into()))
            }
        }
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Stop all further fetches and level submissions
    fn abort(&self, err: ResolveError) -> ResolveError {
        self.aborted.store(true, Ordering::SeqCst);
        err
    }

    fn record_missing(&self, pointer: &RefPointer, parent: Option<NodeId>) {
        tracing::warn!(%pointer, "Referenced dataset does not exist");
        self.missing.fetch_add(1, Ordering::SeqCst);
        self.arena
            .attach(parent, ReferenceTreeNode::missing(pointer.clone()));

        // Models are looked up through their process, not by identity.
        if pointer.kind != DatasetKind::LifeCycleModel {
            self.buckets.push(Bucket::Nonexistent, pointer.clone());
        }
    }

    /// Record `pointer` into the buckets its record belongs to
    fn classify(&self, pointer: &RefPointer, record: &DatasetRecord) -> ReviewStage {
        let stage = record.stage();
        if stage.is_final() {
            return stage;
        }

        if !record.rule_verification {
            self.buckets.prepend(Bucket::RuleViolating, pointer.clone());
        }
        match stage {
            ReviewStage::UnderReview => {
                self.buckets.push(Bucket::UnderReview, pointer.clone());
            }
            ReviewStage::Draft => {
                self.buckets.push(Bucket::Unreviewed, pointer.clone());
            }
            ReviewStage::Released | ReviewStage::CandidateRelease => {}
        }
        stage
    }
}
