//! Review gate
//!
//! Decides whether a dataset may enter a review workflow. One evaluation:
//! 1. resolves the reference graph of the root into fresh buckets
//! 2. refines version flags with [`GraphResolver::check_versions`]
//! 3. collects problem nodes for the requested [`CheckMode`]
//!
//! A store failure anywhere in the evaluation is returned as an error, never
//! as a passing report.

use crate::buckets::{BucketSnapshot, ClassificationBuckets};
use crate::error::ResolveError;
use crate::problems::{find_problem_nodes, CheckMode, ProblemSummary};
use crate::resolver::{GraphResolver, Resolution, TraversalStats, VersionFindings};
use crate::store::RefStore;
use crate::tree::ReferenceTree;
use lca_dataset::RefPointer;
use serde::{Deserialize, Serialize};

/// Result of one gate evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateReport {
    /// Evaluated dataset
    pub root: RefPointer,
    /// Mode the problems were collected for
    pub mode: CheckMode,
    /// Reference tree with version flags applied
    pub tree: ReferenceTree,
    /// Bucket lists accumulated during resolution
    pub buckets: BucketSnapshot,
    /// Problem nodes and their ancestors, root first
    pub problems: Vec<ProblemSummary>,
    /// Traversal counters
    pub stats: TraversalStats,
    /// Version flags applied after traversal
    pub findings: VersionFindings,
}

impl GateReport {
    /// Whether submission must be refused
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.problems.is_empty()
    }

    /// Whether the dataset may be submitted
    #[inline]
    #[must_use]
    pub fn may_submit(&self) -> bool {
        !self.is_blocked()
    }

    /// Entries that failed a predicate themselves
    pub fn direct_problems(&self) -> impl Iterator<Item = &ProblemSummary> {
        self.problems.iter().filter(|p| !p.reasons.is_empty())
    }
}

/// Review-readiness check over a [`GraphResolver`]
#[derive(Debug)]
pub struct ReviewGate<S: ?Sized> {
    resolver: GraphResolver<S>,
}

impl<S> ReviewGate<S>
where
    S: RefStore + ?Sized + 'static,
{
    /// Create gate
    #[inline]
    #[must_use]
    pub fn new(resolver: GraphResolver<S>) -> Self {
        Self { resolver }
    }

    /// Underlying resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &GraphResolver<S> {
        &self.resolver
    }

    /// Evaluate `root` for `mode`
    ///
    /// # Errors
    /// Returns any unexpected store or queue failure
    pub async fn evaluate(
        &self,
        root: RefPointer,
        mode: CheckMode,
    ) -> Result<GateReport, ResolveError> {
        let buckets = ClassificationBuckets::new();
        let Resolution {
            mut tree,
            identities,
            stats,
        } = self.resolver.resolve(root.clone(), &buckets).await?;

        let findings = self.resolver.check_versions(&identities, &mut tree).await?;

        let problems: Vec<ProblemSummary> = find_problem_nodes(&tree, mode)
            .iter()
            .map(|problem| problem.to_summary())
            .collect();

        tracing::info!(
            %root,
            %mode,
            problems = problems.len(),
            blocked = !problems.is_empty(),
            "Review gate evaluated"
        );

        Ok(GateReport {
            root,
            mode,
            tree,
            buckets: buckets.snapshot(),
            problems,
            stats,
            findings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::problems::ProblemKind;
    use crate::store::{MemoryRefStore, MockRefStore};
    use lca_dataset::{DatasetKind, DatasetRecord};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use uuid::Uuid;

    fn ptr(kind: DatasetKind, n: u128, version: &str) -> RefPointer {
        RefPointer::new(kind, Uuid::from_u128(n), version)
    }

    fn reference(pointer: &RefPointer) -> Value {
        json!({
            "@refObjectId": pointer.id.to_string(),
            "@version": pointer.version,
            "@type": pointer.kind.type_label()
        })
    }

    #[tokio::test]
    async fn clean_graph_may_submit() {
        let store = MemoryRefStore::new();
        let root = ptr(DatasetKind::Process, 1, "1.0");
        let flow = ptr(DatasetKind::Flow, 2, "1.0");
        let exchanges = json!({ "exchange": [reference(&flow)] });
        store.insert(root.clone(), DatasetRecord::new(0, true, exchanges));
        store.insert(flow, DatasetRecord::new(100, true, Value::Null));

        let gate = ReviewGate::new(GraphResolver::new(Arc::new(store)));
        let report = gate.evaluate(root.clone(), CheckMode::Review).await.unwrap();

        assert!(report.may_submit());
        assert_eq!(report.buckets.unreviewed, vec![root]);
        assert_eq!(report.tree.len(), 2);
    }

    #[tokio::test]
    async fn stale_reference_blocks_with_path() {
        let store = MemoryRefStore::new();
        let root = ptr(DatasetKind::Process, 1, "1.0");
        let flow = ptr(DatasetKind::Flow, 2, "1.0");
        let source = ptr(DatasetKind::Source, 3, "1.0");
        let exchanges = json!({ "exchange": [reference(&flow)] });
        store.insert(root.clone(), DatasetRecord::new(0, true, exchanges));
        let sources = json!({ "source": reference(&source) });
        store.insert(flow.clone(), DatasetRecord::new(0, true, sources));
        store.insert(source.clone(), DatasetRecord::new(100, true, Value::Null));
        let newer = ptr(DatasetKind::Source, 3, "1.1");
        store.insert(newer, DatasetRecord::new(100, true, Value::Null));

        let gate = ReviewGate::new(GraphResolver::new(Arc::new(store)));
        let report = gate.evaluate(root.clone(), CheckMode::CheckData).await.unwrap();

        assert!(report.is_blocked());
        let pointers: Vec<_> = report.problems.iter().map(|p| p.pointer.clone()).collect();
        assert_eq!(pointers, vec![root, flow, source]);

        let direct: Vec<_> = report.direct_problems().collect();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].reasons, vec![ProblemKind::StaleVersion]);
        assert_eq!(report.findings.stale, 1);
    }

    #[tokio::test]
    async fn store_failure_is_not_a_passing_report() {
        let mut store = MockRefStore::new();
        store
            .expect_fetch_by_identity()
            .returning(|p| Err(StoreError::decode(p.clone(), "unexpected column")));

        let gate = ReviewGate::new(GraphResolver::new(Arc::new(store)));
        let result = gate.evaluate(ptr(DatasetKind::Flow, 1, "1.0"), CheckMode::Review).await;

        assert!(result.is_err_and(|e| e.is_store_failure()));
    }

    #[tokio::test]
    async fn report_serializes_camel_case() {
        let store = MemoryRefStore::new();
        let root = ptr(DatasetKind::Contact, 1, "1.0");

        let gate = ReviewGate::new(GraphResolver::new(Arc::new(store)));
        let report = gate.evaluate(root, CheckMode::CheckData).await.unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["mode"], "checkData");
        assert_eq!(value["buckets"]["nonexistent"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["tree"]["root"]["nonExistent"], true);
        assert_eq!(value["problems"][0]["reasons"][0], "nonExistent");
    }
}
