//! Problem collection over a finished reference tree
//!
//! A node is a problem when it fails one of the gating predicates for the
//! active [`CheckMode`]. Every problem is reported together with its
//! ancestor chain so the path from the root can be displayed. Entries are
//! deduplicated by `(id, version)`.

use crate::tree::{ReferenceTree, ReferenceTreeNode};
use lca_dataset::RefPointer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Which gate the tree is checked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckMode {
    /// Data check before submission
    ///
    /// A reference is only a problem if another version of it is under review.
    #[default]
    CheckData,
    /// Submission for review
    ///
    /// Any reference with a version under review is a problem.
    Review,
}

impl CheckMode {
    /// Wire label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckData => "checkData",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a node was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProblemKind {
    /// Record failed rule verification
    RuleViolation,
    /// No record exists for the identity
    NonExistent,
    /// Referenced version is older than the released one
    StaleVersion,
    /// A different version of the id is under review
    UnderReviewOtherVersion,
    /// Some version of the id is under review
    UnderReview,
}

/// Gating predicates failed by `node` under `mode`
#[must_use]
pub fn problem_kinds(node: &ReferenceTreeNode, mode: CheckMode) -> Vec<ProblemKind> {
    let mut kinds = Vec::new();

    if !node.rule_verification {
        kinds.push(ProblemKind::RuleViolation);
    }
    if node.non_existent {
        kinds.push(ProblemKind::NonExistent);
    }
    if node.version_is_stale_vs_released {
        kinds.push(ProblemKind::StaleVersion);
    }
    if node.version_under_review {
        match mode {
            CheckMode::CheckData => {
                if node.under_review_version.as_deref() != Some(node.pointer.version.as_str()) {
                    kinds.push(ProblemKind::UnderReviewOtherVersion);
                }
            }
            CheckMode::Review => kinds.push(ProblemKind::UnderReview),
        }
    }
    kinds
}

/// A reported node borrowed from the tree
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemNode<'a> {
    /// Tree node
    pub node: &'a ReferenceTreeNode,
    /// Distance from the root
    pub depth: usize,
    /// Failed predicates; empty for ancestors reported as path context
    pub reasons: Vec<ProblemKind>,
}

impl ProblemNode<'_> {
    /// Identity of the node
    #[inline]
    #[must_use]
    pub fn pointer(&self) -> &RefPointer {
        &self.node.pointer
    }

    /// Whether the node is only reported as an ancestor of a problem
    #[inline]
    #[must_use]
    pub fn is_context(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Owned copy without children
    #[must_use]
    pub fn to_summary(&self) -> ProblemSummary {
        ProblemSummary {
            pointer: self.node.pointer.clone(),
            depth: self.depth,
            reasons: self.reasons.clone(),
            under_review_version: self.node.under_review_version.clone(),
        }
    }
}

/// Owned, serializable problem entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    /// Reported identity
    pub pointer: RefPointer,
    /// Distance from the root
    pub depth: usize,
    /// Failed predicates; empty for path context
    pub reasons: Vec<ProblemKind>,
    /// Version under review for this id, if any
    pub under_review_version: Option<String>,
}

/// Problem nodes of `tree` plus their ancestors, root first
///
/// Each `(id, version)` appears at most once. Within one root-to-leaf path,
/// ancestors precede their descendants.
#[must_use]
pub fn find_problem_nodes(tree: &ReferenceTree, mode: CheckMode) -> Vec<ProblemNode<'_>> {
    let mut collector = Collector {
        mode,
        path: Vec::new(),
        seen: HashSet::new(),
        found: Vec::new(),
    };
    if let Some(root) = tree.root() {
        collector.walk(root);
    }
    collector.found
}

struct Collector<'a> {
    mode: CheckMode,
    path: Vec<&'a ReferenceTreeNode>,
    seen: HashSet<(Uuid, &'a str)>,
    found: Vec<ProblemNode<'a>>,
}

impl<'a> Collector<'a> {
    fn walk(&mut self, node: &'a ReferenceTreeNode) {
        let reasons = problem_kinds(node, self.mode);

        if !reasons.is_empty() {
            for (depth, &ancestor) in self.path.iter().enumerate() {
                if self.seen.insert(ancestor.pointer.revision_key()) {
                    self.found.push(ProblemNode {
                        node: ancestor,
                        depth,
                        reasons: Vec::new(),
                    });
                }
            }
            if self.seen.insert(node.pointer.revision_key()) {
                self.found.push(ProblemNode {
                    node,
                    depth: self.path.len(),
                    reasons,
                });
            }
        }

        self.path.push(node);
        for child in &node.children {
            self.walk(child);
        }
        self.path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_dataset::DatasetKind;
    use pretty_assertions::assert_eq;

    fn ptr(kind: DatasetKind, n: u128, version: &str) -> RefPointer {
        RefPointer::new(kind, Uuid::from_u128(n), version)
    }

    fn under_review(pointer: RefPointer, review_version: &str) -> ReferenceTreeNode {
        ReferenceTreeNode {
            version_under_review: true,
            under_review_version: Some(review_version.to_string()),
            ..ReferenceTreeNode::new(pointer, true)
        }
    }

    fn ids(problems: &[ProblemNode<'_>]) -> Vec<u128> {
        problems.iter().map(|p| p.pointer().id.as_u128()).collect()
    }

    #[test]
    fn clean_tree_has_no_problems() {
        let tree = ReferenceTree::new(
            ReferenceTreeNode::new(ptr(DatasetKind::Process, 1, "1.0"), true)
                .with_child(ReferenceTreeNode::new(ptr(DatasetKind::Flow, 2, "1.0"), true)),
        );
        assert!(find_problem_nodes(&tree, CheckMode::Review).is_empty());
        assert!(find_problem_nodes(&ReferenceTree::empty(), CheckMode::CheckData).is_empty());
    }

    #[test]
    fn mode_sensitivity() {
        let differing =
            ReferenceTree::new(under_review(ptr(DatasetKind::Flow, 1, "1.0.0"), "1.1.0"));
        assert_eq!(find_problem_nodes(&differing, CheckMode::CheckData).len(), 1);
        assert_eq!(find_problem_nodes(&differing, CheckMode::Review).len(), 1);

        let matching =
            ReferenceTree::new(under_review(ptr(DatasetKind::Flow, 1, "1.1.0"), "1.1.0"));
        assert!(find_problem_nodes(&matching, CheckMode::CheckData).is_empty());

        let review = find_problem_nodes(&matching, CheckMode::Review);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].reasons, vec![ProblemKind::UnderReview]);
    }

    #[test]
    fn ancestors_are_included_once() {
        // process -> flow -> { property -> unit group (violating), source (missing) }
        let tree = ReferenceTree::new(
            ReferenceTreeNode::new(ptr(DatasetKind::Process, 1, "1.0"), true).with_child(
                ReferenceTreeNode::new(ptr(DatasetKind::Flow, 2, "1.0"), true)
                    .with_child(
                        ReferenceTreeNode::new(ptr(DatasetKind::FlowProperty, 3, "1.0"), true)
                            .with_child(ReferenceTreeNode::new(
                                ptr(DatasetKind::UnitGroup, 4, "1.0"),
                                false,
                            )),
                    )
                    .with_child(ReferenceTreeNode::missing(ptr(DatasetKind::Source, 5, "1.0"))),
            ),
        );

        let problems = find_problem_nodes(&tree, CheckMode::CheckData);
        assert_eq!(ids(&problems), vec![1, 2, 3, 4, 5]);

        let depths: Vec<usize> = problems.iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 2]);

        assert!(problems[..3].iter().all(|p| p.is_context()));
        assert_eq!(problems[3].reasons, vec![ProblemKind::RuleViolation]);
        assert_eq!(problems[4].reasons, vec![ProblemKind::NonExistent]);
    }

    #[test]
    fn problem_ancestor_keeps_its_reasons() {
        let tree = ReferenceTree::new(
            ReferenceTreeNode::new(ptr(DatasetKind::Process, 1, "1.0"), false)
                .with_child(ReferenceTreeNode::missing(ptr(DatasetKind::Contact, 2, "1.0"))),
        );

        let problems = find_problem_nodes(&tree, CheckMode::Review);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].reasons, vec![ProblemKind::RuleViolation]);
        assert!(!problems[0].is_context());
    }

    #[test]
    fn dedup_ignores_kind() {
        let tree = ReferenceTree::new(
            ReferenceTreeNode::new(ptr(DatasetKind::Process, 1, "1.0"), false).with_child(
                ReferenceTreeNode::new(ptr(DatasetKind::LifeCycleModel, 1, "1.0"), false),
            ),
        );

        let problems = find_problem_nodes(&tree, CheckMode::CheckData);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].pointer().kind, DatasetKind::Process);
    }

    #[test]
    fn stale_and_violating_reasons_accumulate() {
        let node = ReferenceTreeNode {
            version_is_stale_vs_released: true,
            ..ReferenceTreeNode::new(ptr(DatasetKind::Source, 1, "1.0"), false)
        };

        assert_eq!(
            problem_kinds(&node, CheckMode::CheckData),
            vec![ProblemKind::RuleViolation, ProblemKind::StaleVersion]
        );
    }

    #[test]
    fn summary_drops_children() {
        let tree = ReferenceTree::new(
            under_review(ptr(DatasetKind::Flow, 7, "1.0"), "2.0")
                .with_child(ReferenceTreeNode::new(ptr(DatasetKind::FlowProperty, 8, "1.0"), true)),
        );

        let summary = find_problem_nodes(&tree, CheckMode::CheckData)[0].to_summary();
        assert_eq!(summary.pointer, ptr(DatasetKind::Flow, 7, "1.0"));
        assert_eq!(summary.reasons, vec![ProblemKind::UnderReviewOtherVersion]);
        assert_eq!(summary.under_review_version.as_deref(), Some("2.0"));
    }

    #[test]
    fn mode_serializes_as_wire_label() {
        assert_eq!(serde_json::to_string(&CheckMode::CheckData).unwrap(), "\"checkData\"");
        assert_eq!(CheckMode::Review.to_string(), "review");
    }
}
