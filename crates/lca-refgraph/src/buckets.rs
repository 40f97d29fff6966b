//! Classification buckets accumulated during one resolution
//!
//! Four deduplicated lists of references. Membership is keyed on
//! `(id, version)` only: two kinds sharing an id and version (a process and
//! the life-cycle model built on it) collapse into a single entry.

use lca_dataset::RefPointer;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bucket a reference was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    /// Draft records reachable from the root
    Unreviewed,
    /// Records currently mid-review
    UnderReview,
    /// Unreleased records failing rule verification
    RuleViolating,
    /// Identities with no record
    Nonexistent,
}

/// Plain copy of the four bucket lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSnapshot {
    /// Draft records, in discovery order
    pub unreviewed: Vec<RefPointer>,
    /// Mid-review records, in discovery order
    pub under_review: Vec<RefPointer>,
    /// Rule-violating records, most recently found first
    pub rule_violating: Vec<RefPointer>,
    /// Missing identities, in discovery order
    pub nonexistent: Vec<RefPointer>,
}

impl BucketSnapshot {
    /// List for one bucket
    #[must_use]
    pub fn get(&self, bucket: Bucket) -> &[RefPointer] {
        match bucket {
            Bucket::Unreviewed => &self.unreviewed,
            Bucket::UnderReview => &self.under_review,
            Bucket::RuleViolating => &self.rule_violating,
            Bucket::Nonexistent => &self.nonexistent,
        }
    }

    /// Whether all four lists are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unreviewed.is_empty()
            && self.under_review.is_empty()
            && self.rule_violating.is_empty()
            && self.nonexistent.is_empty()
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<RefPointer> {
        match bucket {
            Bucket::Unreviewed => &mut self.unreviewed,
            Bucket::UnderReview => &mut self.under_review,
            Bucket::RuleViolating => &mut self.rule_violating,
            Bucket::Nonexistent => &mut self.nonexistent,
        }
    }
}

/// Shared accumulator for one resolution
///
/// Cloning yields another handle to the same lists, so concurrent fetch
/// tasks can all record into it.
#[derive(Debug, Clone, Default)]
pub struct ClassificationBuckets {
    inner: Arc<Mutex<BucketSnapshot>>,
}

impl ClassificationBuckets {
    /// Create empty buckets
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to a bucket unless an entry with the same id and version exists
    ///
    /// Returns whether the pointer was added.
    pub fn push(&self, bucket: Bucket, pointer: RefPointer) -> bool {
        self.add(bucket, pointer, false)
    }

    /// Prepend to a bucket unless an entry with the same id and version exists
    ///
    /// Returns whether the pointer was added.
    pub fn prepend(&self, bucket: Bucket, pointer: RefPointer) -> bool {
        self.add(bucket, pointer, true)
    }

    /// Whether a bucket holds an entry with the same id and version
    #[must_use]
    pub fn contains(&self, bucket: Bucket, pointer: &RefPointer) -> bool {
        self.inner
            .lock()
            .get(bucket)
            .iter()
            .any(|existing| existing.same_revision(pointer))
    }

    /// Copy of the current lists
    #[must_use]
    pub fn snapshot(&self) -> BucketSnapshot {
        self.inner.lock().clone()
    }

    /// Total entries across all buckets
    #[must_use]
    pub fn total(&self) -> usize {
        let lists = self.inner.lock();
        lists.unreviewed.len()
            + lists.under_review.len()
            + lists.rule_violating.len()
            + lists.nonexistent.len()
    }

    fn add(&self, bucket: Bucket, pointer: RefPointer, front: bool) -> bool {
        let mut lists = self.inner.lock();
        let list = lists.get_mut(bucket);
        if list.iter().any(|existing| existing.same_revision(&pointer)) {
            return false;
        }
        if front {
            list.insert(0, pointer);
        } else {
            list.push(pointer);
        }
        true
    }
}
