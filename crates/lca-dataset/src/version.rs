//! Dotted numeric version ordering
//!
//! Versions such as `01.00.000` or `1.10` compare segment by segment as
//! non-negative integers. Missing or unparsable segments count as zero, so
//! `2` and `2.0.0` are equal and `1.2.0` sorts before `1.10.0`.

use std::cmp::Ordering;

/// Compare two dotted versions
///
/// Never fails: empty strings and garbage segments compare as zero.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<u64> = segments(a).collect();
    let right: Vec<u64> = segments(b).collect();
    let len = left.len().max(right.len());

    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Whether `referenced` predates `released`
///
/// Returns `false` when either side is empty, since no comparison is possible.
#[must_use]
pub fn is_stale(referenced: &str, released: &str) -> bool {
    if referenced.trim().is_empty() || released.trim().is_empty() {
        return false;
    }
    compare_versions(referenced, released) == Ordering::Less
}

fn segments(version: &str) -> impl Iterator<Item = u64> + '_ {
    version
        .split('.')
        .map(|segment| segment.trim().parse::<u64>().unwrap_or(0))
}
