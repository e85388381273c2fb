// src/change_detector.rs
//! Decides whether a freshly persisted report differs enough from the
//! previous one to warrant a notification. The comparison is deliberately
//! coarse: per-severity-level fact counts only, not indicator identity.

use std::collections::BTreeMap;

use crate::model::{Fact, FactLevel};

/// Bucket facts by severity. Every known level appears in the result,
/// defaulting to 0, so two maps are always directly comparable.
pub fn level_counts(facts: &[Fact]) -> BTreeMap<FactLevel, usize> {
    let mut counts: BTreeMap<FactLevel, usize> =
        FactLevel::ALL.iter().map(|l| (*l, 0)).collect();
    for f in facts {
        *counts.entry(f.level).or_insert(0) += 1;
    }
    counts
}

/// True iff any level's count differs between the two bucket maps.
/// Exact equality across the full ordered level set, no thresholds.
pub fn detect_change(
    previous: &BTreeMap<FactLevel, usize>,
    current: &BTreeMap<FactLevel, usize>,
) -> bool {
    FactLevel::ALL.iter().any(|l| {
        previous.get(l).copied().unwrap_or(0) != current.get(l).copied().unwrap_or(0)
    })
}

/// Convenience over raw fact slices. `previous_facts` is empty when the
/// source has no prior report, which makes any non-empty batch a change.
pub fn needs_notification(previous_facts: &[Fact], new_facts: &[Fact]) -> bool {
    detect_change(&level_counts(previous_facts), &level_counts(new_facts))
}
