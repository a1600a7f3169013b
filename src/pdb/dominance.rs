//! Dominance Pruning
//!
//! Subset `A` dominates subset `B` iff every pattern of `B` has a
//! superset pattern in `A` (on both the propositional and the numeric
//! side): then `A`'s sum is at least `B`'s in every state, and `B` can
//! never decide the canonical maximum. Dominated subsets are removed up
//! front, before evaluation.

use tracing::debug;

use crate::types::{MaxAdditiveSubsets, PdbCollection};

fn subset_dominates(superset: &PdbCollection, subset: &PdbCollection) -> bool {
    subset.iter().all(|dominated| {
        superset
            .iter()
            .any(|dominating| dominating.pattern().is_superset_of(dominated.pattern()))
    })
}

/// Remove every subset dominated by another subset of the family.
pub fn prune_dominated_subsets(subsets: MaxAdditiveSubsets) -> MaxAdditiveSubsets {
    let mut keep = vec![true; subsets.len()];
    for i in 0..subsets.len() {
        if !keep[i] {
            continue;
        }
        for j in 0..subsets.len() {
            if i == j || !keep[j] {
                continue;
            }
            if subset_dominates(&subsets[i], &subsets[j]) {
                keep[j] = false;
            }
        }
    }

    let total = subsets.len();
    let pruned: MaxAdditiveSubsets = subsets
        .into_iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(subset, _)| subset)
        .collect();
    if pruned.len() < total {
        debug!(before = total, after = pruned.len(), "pruned dominated additive subsets");
    }
    pruned
}
