//! Canonical PDB Evaluator
//!
//! The canonical heuristic of a pattern collection: the maximum over all
//! maximal additive subsets of the sum of the member PDB values. Any
//! infinite summand short-circuits its subset; when every subset is
//! infinite the state is a dead end.

use std::cell::Cell;

use crate::pdb::dominance::prune_dominated_subsets;
use crate::task::State;
use crate::types::MaxAdditiveSubsets;

/// Evaluator over a fixed family of maximal additive subsets.
pub struct CanonicalPdbs {
    subsets: MaxAdditiveSubsets,
    /// States no member PDB had stored; for statistics only.
    lookup_misses: Cell<u64>,
}

impl CanonicalPdbs {
    pub fn new(subsets: MaxAdditiveSubsets, dominance_pruning: bool) -> CanonicalPdbs {
        let subsets = if dominance_pruning {
            prune_dominated_subsets(subsets)
        } else {
            subsets
        };
        CanonicalPdbs { subsets, lookup_misses: Cell::new(0) }
    }

    pub fn subsets(&self) -> &MaxAdditiveSubsets {
        &self.subsets
    }

    pub fn lookup_misses(&self) -> u64 {
        self.lookup_misses.get()
    }

    /// `max` over subsets of `sum` over members; infinity marks a dead end.
    pub fn value(&self, state: &State) -> f64 {
        debug_assert!(!self.subsets.is_empty(), "empty family must be {{emptyset}}");
        let mut max_h: f64 = 0.0;
        let mut found_state = false;
        for subset in &self.subsets {
            let mut subset_h = 0.0;
            for pdb in subset {
                // Recomputing values beats caching them per state; the
                // projections are cheap relative to a hash-map probe.
                let (found, h) = pdb.lookup(state);
                found_state |= found;
                if h.is_infinite() {
                    return f64::INFINITY;
                }
                subset_h += h;
            }
            max_h = max_h.max(subset_h);
        }
        if !found_state {
            self.lookup_misses.set(self.lookup_misses.get() + 1);
        }
        max_h
    }
}
