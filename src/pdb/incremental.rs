//! Incremental Canonical Collections
//!
//! Hill climbing grows a pattern collection one pattern at a time. This
//! holder keeps the current patterns, their PDBs, and the maximal
//! additive family together, recomputing the family on every add and
//! answering the "what stays additive with this candidate?" question
//! without a full recomputation.

use std::rc::Rc;

use tracing::info;

use crate::errors::Result;
use crate::pdb::additivity::{
    compute_additive_vars, compute_max_additive_subsets, max_additive_subsets_with_pattern,
    VariableAdditivity,
};
use crate::pdb::canonical::CanonicalPdbs;
use crate::pdb::PatternDatabase;
use crate::task::{NormalizedTask, State};
use crate::types::{MaxAdditiveSubsets, Pattern, PatternCollection, PdbCollection};

/// A live pattern collection with its PDBs and additive family.
pub struct IncrementalCanonicalPdbs {
    task: Rc<NormalizedTask>,
    patterns: PatternCollection,
    pdbs: PdbCollection,
    additive: VariableAdditivity,
    subsets: MaxAdditiveSubsets,
    /// Sum of member PDB size estimates.
    size: usize,
    max_number_pdb_states: usize,
}

impl IncrementalCanonicalPdbs {
    pub fn new(
        task: Rc<NormalizedTask>,
        initial_patterns: PatternCollection,
        max_number_pdb_states: usize,
    ) -> Result<IncrementalCanonicalPdbs> {
        let additive = compute_additive_vars(&task);
        let mut collection = IncrementalCanonicalPdbs {
            task,
            patterns: Vec::new(),
            pdbs: Vec::new(),
            additive,
            subsets: Vec::new(),
            size: 0,
            max_number_pdb_states,
        };
        for pattern in initial_patterns {
            collection.add_pdb_for_pattern(pattern)?;
        }
        collection.recompute_subsets();
        info!(
            patterns = collection.patterns.len(),
            size = collection.size,
            "initial pattern collection built"
        );
        Ok(collection)
    }

    fn add_pdb_for_pattern(&mut self, pattern: Pattern) -> Result<()> {
        let pdb = Rc::new(PatternDatabase::new(
            Rc::clone(&self.task),
            pattern.clone(),
            self.max_number_pdb_states,
        )?);
        self.size += pdb.size();
        self.patterns.push(pattern);
        self.pdbs.push(pdb);
        Ok(())
    }

    /// Add a pattern, build its PDB, and refresh the additive family.
    pub fn add_pattern(&mut self, pattern: Pattern) -> Result<()> {
        self.add_pdb_for_pattern(pattern)?;
        self.recompute_subsets();
        Ok(())
    }

    fn recompute_subsets(&mut self) {
        self.subsets = compute_max_additive_subsets(&self.pdbs, &self.additive);
    }

    /// The members of the current family that stay additive with
    /// `new_pattern`, per subset.
    pub fn subsets_with_pattern(&self, new_pattern: &Pattern) -> MaxAdditiveSubsets {
        max_additive_subsets_with_pattern(&self.subsets, new_pattern, &self.additive)
    }

    /// Canonical heuristic value of the current collection.
    pub fn value(&self, state: &State) -> f64 {
        CanonicalPdbs::new(self.subsets.clone(), false).value(state)
    }

    /// True iff any member PDB proves `state` a dead end.
    pub fn is_dead_end(&self, state: &State) -> bool {
        self.pdbs.iter().any(|pdb| pdb.value(state).is_infinite())
    }

    pub fn task(&self) -> &Rc<NormalizedTask> {
        &self.task
    }

    pub fn patterns(&self) -> &PatternCollection {
        &self.patterns
    }

    pub fn pdbs(&self) -> &PdbCollection {
        &self.pdbs
    }

    pub fn subsets(&self) -> &MaxAdditiveSubsets {
        &self.subsets
    }

    pub fn additivity(&self) -> &VariableAdditivity {
        &self.additive
    }

    /// Sum of the member PDB size estimates.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tear down into the final collection pieces.
    pub fn into_parts(self) -> (PatternCollection, PdbCollection, MaxAdditiveSubsets) {
        (self.patterns, self.pdbs, self.subsets)
    }
}
