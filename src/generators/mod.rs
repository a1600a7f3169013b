//! Pattern Generators
//!
//! Strategies producing the patterns the heuristics are built from:
//!
//! | Generator | Output | Strategy |
//! |---|---|---|
//! | [`manual::PatternGeneratorManual`] | one pattern | caller-supplied, validated |
//! | [`greedy::PatternGeneratorGreedy`] | one pattern | variable order under a state budget |
//! | [`systematic::PatternCollectionGeneratorSystematic`] | collection | all interesting SGA unions up to size k |
//! | [`hillclimbing::PatternCollectionGeneratorHillclimbing`] | collection | sampled local search |
//!
//! Collection generators return a [`PatternCollectionInformation`]: the
//! patterns plus, lazily completed on request, their PDBs and maximal
//! additive family.

use std::rc::Rc;

use crate::errors::Result;
use crate::pdb::additivity::{compute_additive_vars, compute_max_additive_subsets};
use crate::pdb::PatternDatabase;
use crate::task::NormalizedTask;
use crate::types::{MaxAdditiveSubsets, Pattern, PatternCollection, PdbCollection};

pub mod greedy;
pub mod hillclimbing;
pub mod manual;
pub mod systematic;
pub mod variable_order;

pub use greedy::PatternGeneratorGreedy;
pub use hillclimbing::PatternCollectionGeneratorHillclimbing;
pub use manual::PatternGeneratorManual;
pub use systematic::PatternCollectionGeneratorSystematic;
pub use variable_order::{VariableOrderFinder, VariableOrderType};

/// Produces a single pattern.
pub trait PatternGenerator {
    fn generate(&self, task: &Rc<NormalizedTask>) -> Result<Pattern>;
}

/// Produces a pattern collection.
pub trait PatternCollectionGenerator {
    fn generate(&self, task: &Rc<NormalizedTask>) -> Result<PatternCollectionInformation>;
}

/// Everything known about a generated pattern collection.
///
/// Always carries the patterns; PDBs and the maximal additive family are
/// filled in by the generator when it computed them anyway, and created
/// on demand otherwise. Ownership of PDBs is shared with whoever asked.
pub struct PatternCollectionInformation {
    task: Rc<NormalizedTask>,
    patterns: PatternCollection,
    pdbs: Option<PdbCollection>,
    subsets: Option<MaxAdditiveSubsets>,
    max_number_pdb_states: usize,
}

impl PatternCollectionInformation {
    pub fn new(
        task: Rc<NormalizedTask>,
        patterns: PatternCollection,
        max_number_pdb_states: usize,
    ) -> PatternCollectionInformation {
        PatternCollectionInformation {
            task,
            patterns,
            pdbs: None,
            subsets: None,
            max_number_pdb_states,
        }
    }

    pub fn set_pdbs(&mut self, pdbs: PdbCollection) {
        self.pdbs = Some(pdbs);
    }

    pub fn set_max_additive_subsets(&mut self, subsets: MaxAdditiveSubsets) {
        self.subsets = Some(subsets);
    }

    pub fn task(&self) -> &Rc<NormalizedTask> {
        &self.task
    }

    pub fn patterns(&self) -> &PatternCollection {
        &self.patterns
    }

    /// The PDBs of the collection, built now if the generator did not
    /// deliver them.
    pub fn pdbs(&mut self) -> Result<&PdbCollection> {
        if self.pdbs.is_none() {
            let mut pdbs = PdbCollection::with_capacity(self.patterns.len());
            for pattern in &self.patterns {
                pdbs.push(Rc::new(PatternDatabase::new(
                    Rc::clone(&self.task),
                    pattern.clone(),
                    self.max_number_pdb_states,
                )?));
            }
            self.pdbs = Some(pdbs);
        }
        Ok(self.pdbs.as_ref().expect("pdbs just created"))
    }

    /// The maximal additive family, computed now if missing.
    pub fn max_additive_subsets(&mut self) -> Result<&MaxAdditiveSubsets> {
        if self.subsets.is_none() {
            self.pdbs()?;
            let additive = compute_additive_vars(&self.task);
            let pdbs = self.pdbs.as_ref().expect("pdbs just created");
            self.subsets = Some(compute_max_additive_subsets(pdbs, &additive));
        }
        Ok(self.subsets.as_ref().expect("subsets just created"))
    }
}
