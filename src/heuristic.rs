//! Heuristic Façade
//!
//! The boundary the outer search talks to: `evaluate(state)` returns an
//! admissible estimate or the dead-end sentinel, never preferred
//! operators (PDB heuristics have none). Values are cached per concrete
//! state for the lifetime of the façade instance.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::info;

use crate::config::Config;
use crate::errors::Result;
use crate::generators::{
    PatternCollectionGenerator, PatternCollectionGeneratorHillclimbing, PatternGenerator,
};
use crate::pdb::canonical::CanonicalPdbs;
use crate::pdb::PatternDatabase;
use crate::task::{NormalizedTask, State};
use crate::value::{vector_key, ValueKey};

/// Result value of one heuristic evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeuristicValue {
    /// Admissible estimate of the goal distance.
    Estimate(f64),
    /// The state provably cannot reach a goal.
    DeadEnd,
}

impl HeuristicValue {
    fn from_distance(h: f64) -> HeuristicValue {
        if h.is_infinite() {
            HeuristicValue::DeadEnd
        } else {
            HeuristicValue::Estimate(h)
        }
    }

    pub fn is_dead_end(&self) -> bool {
        matches!(self, HeuristicValue::DeadEnd)
    }
}

/// One evaluation as handed to the search.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: HeuristicValue,
    /// Always empty; PDB heuristics produce no operator preferences.
    pub preferred_operators: Vec<usize>,
}

/// Cache key: the concrete state with the numeric side keyed bitwise.
type StateKey = (Vec<usize>, Vec<ValueKey>);

fn state_key(state: &State) -> StateKey {
    (state.propositional.clone(), vector_key(&state.numeric))
}

/// Heuristic over a single pattern database.
pub struct PdbHeuristic {
    pdb: PatternDatabase,
    cache: RefCell<HashMap<StateKey, f64>>,
}

impl PdbHeuristic {
    /// Build the PDB for the pattern produced by `generator`.
    pub fn new(
        task: &Rc<NormalizedTask>,
        generator: &dyn PatternGenerator,
        max_number_states: usize,
    ) -> Result<PdbHeuristic> {
        let pattern = generator.generate(task)?;
        let pdb = PatternDatabase::new(Rc::clone(task), pattern, max_number_states)?;
        info!(pattern = %pdb.pattern(), size = pdb.size(), "pdb heuristic ready");
        Ok(PdbHeuristic { pdb, cache: RefCell::new(HashMap::new()) })
    }

    pub fn pdb(&self) -> &PatternDatabase {
        &self.pdb
    }

    pub fn evaluate(&self, state: &State) -> Evaluation {
        let key = state_key(state);
        let h = *self
            .cache
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| self.pdb.value(state));
        Evaluation {
            value: HeuristicValue::from_distance(h),
            preferred_operators: Vec::new(),
        }
    }
}

/// Heuristic over a canonical pattern collection.
pub struct CanonicalPdbsHeuristic {
    canonical: CanonicalPdbs,
    cache: RefCell<HashMap<StateKey, f64>>,
}

impl CanonicalPdbsHeuristic {
    /// Build from any collection generator.
    pub fn new(
        task: &Rc<NormalizedTask>,
        generator: &dyn PatternCollectionGenerator,
        dominance_pruning: bool,
    ) -> Result<CanonicalPdbsHeuristic> {
        let mut information = generator.generate(task)?;
        information.pdbs()?;
        let subsets = information.max_additive_subsets()?.clone();
        let canonical = CanonicalPdbs::new(subsets, dominance_pruning);
        info!(
            subsets = canonical.subsets().len(),
            "canonical pdbs heuristic ready"
        );
        Ok(CanonicalPdbsHeuristic {
            canonical,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Build with the hill-climbing generator configured by `config`.
    pub fn from_config(task: &Rc<NormalizedTask>, config: &Config) -> Result<CanonicalPdbsHeuristic> {
        config.validate()?;
        let generator = PatternCollectionGeneratorHillclimbing::new(
            config.pdb.max_number_pdb_states,
            config.pdb.max_pdb_size,
            config.pdb.collection_max_size,
            config.hill_climbing.num_samples,
            config.hill_climbing.min_improvement,
            config.hill_climbing.max_time(),
            config.hill_climbing.seed,
        );
        CanonicalPdbsHeuristic::new(task, &generator, config.pdb.dominance_pruning)
    }

    pub fn evaluate(&self, state: &State) -> Evaluation {
        let key = state_key(state);
        let h = *self
            .cache
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| self.canonical.value(state));
        Evaluation {
            value: HeuristicValue::from_distance(h),
            preferred_operators: Vec::new(),
        }
    }

    /// Lookup misses across all member PDBs plus whole-evaluator misses.
    pub fn lookup_misses(&self) -> u64 {
        let mut handled: Vec<*const PatternDatabase> = Vec::new();
        let mut misses = self.canonical.lookup_misses();
        for subset in self.canonical.subsets() {
            for pdb in subset {
                let ptr = Rc::as_ptr(pdb);
                if !handled.contains(&ptr) {
                    handled.push(ptr);
                    misses += pdb.lookup_misses();
                }
            }
        }
        misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Comparator;
    use crate::generators::PatternGeneratorManual;
    use crate::task::builder::{OperatorBuilder, TaskBuilder};
    use crate::types::Pattern;

    fn task() -> Rc<NormalizedTask> {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        let x = b.numeric_variable("x", 0.0);
        let one = b.numeric_constant(1.0);
        let two = b.numeric_constant(2.0);
        let cmp = b.comparison("x_ge_2", x, Comparator::Ge, two);
        b.add_operator(OperatorBuilder::new("sa").effect(a, 1).cost(1.0));
        b.add_operator(OperatorBuilder::new("gx").increase(x, one).cost(1.0));
        b.goal(a, 1).goal(cmp, 1);
        NormalizedTask::new(b.build()).unwrap()
    }

    #[test]
    fn test_pdb_heuristic_estimates() {
        let task = task();
        let generator = PatternGeneratorManual::new(Pattern::propositional(vec![0]));
        let heuristic = PdbHeuristic::new(&task, &generator, 1000).unwrap();
        let eval = heuristic.evaluate(&task.initial_state());
        assert_eq!(eval.value, HeuristicValue::Estimate(1.0));
        assert!(eval.preferred_operators.is_empty());
        // Second evaluation hits the cache and agrees.
        assert_eq!(heuristic.evaluate(&task.initial_state()), eval);
    }

    #[test]
    fn test_dead_end_sentinel() {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        b.goal(a, 1);
        let task = NormalizedTask::new(b.build()).unwrap();
        let generator = PatternGeneratorManual::new(Pattern::propositional(vec![0]));
        let heuristic = PdbHeuristic::new(&task, &generator, 1000).unwrap();
        let eval = heuristic.evaluate(&task.initial_state());
        assert!(eval.value.is_dead_end());
    }

    #[test]
    fn test_canonical_heuristic_from_config() {
        let task = task();
        let config = Config::default();
        let heuristic = CanonicalPdbsHeuristic::from_config(&task, &config).unwrap();
        let eval = heuristic.evaluate(&task.initial_state());
        // Independent goals: 1 (set a) + 2 (grow twice).
        assert_eq!(eval.value, HeuristicValue::Estimate(3.0));
    }
}
