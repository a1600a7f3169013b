//! Hill-Climbing Pattern Collection Generator
//!
//! Local search over pattern collections, after Haslum et al.: start
//! with one singleton pattern per goal variable, then repeatedly probe
//! the causal neighborhood of the best pattern so far. Every candidate
//! gets a real PDB and is scored by the *counting approximation*: the
//! number of sampled states whose canonical value would improve if the
//! candidate joined the collection. The best candidate is adopted when
//! it clears the improvement threshold.
//!
//! The loop is bounded by a wall-clock budget (checked cooperatively
//! between candidates and inside sampling), a per-PDB size budget, and a
//! total collection size budget.

use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::errors::{EngineError, Result};
use crate::pdb::incremental::IncrementalCanonicalPdbs;
use crate::pdb::PatternDatabase;
use crate::sampling::sample_states_with_random_walks;
use crate::statistics::HillClimbingStats;
use crate::task::{NormalizedTask, State};
use crate::timeout::CountdownTimer;
use crate::types::{MaxAdditiveSubsets, Pattern, PatternCollection};
use crate::validation::validate_and_normalize_patterns;

use super::{PatternCollectionGenerator, PatternCollectionInformation};

pub struct PatternCollectionGeneratorHillclimbing {
    max_number_pdb_states: usize,
    max_pdb_size: usize,
    collection_max_size: usize,
    num_samples: usize,
    min_improvement: usize,
    /// Wall-clock budget; `None` runs until convergence, zero disables
    /// hill climbing entirely (the initial goal collection is returned).
    max_time: Option<Duration>,
    seed: u64,
}

impl PatternCollectionGeneratorHillclimbing {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        max_number_pdb_states: usize,
        max_pdb_size: usize,
        collection_max_size: usize,
        num_samples: usize,
        min_improvement: usize,
        max_time: Option<Duration>,
        seed: u64,
    ) -> PatternCollectionGeneratorHillclimbing {
        PatternCollectionGeneratorHillclimbing {
            max_number_pdb_states,
            max_pdb_size,
            collection_max_size,
            num_samples,
            min_improvement,
            max_time,
            seed,
        }
    }

    /// Candidate extensions of one pattern: the pattern plus one causal
    /// precondition neighbor, within the per-PDB size budget.
    fn generate_candidate_patterns(
        &self,
        task: &NormalizedTask,
        pdb: &PatternDatabase,
        candidates: &mut PatternCollection,
        stats: &mut HillClimbingStats,
    ) -> Result<()> {
        let cg = task.causal_graph();
        let pattern = pdb.pattern();
        let pdb_size = pdb.size();

        let mut extend = |prop_neighbors: Vec<usize>,
                          num_neighbors: Vec<usize>,
                          stats: &mut HillClimbingStats|
         -> Result<()> {
            for var in prop_neighbors {
                if pattern.propositional.binary_search(&var).is_ok() {
                    continue;
                }
                let var_size = task.domain_size(var);
                if within_limit(pdb_size, var_size, self.max_pdb_size) {
                    let mut candidate = pattern.clone();
                    candidate.propositional.push(var);
                    candidate.propositional.sort_unstable();
                    candidates.push(candidate);
                } else {
                    stats.rejected_patterns += 1;
                }
            }
            for var in num_neighbors {
                if pattern.numeric.binary_search(&var).is_ok() {
                    continue;
                }
                let var_size = task.approximate_domain_size(var)?;
                if within_limit(pdb_size, var_size, self.max_pdb_size) {
                    let mut candidate = pattern.clone();
                    candidate.numeric.push(var);
                    candidate.numeric.sort_unstable();
                    candidates.push(candidate);
                } else {
                    stats.rejected_patterns += 1;
                }
            }
            Ok(())
        };

        for &var in &pattern.propositional {
            extend(cg.prop_eff_to_prop_pre(var), cg.prop_eff_to_num_pre(var), stats)?;
        }
        for &var in &pattern.numeric {
            extend(cg.num_eff_to_prop_pre(var), cg.num_eff_to_num_pre(var), stats)?;
        }
        Ok(())
    }

    /// Build PDBs for candidates not seen before.
    fn generate_pdbs_for_candidates(
        &self,
        task: &Rc<NormalizedTask>,
        generated_patterns: &mut HashSet<Pattern>,
        new_candidates: &[Pattern],
        candidate_pdbs: &mut Vec<Option<Rc<PatternDatabase>>>,
        stats: &mut HillClimbingStats,
    ) -> Result<()> {
        for candidate in new_candidates {
            if generated_patterns.insert(candidate.clone()) {
                let pdb = Rc::new(PatternDatabase::new(
                    Rc::clone(task),
                    candidate.clone(),
                    self.max_number_pdb_states,
                )?);
                stats.max_pdb_size = stats.max_pdb_size.max(pdb.size());
                candidate_pdbs.push(Some(pdb));
            }
        }
        stats.generated_patterns = generated_patterns.len();
        Ok(())
    }

    /// Counting approximation: over all candidates, the one improving
    /// the canonical value on the most samples.
    fn find_best_improving_pdb(
        &self,
        current: &IncrementalCanonicalPdbs,
        samples: &[State],
        candidate_pdbs: &mut [Option<Rc<PatternDatabase>>],
        timer: &CountdownTimer,
    ) -> Result<(usize, Option<usize>)> {
        let mut improvement = 0usize;
        let mut best_index = None;

        for index in 0..candidate_pdbs.len() {
            timer.check()?;
            let Some(pdb) = candidate_pdbs[index].clone() else {
                // Rejected earlier or already adopted.
                continue;
            };
            if current.size() + pdb.size() > self.collection_max_size {
                candidate_pdbs[index] = None;
                continue;
            }

            let subsets = current.subsets_with_pattern(pdb.pattern());
            let count = samples
                .iter()
                .filter(|sample| is_heuristic_improved(current, &pdb, sample, &subsets))
                .count();
            if count > improvement {
                improvement = count;
                best_index = Some(index);
            }
            if count > 0 {
                debug!(pattern = %pdb.pattern(), improvement = count, "candidate scored");
            }
        }
        Ok((improvement, best_index))
    }

    fn hill_climbing(
        &self,
        task: &Rc<NormalizedTask>,
        current: &mut IncrementalCanonicalPdbs,
        mut new_candidates: PatternCollection,
        stats: &mut HillClimbingStats,
    ) -> Result<()> {
        let timer = CountdownTimer::new(self.max_time);
        let average_operator_cost = task.average_operator_cost();
        let initial_state = task.initial_state();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut generated_patterns: HashSet<Pattern> = HashSet::new();
        let mut candidate_pdbs: Vec<Option<Rc<PatternDatabase>>> = Vec::new();

        let outcome: Result<()> = (|| {
            loop {
                stats.iterations += 1;
                if current.is_dead_end(&initial_state) {
                    info!("initial state is a dead end, stopping hill climbing");
                    return Ok(());
                }
                let init_h = current.value(&initial_state);
                debug!(
                    iteration = stats.iterations,
                    collection_size = current.size(),
                    init_h,
                    "hill climbing iteration"
                );

                self.generate_pdbs_for_candidates(
                    task,
                    &mut generated_patterns,
                    &new_candidates,
                    &mut candidate_pdbs,
                    stats,
                )?;

                let samples = sample_states_with_random_walks(
                    task,
                    self.num_samples,
                    init_h,
                    average_operator_cost,
                    |state| current.is_dead_end(state),
                    &timer,
                    &mut rng,
                )?;

                let (improvement, best_index) =
                    self.find_best_improving_pdb(current, &samples, &mut candidate_pdbs, &timer)?;

                if improvement < self.min_improvement {
                    info!(improvement, "improvement below threshold, stopping hill climbing");
                    return Ok(());
                }

                let best_index = best_index.expect("positive improvement without a candidate");
                let best_pdb = candidate_pdbs[best_index]
                    .take()
                    .expect("best candidate was scored");
                info!(
                    pattern = %best_pdb.pattern(),
                    improvement,
                    "adopting candidate pattern"
                );
                current.add_pattern(best_pdb.pattern().clone())?;

                new_candidates.clear();
                self.generate_candidate_patterns(task, &best_pdb, &mut new_candidates, stats)?;
            }
        })();

        match outcome {
            Err(err) if err.is_timeout() => {
                info!("time limit reached, aborting hill climbing");
                stats.timed_out = true;
                Ok(())
            }
            other => other,
        }
    }
}

fn within_limit(size: usize, factor: usize, limit: usize) -> bool {
    size.checked_mul(factor).is_some_and(|product| product <= limit)
}

/// True iff adding `pdb` would raise the canonical value of `sample`:
/// there is a surviving additive subset `S` with
/// `h_pdb(sample) + sum_S h(sample) > h_collection(sample)`.
fn is_heuristic_improved(
    current: &IncrementalCanonicalPdbs,
    pdb: &PatternDatabase,
    sample: &State,
    subsets: &MaxAdditiveSubsets,
) -> bool {
    let h_pattern = pdb.value(sample);
    if h_pattern.is_infinite() {
        return true;
    }
    let h_collection = current.value(sample);
    if h_collection.is_infinite() {
        return false;
    }
    for subset in subsets {
        let mut h_subset = 0.0;
        for additive_pdb in subset {
            let h = additive_pdb.value(sample);
            if h.is_infinite() {
                return false;
            }
            h_subset += h;
        }
        if h_pattern + h_subset > h_collection {
            return true;
        }
    }
    false
}

impl PatternCollectionGenerator for PatternCollectionGeneratorHillclimbing {
    fn generate(&self, task: &Rc<NormalizedTask>) -> Result<PatternCollectionInformation> {
        if self.min_improvement > self.num_samples {
            return Err(EngineError::InvalidArgument(
                "min_improvement must not exceed num_samples".to_string(),
            ));
        }

        // Initial collection: one singleton pattern per goal variable.
        let mut initial_patterns: PatternCollection = task
            .propositional_goals()
            .iter()
            .map(|goal| Pattern::propositional(vec![goal.var]))
            .collect();
        initial_patterns.extend(
            task.numeric_goals()
                .iter()
                .filter_map(|goal| goal.var_id())
                .map(|var| Pattern::numeric(vec![var])),
        );

        let mut stats = HillClimbingStats::default();
        let mut current = IncrementalCanonicalPdbs::new(
            Rc::clone(task),
            initial_patterns,
            self.max_number_pdb_states,
        )?;

        let initial_state = task.initial_state();
        if !current.is_dead_end(&initial_state) {
            let mut initial_candidates: PatternCollection = Vec::new();
            for pdb in current.pdbs().clone() {
                self.generate_candidate_patterns(task, &pdb, &mut initial_candidates, &mut stats)?;
            }
            validate_and_normalize_patterns(task, &mut initial_candidates)?;

            if self.max_time != Some(Duration::ZERO) {
                self.hill_climbing(task, &mut current, initial_candidates, &mut stats)?;
            }
        }

        stats.num_patterns = current.patterns().len();
        stats.collection_size = current.size();
        info!(
            iterations = stats.iterations,
            patterns = stats.num_patterns,
            size = stats.collection_size,
            generated = stats.generated_patterns,
            rejected = stats.rejected_patterns,
            "hill climbing finished"
        );

        let (patterns, pdbs, subsets) = current.into_parts();
        let mut info =
            PatternCollectionInformation::new(Rc::clone(task), patterns, self.max_number_pdb_states);
        info.set_pdbs(pdbs);
        info.set_max_additive_subsets(subsets);
        Ok(info)
    }
}
