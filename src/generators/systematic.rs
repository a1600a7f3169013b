//! Systematic Pattern Generation
//!
//! Enumerates all *interesting* patterns up to a size cap. SGA
//! ("single-goal ancestor") patterns grow backwards from one goal
//! variable along eff→pre arcs of the causal graph; interesting patterns
//! are disjoint unions of SGA patterns glued at causal connection
//! points. Patterns are produced small-first and deduplicated.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::info;

use crate::causal_graph::CausalGraph;
use crate::errors::Result;
use crate::task::NormalizedTask;
use crate::types::{Pattern, PatternCollection};

use super::{PatternCollectionGenerator, PatternCollectionInformation};

pub struct PatternCollectionGeneratorSystematic {
    pattern_max_size: usize,
    only_interesting_patterns: bool,
    max_number_pdb_states: usize,
}

impl PatternCollectionGeneratorSystematic {
    pub fn new(
        pattern_max_size: usize,
        only_interesting_patterns: bool,
        max_number_pdb_states: usize,
    ) -> PatternCollectionGeneratorSystematic {
        PatternCollectionGeneratorSystematic {
            pattern_max_size,
            only_interesting_patterns,
            max_number_pdb_states,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> PatternCollectionGeneratorSystematic {
        PatternCollectionGeneratorSystematic::new(
            config.systematic.pattern_max_size,
            config.systematic.only_interesting_patterns,
            config.pdb.max_number_pdb_states,
        )
    }

    /// Variables reachable from the pattern by one eff→pre arc, minus
    /// the pattern itself.
    fn eff_pre_neighbors(&self, cg: &CausalGraph, pattern: &Pattern) -> Pattern {
        let mut prop: HashSet<usize> = HashSet::new();
        let mut numeric: HashSet<usize> = HashSet::new();
        for &var in &pattern.propositional {
            prop.extend(cg.prop_eff_to_prop_pre(var));
            numeric.extend(cg.prop_eff_to_num_pre(var));
        }
        for &var in &pattern.numeric {
            prop.extend(cg.num_eff_to_prop_pre(var));
            numeric.extend(cg.num_eff_to_num_pre(var));
        }
        for var in &pattern.propositional {
            prop.remove(var);
        }
        for var in &pattern.numeric {
            numeric.remove(var);
        }
        let mut result = Pattern::new(prop.into_iter().collect(), numeric.into_iter().collect());
        result.propositional.sort_unstable();
        result.numeric.sort_unstable();
        result
    }

    /// The connection points of a pattern: variables an attached SGA
    /// pattern must contain for the union to be interesting.
    ///
    /// A variable qualifies iff it is reachable by an (eff, pre) or
    /// (eff, eff) arc from the pattern (rule 1), is not in the pattern
    /// (rule 2), and is *not* reachable by an (eff, pre) arc alone
    /// (rule 3; those unions are already covered by SGA growth).
    fn connection_points(&self, cg: &CausalGraph, pattern: &Pattern) -> Pattern {
        let mut prop: HashSet<usize> = HashSet::new();
        let mut numeric: HashSet<usize> = HashSet::new();
        for &var in &pattern.propositional {
            prop.extend(cg.prop_predecessors_of_prop_var(var));
            numeric.extend(cg.num_predecessors_of_prop_var(var));
        }
        for &var in &pattern.numeric {
            prop.extend(cg.prop_predecessors_of_num_var(var));
            numeric.extend(cg.num_predecessors_of_num_var(var));
        }
        for &var in &pattern.propositional {
            prop.remove(&var);
            for pre in cg.prop_eff_to_prop_pre(var) {
                prop.remove(&pre);
            }
            for pre in cg.prop_eff_to_num_pre(var) {
                numeric.remove(&pre);
            }
        }
        for &var in &pattern.numeric {
            numeric.remove(&var);
            for pre in cg.num_eff_to_prop_pre(var) {
                prop.remove(&pre);
            }
            for pre in cg.num_eff_to_num_pre(var) {
                numeric.remove(&pre);
            }
        }
        Pattern::new(prop.into_iter().collect(), numeric.into_iter().collect())
    }

    /// All SGA patterns up to the size cap, ordered by size.
    fn build_sga_patterns(
        &self,
        task: &NormalizedTask,
        cg: &CausalGraph,
    ) -> PatternCollection {
        let mut patterns: PatternCollection = Vec::new();
        let mut seen: HashSet<Pattern> = HashSet::new();
        let mut enqueue = |pattern: Pattern, patterns: &mut PatternCollection| {
            if seen.insert(pattern.clone()) {
                patterns.push(pattern);
            }
        };

        for goal in task.propositional_goals() {
            enqueue(Pattern::propositional(vec![goal.var]), &mut patterns);
        }
        for goal in task.numeric_goals() {
            if let Some(var) = goal.var_id() {
                enqueue(Pattern::numeric(vec![var]), &mut patterns);
            }
        }

        // The collection grows while it is scanned: processing pattern i
        // may append larger ones behind the cursor.
        let mut index = 0;
        while index < patterns.len() {
            let pattern = patterns[index].clone();
            index += 1;
            if pattern.len() == self.pattern_max_size {
                break;
            }
            let neighbors = self.eff_pre_neighbors(cg, &pattern);
            for var in neighbors.propositional {
                let mut grown = pattern.clone();
                grown.propositional.push(var);
                grown.propositional.sort_unstable();
                enqueue(grown, &mut patterns);
            }
            for var in neighbors.numeric {
                let mut grown = pattern.clone();
                grown.numeric.push(var);
                grown.numeric.sort_unstable();
                enqueue(grown, &mut patterns);
            }
        }
        patterns
    }

    fn build_interesting_patterns(&self, task: &NormalizedTask) -> PatternCollection {
        let cg = task.causal_graph();
        let sga_patterns = self.build_sga_patterns(task, cg);
        info!(count = sga_patterns.len(), "SGA patterns");

        // Index SGA patterns by member variable; the per-variable lists
        // stay ordered by size because build_sga_patterns emits
        // small-first.
        let mut by_prop_var: Vec<Vec<usize>> = vec![Vec::new(); task.prop_variables().len()];
        let mut by_num_var: Vec<Vec<usize>> = vec![Vec::new(); task.numeric_variables().len()];
        for (index, pattern) in sga_patterns.iter().enumerate() {
            for &var in &pattern.propositional {
                by_prop_var[var].push(index);
            }
            for &var in &pattern.numeric {
                by_num_var[var].push(index);
            }
        }

        let mut patterns: PatternCollection = Vec::new();
        let mut seen: HashSet<Pattern> = HashSet::new();
        for pattern in &sga_patterns {
            if seen.insert(pattern.clone()) {
                patterns.push(pattern.clone());
            }
        }

        let mut index = 0;
        while index < patterns.len() {
            let pattern = patterns[index].clone();
            index += 1;

            let points = self.connection_points(cg, &pattern);
            let candidate_lists = points
                .propositional
                .iter()
                .map(|&var| &by_prop_var[var])
                .chain(points.numeric.iter().map(|&var| &by_num_var[var]));
            for candidates in candidate_lists {
                for &sga_index in candidates {
                    let attached = &sga_patterns[sga_index];
                    if pattern.len() + attached.len() > self.pattern_max_size {
                        // Candidates are size-ordered: the rest only grow.
                        break;
                    }
                    if pattern.is_disjoint(attached) {
                        let union = pattern.union(attached);
                        if seen.insert(union.clone()) {
                            patterns.push(union);
                        }
                    }
                }
            }
        }

        info!(count = patterns.len(), "interesting patterns");
        patterns
    }

    /// Every pattern up to the size cap, interesting or not.
    fn build_all_patterns(&self, task: &NormalizedTask) -> PatternCollection {
        let mut variables: Vec<(usize, bool)> = (0..task.prop_variables().len())
            .filter(|&var| !task.is_comparison_variable(var))
            .map(|var| (var, false))
            .collect();
        variables.extend(
            (0..task.num_regular_numeric_variables())
                .map(|idx| (task.global_of_regular(idx), true)),
        );

        let mut patterns: PatternCollection = Vec::new();
        let mut frontier: Vec<(Pattern, usize)> = vec![(Pattern::default(), 0)];
        while let Some((pattern, next)) = frontier.pop() {
            if !pattern.is_empty() {
                patterns.push(pattern.clone());
            }
            if pattern.len() == self.pattern_max_size {
                continue;
            }
            for (offset, &(var, is_numeric)) in variables[next..].iter().enumerate() {
                let mut grown = pattern.clone();
                if is_numeric {
                    grown.numeric.push(var);
                } else {
                    grown.propositional.push(var);
                }
                frontier.push((grown, next + offset + 1));
            }
        }
        patterns.sort_by_key(|pattern| pattern.len());
        patterns
    }
}

impl PatternCollectionGenerator for PatternCollectionGeneratorSystematic {
    fn generate(&self, task: &Rc<NormalizedTask>) -> Result<PatternCollectionInformation> {
        let patterns = if self.only_interesting_patterns {
            self.build_interesting_patterns(task)
        } else {
            self.build_all_patterns(task)
        };
        Ok(PatternCollectionInformation::new(
            Rc::clone(task),
            patterns,
            self.max_number_pdb_states,
        ))
    }
}
