//! Pattern Databases
//!
//! A pattern database (PDB) stores, for every abstract state of the task
//! projected onto a pattern, the exact goal distance inside the
//! abstraction. Distances are admissible (and consistent) lower bounds
//! for the original task.
//!
//! Purely propositional patterns enumerate the full abstract space into a
//! dense table by regression Dijkstra. Patterns with numeric variables
//! have a potentially infinite abstract space; those are explored
//! *forward* from the projected initial state under a hard state budget,
//! then distances are propagated *backward* over the recorded arcs, with
//! the exploration fringe seeded conservatively so that every value stays
//! admissible even where the budget truncated the space.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use tracing::{debug, info};

use crate::condition::RegularNumericCondition;
use crate::errors::{EngineError, Result};
use crate::search::{AbstractState, MatchTree, NumericStateRegistry};
use crate::statistics::PdbStats;
use crate::task::{NormalizedOperator, NormalizedTask, State};
use crate::types::Pattern;

pub mod additivity;
pub mod canonical;
pub mod dominance;
pub mod incremental;

/// Fraction of enumerated states that must end up with a finite distance
/// for the registry to be kept as-is; below this, it is rebuilt with only
/// the finitely-reachable states.
const COMPACTION_THRESHOLD: f64 = 0.75;

/// An operator lifted into a pattern's abstract space.
///
/// Abstract states are numbers, so the propositional effect reduces to a
/// *hash effect*: the signed change the operator applies to an abstract
/// state index.
#[derive(Debug, Clone)]
pub struct AbstractOperator {
    op_id: usize,
    cost: f64,
    /// `(pattern position, value)` pairs, sorted by position.
    preconditions: Vec<(usize, usize)>,
    hash_effect: i64,
}

impl AbstractOperator {
    /// Build from prevail/precondition/effect pairs over pattern
    /// positions. With `regression` set, preconditions and effects swap
    /// roles, producing the operator of the reversed abstract space.
    fn new(
        prevail: &[(usize, usize)],
        pre_pairs: &[(usize, usize)],
        eff_pairs: &[(usize, usize)],
        op_id: usize,
        cost: f64,
        hash_multipliers: &[usize],
        regression: bool,
    ) -> AbstractOperator {
        let mut preconditions: Vec<(usize, usize)> = prevail.to_vec();
        if regression {
            preconditions.extend_from_slice(eff_pairs);
        } else {
            preconditions.extend_from_slice(pre_pairs);
        }
        preconditions.sort_unstable();

        let (old_side, new_side) = if regression {
            (eff_pairs, pre_pairs)
        } else {
            (pre_pairs, eff_pairs)
        };
        let mut hash_effect = 0i64;
        for (old, new) in old_side.iter().zip(new_side) {
            debug_assert_eq!(old.0, new.0);
            hash_effect +=
                (new.1 as i64 - old.1 as i64) * hash_multipliers[old.0] as i64;
        }

        AbstractOperator { op_id, cost, preconditions, hash_effect }
    }

    pub fn op_id(&self) -> usize {
        self.op_id
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn preconditions(&self) -> &[(usize, usize)] {
        &self.preconditions
    }

    pub fn hash_effect(&self) -> i64 {
        self.hash_effect
    }
}

/// Min-heap entry for the distance queues.
#[derive(Debug, PartialEq)]
struct QueueEntry {
    cost: f64,
    state: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.state.cmp(&self.state))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single pattern database.
pub struct PatternDatabase {
    task: Rc<NormalizedTask>,
    pattern: Pattern,
    /// Domain-size product over the pattern (approximate on the numeric
    /// side); the budget-relevant size estimate.
    size: usize,
    /// Goal distance per abstract state; infinity marks dead ends.
    distances: Vec<f64>,
    prop_hash_multipliers: Vec<usize>,
    /// `(pattern position, value)` goals on the propositional side.
    propositional_goals: Vec<(usize, usize)>,
    numeric_goals: Vec<Rc<RegularNumericCondition>>,
    /// Cheapest operator relevant to this pattern.
    min_action_cost: f64,
    exhausted_abstract_state_space: bool,
    /// Present exactly for mixed numeric patterns.
    registry: Option<NumericStateRegistry>,
    lookup_misses: Cell<u64>,
    stats: PdbStats,
}

impl PatternDatabase {
    /// Build the PDB for `pattern`.
    ///
    /// The pattern must be sorted and duplicate-free (see
    /// [`crate::validation`]). `max_number_states` caps the number of
    /// abstract states reached by forward exploration when the pattern
    /// contains a numeric variable; purely propositional patterns are
    /// always fully enumerated.
    pub fn new(
        task: Rc<NormalizedTask>,
        pattern: Pattern,
        max_number_states: usize,
    ) -> Result<PatternDatabase> {
        let mut prop_hash_multipliers = Vec::with_capacity(pattern.propositional.len());
        let mut size: usize = 1;
        for &var in &pattern.propositional {
            prop_hash_multipliers.push(size);
            size = checked_size_product(size, task.domain_size(var), &pattern)?;
        }
        for &var in &pattern.numeric {
            size = checked_size_product(size, task.approximate_domain_size(var)?, &pattern)?;
        }

        let mut pdb = PatternDatabase {
            task,
            pattern,
            size,
            distances: Vec::new(),
            prop_hash_multipliers,
            propositional_goals: Vec::new(),
            numeric_goals: Vec::new(),
            min_action_cost: f64::INFINITY,
            exhausted_abstract_state_space: false,
            registry: None,
            lookup_misses: Cell::new(0),
            stats: PdbStats::default(),
        };

        if pdb.pattern.numeric.is_empty() {
            pdb.build_propositional();
        } else {
            pdb.build_numeric(max_number_states);
        }
        pdb.stats.exhausted_abstract_state_space = pdb.exhausted_abstract_state_space;
        Ok(pdb)
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Size estimate of the abstraction: the domain-size product over the
    /// pattern, approximate on the numeric side. Budgets count this.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of abstract states actually holding a stored distance.
    pub fn stored_states(&self) -> usize {
        self.distances.len()
    }

    pub fn min_action_cost(&self) -> f64 {
        self.min_action_cost
    }

    pub fn construction_stats(&self) -> &PdbStats {
        &self.stats
    }

    /// Lookup misses since construction (mixed numeric patterns only).
    pub fn lookup_misses(&self) -> u64 {
        self.lookup_misses.get()
    }

    /// Goal distance of the projection of `state`; infinity marks a
    /// proven dead end.
    pub fn value(&self, state: &State) -> f64 {
        self.lookup(state).1
    }

    /// Like [`Self::value`], also reporting whether the projection hit a
    /// stored abstract state or fell back on the miss policy.
    pub fn lookup(&self, state: &State) -> (bool, f64) {
        let prop_hash = self.prop_hash_index(state);
        let registry = match &self.registry {
            // Purely propositional: the table is total.
            None => return (true, self.distances[prop_hash]),
            Some(registry) => registry,
        };

        let projected = AbstractState::new(prop_hash, self.projected_numeric(state));
        match registry.get_id(&projected) {
            Some(id) => (true, self.distances[id]),
            None => {
                self.lookup_misses.set(self.lookup_misses.get() + 1);
                if self.exhausted_abstract_state_space {
                    // The whole abstract space was enumerated, so an
                    // unknown projection is unreachable: a true dead end.
                    (false, f64::INFINITY)
                } else if self.is_abstract_goal_state(state) {
                    (false, 0.0)
                } else {
                    (false, self.min_action_cost)
                }
            }
        }
    }

    /// Mean over the finite stored distances.
    ///
    /// Only defined for purely propositional patterns; a partially
    /// enumerated numeric abstraction has no meaningful mean.
    pub fn mean_finite_h(&self) -> Result<f64> {
        if self.registry.is_some() {
            return Err(EngineError::Unsupported(
                "mean_finite_h over a numeric pattern database".to_string(),
            ));
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for &d in &self.distances {
            if d.is_finite() {
                sum += d;
                count += 1;
            }
        }
        if count == 0 {
            Ok(f64::INFINITY)
        } else {
            Ok(sum / count as f64)
        }
    }

    /// True iff `op` changes a variable of this pattern.
    pub fn is_operator_relevant(&self, op: &NormalizedOperator) -> bool {
        op.propositional_effects
            .iter()
            .any(|eff| self.pattern.propositional.binary_search(&eff.var).is_ok())
            || self.pattern.numeric.iter().any(|&var| {
                self.task
                    .regular_index(var)
                    .map(|idx| op.additive_effects[idx] != 0.0)
                    .unwrap_or(false)
            })
            || op
                .assign_effects
                .iter()
                .any(|&(var, _)| self.pattern.numeric.binary_search(&var).is_ok())
    }

    // ------------------------------------------------------------------
    // Projection helpers
    // ------------------------------------------------------------------

    fn prop_hash_index(&self, state: &State) -> usize {
        self.pattern
            .propositional
            .iter()
            .zip(&self.prop_hash_multipliers)
            .map(|(&var, &mul)| state.propositional[var] * mul)
            .sum()
    }

    fn projected_numeric(&self, state: &State) -> Vec<f64> {
        self.pattern
            .numeric
            .iter()
            .map(|&var| self.task.numeric_state_value(state, var))
            .collect()
    }

    /// Goal check on a *concrete* state, restricted to the pattern.
    fn is_abstract_goal_state(&self, state: &State) -> bool {
        self.propositional_goals.iter().all(|&(pos, value)| {
            state.propositional[self.pattern.propositional[pos]] == value
        }) && self.numeric_goals.iter().all(|goal| {
            let var = goal.var_id().expect("numeric goal without variable");
            goal.satisfied(self.task.numeric_state_value(state, var))
        })
    }

    /// Goal check on an abstract state.
    fn is_goal_state(&self, state: &AbstractState) -> bool {
        self.is_goal_hash(state.prop_hash)
            && self
                .numeric_goals
                .iter()
                .all(|goal| self.numeric_goal_holds(goal, &state.numeric))
    }

    fn numeric_goal_holds(&self, goal: &RegularNumericCondition, numeric: &[f64]) -> bool {
        let var = goal.var_id().expect("numeric goal without variable");
        let pos = self
            .pattern
            .numeric
            .binary_search(&var)
            .expect("goal variable outside pattern");
        goal.satisfied(numeric[pos])
    }

    fn is_goal_hash(&self, prop_hash: usize) -> bool {
        self.propositional_goals.iter().all(|&(pos, value)| {
            let var = self.pattern.propositional[pos];
            let domain = self.task.domain_size(var);
            (prop_hash / self.prop_hash_multipliers[pos]) % domain == value
        })
    }

    fn build_goals(&mut self, num_in_pattern: &[Option<usize>]) {
        for goal in self.task.propositional_goals() {
            if let Ok(pos) = self.pattern.propositional.binary_search(&goal.var) {
                self.propositional_goals.push((pos, goal.value));
            }
        }
        if !self.pattern.numeric.is_empty() {
            for goal in self.task.numeric_goals() {
                if let Some(var) = goal.var_id() {
                    if num_in_pattern[var].is_some() {
                        self.numeric_goals.push(Rc::clone(goal));
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Abstract operator construction
    // ------------------------------------------------------------------

    /// Multiply out one concrete operator into abstract operators over
    /// the pattern's propositional variables. Variables with an effect
    /// but no precondition get one abstract operator per domain value.
    fn build_abstract_operators(
        &self,
        op: &NormalizedOperator,
        op_id: usize,
        prop_in_pattern: &[Option<usize>],
        regression: bool,
        out: &mut Vec<AbstractOperator>,
    ) {
        let mut prevail: Vec<(usize, usize)> = Vec::new();
        let mut pre_pairs: Vec<(usize, usize)> = Vec::new();
        let mut eff_pairs: Vec<(usize, usize)> = Vec::new();
        let mut effects_without_pre: Vec<(usize, usize)> = Vec::new();

        let has_precondition: Vec<Option<usize>> = {
            let mut per_var = vec![None; self.task.prop_variables().len()];
            for pre in &op.propositional_preconditions {
                per_var[pre.var] = Some(pre.value);
            }
            per_var
        };

        let mut has_pre_and_effect = vec![false; self.task.prop_variables().len()];
        for eff in &op.propositional_effects {
            if let Some(pos) = prop_in_pattern[eff.var] {
                if has_precondition[eff.var].is_some() {
                    has_pre_and_effect[eff.var] = true;
                    eff_pairs.push((pos, eff.value));
                } else {
                    effects_without_pre.push((pos, eff.value));
                }
            }
        }
        for pre in &op.propositional_preconditions {
            if let Some(pos) = prop_in_pattern[pre.var] {
                if has_pre_and_effect[pre.var] {
                    pre_pairs.push((pos, pre.value));
                } else {
                    prevail.push((pos, pre.value));
                }
            }
        }
        // pre/eff pairs must line up by position for the hash effect.
        pre_pairs.sort_unstable();
        eff_pairs.sort_unstable();

        self.multiply_out(
            0,
            op_id,
            op.cost,
            &mut prevail,
            &mut pre_pairs,
            &mut eff_pairs,
            &effects_without_pre,
            regression,
            out,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn multiply_out(
        &self,
        pos: usize,
        op_id: usize,
        cost: f64,
        prevail: &mut Vec<(usize, usize)>,
        pre_pairs: &mut Vec<(usize, usize)>,
        eff_pairs: &mut Vec<(usize, usize)>,
        effects_without_pre: &[(usize, usize)],
        regression: bool,
        out: &mut Vec<AbstractOperator>,
    ) {
        if pos == effects_without_pre.len() {
            if !eff_pairs.is_empty() {
                out.push(AbstractOperator::new(
                    prevail,
                    pre_pairs,
                    eff_pairs,
                    op_id,
                    cost,
                    &self.prop_hash_multipliers,
                    regression,
                ));
            }
            return;
        }
        let (pattern_pos, eff_value) = effects_without_pre[pos];
        let domain = self.task.domain_size(self.pattern.propositional[pattern_pos]);
        for value in 0..domain {
            if value != eff_value {
                pre_pairs.push((pattern_pos, value));
                eff_pairs.push((pattern_pos, eff_value));
            } else {
                prevail.push((pattern_pos, value));
            }
            self.multiply_out(
                pos + 1,
                op_id,
                cost,
                prevail,
                pre_pairs,
                eff_pairs,
                effects_without_pre,
                regression,
                out,
            );
            if value != eff_value {
                pre_pairs.pop();
                eff_pairs.pop();
            } else {
                prevail.pop();
            }
        }
    }

    // ------------------------------------------------------------------
    // Purely propositional construction
    // ------------------------------------------------------------------

    /// Dense regression Dijkstra over the full propositional abstraction.
    fn build_propositional(&mut self) {
        self.exhausted_abstract_state_space = true;

        let mut prop_in_pattern = vec![None; self.task.prop_variables().len()];
        for (pos, &var) in self.pattern.propositional.iter().enumerate() {
            prop_in_pattern[var] = Some(pos);
        }

        let mut operators = Vec::new();
        for (op_id, op) in self.task.operators().iter().enumerate() {
            self.build_abstract_operators(op, op_id, &prop_in_pattern, true, &mut operators);
        }

        let domain_sizes: Vec<usize> = self
            .pattern
            .propositional
            .iter()
            .map(|&var| self.task.domain_size(var))
            .collect();
        let mut match_tree =
            MatchTree::new(domain_sizes, self.prop_hash_multipliers.clone());
        for (index, op) in operators.iter().enumerate() {
            match_tree.insert(index, op.preconditions());
        }

        self.build_goals(&[]);

        let size = self.size;
        let mut distances = vec![f64::INFINITY; size];
        let mut queue = BinaryHeap::new();
        for state_index in 0..size {
            if self.is_goal_hash(state_index) {
                distances[state_index] = 0.0;
                queue.push(QueueEntry { cost: 0.0, state: state_index });
                self.stats.reached_goal_states += 1;
            }
        }

        while let Some(QueueEntry { cost, state }) = queue.pop() {
            if cost > distances[state] {
                continue;
            }
            for op_index in match_tree.applicable_operators(state) {
                let op = &operators[op_index];
                let predecessor = (state as i64 + op.hash_effect()) as usize;
                let alternative = distances[state] + op.cost();
                if alternative < distances[predecessor] {
                    distances[predecessor] = alternative;
                    queue.push(QueueEntry { cost: alternative, state: predecessor });
                }
            }
        }

        self.stats.generated_states = size;
        self.stats.backward_reachable_states =
            distances.iter().filter(|d| d.is_finite()).count();
        self.distances = distances;
        debug!(
            pattern = %self.pattern,
            states = self.size,
            "propositional pattern database built"
        );
    }

    // ------------------------------------------------------------------
    // Mixed numeric construction
    // ------------------------------------------------------------------

    /// Bounded forward exploration followed by backward Dijkstra.
    ///
    /// A state is charged against `max_number_states` the first time it
    /// enters the open set; re-expansions and duplicate pushes are free.
    /// States still open when the budget fires become the *fringe*: they
    /// are seeded into the backward pass at zero (goal fringe) or at the
    /// pattern's minimum action cost, which keeps all distances
    /// admissible for the unexplored remainder of the space.
    fn build_numeric(&mut self, max_number_states: usize) {
        let mut prop_in_pattern = vec![None; self.task.prop_variables().len()];
        for (pos, &var) in self.pattern.propositional.iter().enumerate() {
            prop_in_pattern[var] = Some(pos);
        }
        let mut num_in_pattern = vec![None; self.task.numeric_variables().len()];
        for (pos, &var) in self.pattern.numeric.iter().enumerate() {
            num_in_pattern[var] = Some(pos);
        }

        // Lift operators: those touching the propositional side go into
        // the match tree; operators only touching the pattern's numeric
        // side are kept in a parallel list and checked on every state.
        let mut operators = Vec::new();
        let mut numeric_only_ops: Vec<usize> = Vec::new();
        for (op_id, op) in self.task.operators().iter().enumerate() {
            let before = operators.len();
            self.build_abstract_operators(op, op_id, &prop_in_pattern, false, &mut operators);
            if operators.len() > before {
                self.min_action_cost = self.min_action_cost.min(op.cost);
                continue;
            }
            let touches_numeric = self.pattern.numeric.iter().any(|&var| {
                self.task
                    .regular_index(var)
                    .map(|idx| op.additive_effects[idx] != 0.0)
                    .unwrap_or(false)
            }) || op
                .assign_effects
                .iter()
                .any(|&(var, _)| num_in_pattern[var].is_some());
            if touches_numeric {
                numeric_only_ops.push(op_id);
                self.min_action_cost = self.min_action_cost.min(op.cost);
            }
        }

        let domain_sizes: Vec<usize> = self
            .pattern
            .propositional
            .iter()
            .map(|&var| self.task.domain_size(var))
            .collect();
        let mut match_tree =
            MatchTree::new(domain_sizes, self.prop_hash_multipliers.clone());
        for (index, op) in operators.iter().enumerate() {
            match_tree.insert(index, op.preconditions());
        }

        self.build_goals(&num_in_pattern);

        let mut registry = NumericStateRegistry::new();
        let initial = self.task.initial_state();
        let init_id = registry.insert(AbstractState::new(
            self.prop_hash_index(&initial),
            self.projected_numeric(&initial),
        ));

        let mut open = BinaryHeap::new();
        open.push(QueueEntry { cost: 0.0, state: init_id });
        let mut closed: Vec<bool> = vec![false; 1];
        let mut counted: Vec<bool> = vec![true; 1];
        let mut parents: Vec<Vec<(usize, usize)>> = vec![Vec::new(); 1];
        let mut goal_states: Vec<usize> = Vec::new();
        let mut reached_states = 0usize;

        while reached_states < max_number_states {
            let Some(QueueEntry { cost, state: state_id }) = open.pop() else {
                break;
            };
            if closed[state_id] {
                // The open list holds duplicates instead of decreasing keys.
                continue;
            }
            closed[state_id] = true;

            let state = registry.lookup(state_id).clone();
            if self.is_goal_state(&state) {
                goal_states.push(state_id);
            }

            // Applicable operators: match-tree hits filtered by their
            // projected numeric preconditions, plus every purely numeric
            // operator whose preconditions hold.
            let mut applicable: Vec<(usize, i64)> = match_tree
                .applicable_operators(state.prop_hash)
                .into_iter()
                .map(|index| (operators[index].op_id(), operators[index].hash_effect()))
                .collect();
            applicable.extend(numeric_only_ops.iter().map(|&op_id| (op_id, 0)));

            for (op_id, hash_effect) in applicable {
                let op = &self.task.operators()[op_id];
                if !self.numeric_preconditions_hold(op, &state.numeric, &num_in_pattern) {
                    continue;
                }
                let prop_successor = (state.prop_hash as i64 + hash_effect) as usize;
                let numeric_successor =
                    self.numeric_successor(&state.numeric, op, &num_in_pattern);
                let succ_id =
                    registry.insert(AbstractState::new(prop_successor, numeric_successor));
                if succ_id == state_id {
                    // Self-loops never shorten any distance.
                    continue;
                }
                if succ_id >= parents.len() {
                    parents.resize(succ_id + 1, Vec::new());
                    closed.resize(succ_id + 1, false);
                    counted.resize(succ_id + 1, false);
                }
                parents[succ_id].push((op_id, state_id));
                if !closed[succ_id] {
                    if !counted[succ_id] {
                        counted[succ_id] = true;
                        reached_states += 1;
                    }
                    open.push(QueueEntry { cost: cost + op.cost, state: succ_id });
                }
            }
        }

        if reached_states < max_number_states {
            self.exhausted_abstract_state_space = true;
        }

        let mut distances = vec![f64::INFINITY; registry.len()];
        let mut queue = BinaryHeap::new();
        for &goal_id in &goal_states {
            queue.push(QueueEntry { cost: 0.0, state: goal_id });
        }

        // Seed the fringe: states still open when the budget fired.
        let mut fringe_goal_states = 0usize;
        while let Some(QueueEntry { state: state_id, .. }) = open.pop() {
            if closed[state_id] {
                continue;
            }
            // Mark so duplicate open entries are seeded once.
            closed[state_id] = true;
            if self.is_goal_state(registry.lookup(state_id)) {
                queue.push(QueueEntry { cost: 0.0, state: state_id });
                fringe_goal_states += 1;
            } else {
                queue.push(QueueEntry { cost: self.min_action_cost, state: state_id });
            }
        }

        let mut backward_reached = 0usize;
        while let Some(QueueEntry { cost, state }) = queue.pop() {
            if cost >= distances[state] {
                continue;
            }
            distances[state] = cost;
            backward_reached += 1;
            for &(op_id, parent) in &parents[state] {
                let alternative = cost + self.task.operators()[op_id].cost;
                if alternative < distances[parent] {
                    queue.push(QueueEntry { cost: alternative, state: parent });
                }
            }
        }

        self.stats.generated_states = registry.len();
        self.stats.reached_goal_states = goal_states.len() + fringe_goal_states;
        self.stats.backward_reachable_states = backward_reached;

        // Mostly-dead registries are rebuilt with only the states that
        // carry a finite distance.
        if (backward_reached as f64) < COMPACTION_THRESHOLD * registry.len() as f64 {
            let mut compacted = NumericStateRegistry::new();
            let mut kept_distances = Vec::with_capacity(backward_reached);
            for (id, distance) in distances.iter().enumerate() {
                if distance.is_finite() {
                    compacted.insert(registry.lookup(id).clone());
                    kept_distances.push(*distance);
                }
            }
            debug!(
                pattern = %self.pattern,
                from = registry.len(),
                to = compacted.len(),
                "compacted numeric state registry"
            );
            self.stats.shrunk_from = Some(registry.len());
            registry = compacted;
            distances = kept_distances;
        }

        info!(
            pattern = %self.pattern,
            generated = self.stats.generated_states,
            goals = self.stats.reached_goal_states,
            exhausted = self.exhausted_abstract_state_space,
            "numeric pattern database built"
        );

        self.registry = Some(registry);
        self.distances = distances;
    }

    fn numeric_preconditions_hold(
        &self,
        op: &NormalizedOperator,
        numeric: &[f64],
        num_in_pattern: &[Option<usize>],
    ) -> bool {
        op.numeric_preconditions.iter().all(|pre| match pre.var_id() {
            Some(var) => match num_in_pattern[var] {
                Some(pos) => pre.satisfied(numeric[pos]),
                // Preconditions outside the pattern are projected away.
                None => true,
            },
            None => pre.constant_satisfied().unwrap_or(false),
        })
    }

    fn numeric_successor(
        &self,
        numeric: &[f64],
        op: &NormalizedOperator,
        num_in_pattern: &[Option<usize>],
    ) -> Vec<f64> {
        let mut successor = numeric.to_vec();
        for (pos, &var) in self.pattern.numeric.iter().enumerate() {
            if let Some(idx) = self.task.regular_index(var) {
                successor[pos] += op.additive_effects[idx];
            }
        }
        for &(var, value) in &op.assign_effects {
            if let Some(pos) = num_in_pattern[var] {
                successor[pos] = value;
            }
        }
        successor
    }
}

impl std::fmt::Debug for PatternDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternDatabase")
            .field("pattern", &self.pattern)
            .field("size", &self.size)
            .field("stored_states", &self.distances.len())
            .field("exhausted", &self.exhausted_abstract_state_space)
            .finish()
    }
}

fn checked_size_product(current: usize, domain: usize, pattern: &Pattern) -> Result<usize> {
    current
        .checked_mul(domain)
        .filter(|&product| product <= i32::MAX as usize)
        .ok_or_else(|| {
            EngineError::Overflow(format!("domain size product of pattern {pattern}"))
        })
}
