//! Numeric Causal Graph
//!
//! Variable-dependency graph over the union of concrete propositional
//! variables and regular numeric variables (auxiliaries included). Every
//! operator contributes pre→eff arcs from each precondition variable to
//! each effect variable, and eff↔eff edges between every pair of effect
//! variables; additive effects with delta 0 contribute nothing.
//!
//! Variables are mapped onto one contiguous joint index space,
//! propositional half first, and every query answers in terms of original
//! ids, partitioned by half. The graph is built once per task and cached
//! inside [`NormalizedTask`] for the task's lifetime.

use std::collections::HashSet;
use std::io;

use tracing::debug;

use crate::task::NormalizedTask;

type Relation = Vec<Vec<usize>>;

/// Accumulates pairs, then freezes into sorted duplicate-free adjacency.
struct RelationBuilder {
    sets: Vec<HashSet<usize>>,
}

impl RelationBuilder {
    fn new(range: usize) -> RelationBuilder {
        RelationBuilder { sets: vec![HashSet::new(); range] }
    }

    fn add_pair(&mut self, u: usize, v: usize) {
        self.sets[u].insert(v);
    }

    fn build(self) -> Relation {
        self.sets
            .into_iter()
            .map(|set| {
                let mut row: Vec<usize> = set.into_iter().collect();
                row.sort_unstable();
                row
            })
            .collect()
    }
}

/// The causal graph of a normalized task.
pub struct CausalGraph {
    /// Joint index per propositional variable (None for comparison-derived).
    prop_to_joint: Vec<Option<usize>>,
    /// Joint index per global numeric variable (None for non-regular).
    num_to_joint: Vec<Option<usize>>,
    /// Original id per joint index.
    joint_to_var: Vec<usize>,
    /// Joint indices below this are propositional.
    first_numeric_index: usize,

    pre_to_eff: Relation,
    eff_to_pre: Relation,
    eff_to_eff: Relation,
    successors: Relation,
    predecessors: Relation,
}

impl CausalGraph {
    pub fn new(task: &NormalizedTask) -> CausalGraph {
        let num_prop = task.num_concrete_prop_variables();
        let num_regular = task.num_regular_numeric_variables();
        let range = num_prop + num_regular;

        let mut prop_to_joint = vec![None; task.prop_variables().len()];
        let mut num_to_joint = vec![None; task.numeric_variables().len()];
        let mut joint_to_var = vec![0; range];
        let mut next = 0;
        for var in 0..task.prop_variables().len() {
            if !task.is_comparison_variable(var) {
                prop_to_joint[var] = Some(next);
                joint_to_var[next] = var;
                next += 1;
            }
        }
        for regular_index in 0..num_regular {
            let global_id = task.global_of_regular(regular_index);
            num_to_joint[global_id] = Some(next);
            joint_to_var[next] = global_id;
            next += 1;
        }

        let mut pre_eff = RelationBuilder::new(range);
        let mut eff_pre = RelationBuilder::new(range);
        let mut eff_eff = RelationBuilder::new(range);
        let mut succ = RelationBuilder::new(range);
        let mut pred = RelationBuilder::new(range);

        for op in task.operators() {
            let mut pre_vars: Vec<usize> = op
                .propositional_preconditions
                .iter()
                .filter_map(|pre| prop_to_joint[pre.var])
                .collect();
            pre_vars.extend(
                op.numeric_preconditions
                    .iter()
                    .filter_map(|pre| pre.var_id())
                    .filter_map(|var| num_to_joint[var]),
            );

            let mut eff_vars: Vec<usize> = op
                .propositional_effects
                .iter()
                .filter_map(|eff| prop_to_joint[eff.var])
                .collect();
            for (regular_index, &delta) in op.additive_effects.iter().enumerate() {
                if delta != 0.0 {
                    let global_id = task.global_of_regular(regular_index);
                    if let Some(joint) = num_to_joint[global_id] {
                        eff_vars.push(joint);
                    }
                }
            }
            for &(global_id, _) in &op.assign_effects {
                if let Some(joint) = num_to_joint[global_id] {
                    eff_vars.push(joint);
                }
            }
            eff_vars.sort_unstable();
            eff_vars.dedup();

            for &u in &pre_vars {
                for &v in &eff_vars {
                    if u != v {
                        pre_eff.add_pair(u, v);
                        succ.add_pair(u, v);
                        eff_pre.add_pair(v, u);
                        pred.add_pair(v, u);
                    }
                }
            }
            for (i, &u) in eff_vars.iter().enumerate() {
                for &v in &eff_vars[i + 1..] {
                    eff_eff.add_pair(u, v);
                    eff_eff.add_pair(v, u);
                    succ.add_pair(u, v);
                    succ.add_pair(v, u);
                    pred.add_pair(u, v);
                    pred.add_pair(v, u);
                }
            }
        }

        debug!(prop = num_prop, numeric = num_regular, "causal graph built");

        CausalGraph {
            prop_to_joint,
            num_to_joint,
            joint_to_var,
            first_numeric_index: num_prop,
            pre_to_eff: pre_eff.build(),
            eff_to_pre: eff_pre.build(),
            eff_to_eff: eff_eff.build(),
            successors: succ.build(),
            predecessors: pred.build(),
        }
    }

    fn prop_half(&self, relation: &Relation, joint: Option<usize>) -> Vec<usize> {
        match joint {
            None => Vec::new(),
            Some(idx) => relation[idx]
                .iter()
                .filter(|&&v| v < self.first_numeric_index)
                .map(|&v| self.joint_to_var[v])
                .collect(),
        }
    }

    fn numeric_half(&self, relation: &Relation, joint: Option<usize>) -> Vec<usize> {
        match joint {
            None => Vec::new(),
            Some(idx) => relation[idx]
                .iter()
                .filter(|&&v| v >= self.first_numeric_index)
                .map(|&v| self.joint_to_var[v])
                .collect(),
        }
    }

    /// Propositional precondition variables of operators affecting `prop_var`.
    pub fn prop_eff_to_prop_pre(&self, prop_var: usize) -> Vec<usize> {
        self.prop_half(&self.eff_to_pre, self.prop_to_joint[prop_var])
    }

    /// Numeric precondition variables of operators affecting `prop_var`.
    pub fn prop_eff_to_num_pre(&self, prop_var: usize) -> Vec<usize> {
        self.numeric_half(&self.eff_to_pre, self.prop_to_joint[prop_var])
    }

    /// Propositional precondition variables of operators affecting `num_var`.
    pub fn num_eff_to_prop_pre(&self, num_var: usize) -> Vec<usize> {
        self.prop_half(&self.eff_to_pre, self.num_to_joint[num_var])
    }

    /// Numeric precondition variables of operators affecting `num_var`.
    pub fn num_eff_to_num_pre(&self, num_var: usize) -> Vec<usize> {
        self.numeric_half(&self.eff_to_pre, self.num_to_joint[num_var])
    }

    /// Numeric co-effect variables of operators affecting `num_var`.
    pub fn num_eff_to_num_eff(&self, num_var: usize) -> Vec<usize> {
        self.numeric_half(&self.eff_to_eff, self.num_to_joint[num_var])
    }

    /// Propositional predecessors (pre→eff or eff↔eff) of `prop_var`.
    pub fn prop_predecessors_of_prop_var(&self, prop_var: usize) -> Vec<usize> {
        self.prop_half(&self.predecessors, self.prop_to_joint[prop_var])
    }

    /// Propositional predecessors of a numeric variable.
    pub fn prop_predecessors_of_num_var(&self, num_var: usize) -> Vec<usize> {
        self.prop_half(&self.predecessors, self.num_to_joint[num_var])
    }

    /// Numeric predecessors of a propositional variable.
    pub fn num_predecessors_of_prop_var(&self, prop_var: usize) -> Vec<usize> {
        self.numeric_half(&self.predecessors, self.prop_to_joint[prop_var])
    }

    /// Numeric predecessors of a numeric variable.
    pub fn num_predecessors_of_num_var(&self, num_var: usize) -> Vec<usize> {
        self.numeric_half(&self.predecessors, self.num_to_joint[num_var])
    }

    /// Successor lists are exposed for symmetry and debugging.
    pub fn successors_of_joint(&self, joint: usize) -> &[usize] {
        &self.successors[joint]
    }

    pub fn pre_to_eff_of_joint(&self, joint: usize) -> &[usize] {
        &self.pre_to_eff[joint]
    }

    /// Write the graph in GraphViz dot format.
    pub fn to_dot(&self, task: &NormalizedTask, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(out, "digraph CausalGraph {{")?;
        for (joint, &var) in self.joint_to_var.iter().enumerate() {
            let label = if joint < self.first_numeric_index {
                &task.prop_variables()[var].name
            } else {
                &task.numeric_variables()[var].name
            };
            writeln!(out, "    {joint} [label=\"{label}\"];")?;
        }
        for (joint, row) in self.successors.iter().enumerate() {
            for &succ in row {
                writeln!(out, "    {joint} -> {succ};")?;
            }
        }
        writeln!(out, "}}")
    }
}
