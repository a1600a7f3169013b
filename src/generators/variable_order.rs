//! Variable Order Finder
//!
//! Produces the variable sequence the greedy generator consumes. Both
//! goal relevance and causal connectivity to already-selected variables
//! drive the order; which of the two criteria wins ties is the order
//! type. Numeric variables can be preferred up front.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use serde::{Deserialize, Serialize};

use crate::task::NormalizedTask;

/// Selection discipline for the next variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableOrderType {
    /// Causally connected variables first, then goal variables, ties by
    /// level.
    CausalGoalLevel,
    /// Like [`Self::CausalGoalLevel`] with randomized tie-breaking.
    CausalGoalRandom,
    /// Goal variables first, then causally connected ones.
    GoalCausalLevel,
}

/// One candidate variable: propositional or numeric (global id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedVariable {
    pub id: usize,
    pub is_numeric: bool,
}

/// Iterates task variables in the configured order.
pub struct VariableOrderFinder {
    order_type: VariableOrderType,
    remaining: Vec<OrderedVariable>,
    selected: Vec<OrderedVariable>,
    /// Joint flag space: propositional ids, then numeric ids offset by
    /// the propositional count.
    is_causal_predecessor: Vec<bool>,
    is_goal_variable: Vec<bool>,
    is_numeric_goal_variable: Vec<bool>,
    num_prop_variables: usize,
}

impl VariableOrderFinder {
    pub fn new(
        task: &NormalizedTask,
        order_type: VariableOrderType,
        numeric_variables_first: bool,
        rng: &mut StdRng,
    ) -> VariableOrderFinder {
        let num_prop = task.prop_variables().len();
        let num_numeric = task.numeric_variables().len();

        let numeric_vars = (0..task.num_regular_numeric_variables())
            .map(|idx| OrderedVariable { id: task.global_of_regular(idx), is_numeric: true });
        let prop_vars = (0..num_prop)
            .filter(|&var| !task.is_comparison_variable(var))
            .map(|id| OrderedVariable { id, is_numeric: false });

        let mut remaining: Vec<OrderedVariable> = if numeric_variables_first {
            numeric_vars.chain(prop_vars).collect()
        } else {
            prop_vars.chain(numeric_vars).collect()
        };

        if order_type == VariableOrderType::CausalGoalRandom {
            remaining.shuffle(rng);
        }

        let mut is_goal_variable = vec![false; num_prop];
        for goal in task.propositional_goals() {
            is_goal_variable[goal.var] = true;
        }
        let mut is_numeric_goal_variable = vec![false; num_numeric];
        for goal in task.numeric_goals() {
            if let Some(var) = goal.var_id() {
                is_numeric_goal_variable[var] = true;
            }
        }

        VariableOrderFinder {
            order_type,
            remaining,
            selected: Vec::new(),
            is_causal_predecessor: vec![false; num_prop + num_numeric],
            is_goal_variable,
            is_numeric_goal_variable,
            num_prop_variables: num_prop,
        }
    }

    pub fn done(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn selected(&self) -> &[OrderedVariable] {
        &self.selected
    }

    /// The next variable of the order, or `None` when no remaining
    /// variable is goal-relevant or causally connected.
    pub fn next(&mut self, task: &NormalizedTask) -> Option<OrderedVariable> {
        debug_assert!(!self.done());
        let position = match self.order_type {
            VariableOrderType::CausalGoalLevel | VariableOrderType::CausalGoalRandom => self
                .find_causal_predecessor()
                .or_else(|| self.find_goal_variable()),
            VariableOrderType::GoalCausalLevel => self
                .find_goal_variable()
                .or_else(|| self.find_causal_predecessor()),
        }?;
        Some(self.select(position, task))
    }

    fn find_causal_predecessor(&self) -> Option<usize> {
        self.remaining.iter().position(|var| {
            let flag_index = if var.is_numeric {
                self.num_prop_variables + var.id
            } else {
                var.id
            };
            self.is_causal_predecessor[flag_index]
        })
    }

    fn find_goal_variable(&self) -> Option<usize> {
        self.remaining.iter().position(|var| {
            if var.is_numeric {
                self.is_numeric_goal_variable[var.id]
            } else {
                self.is_goal_variable[var.id]
            }
        })
    }

    fn select(&mut self, position: usize, task: &NormalizedTask) -> OrderedVariable {
        let var = self.remaining.remove(position);
        self.selected.push(var);

        let cg = task.causal_graph();
        let (prop_pre, num_pre) = if var.is_numeric {
            (cg.num_eff_to_prop_pre(var.id), cg.num_eff_to_num_pre(var.id))
        } else {
            (cg.prop_eff_to_prop_pre(var.id), cg.prop_eff_to_num_pre(var.id))
        };
        for pre in prop_pre {
            self.is_causal_predecessor[pre] = true;
        }
        for pre in num_pre {
            self.is_causal_predecessor[self.num_prop_variables + pre] = true;
        }
        var
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Comparator;
    use crate::task::builder::{OperatorBuilder, TaskBuilder};
    use rand::SeedableRng;

    /// Goal on a; a's achiever needs b; b's achiever needs x >= 1.
    fn chain() -> std::rc::Rc<NormalizedTask> {
        let mut builder = TaskBuilder::new();
        let a = builder.prop_variable("a", 2);
        let b = builder.prop_variable("b", 2);
        let x = builder.numeric_variable("x", 0.0);
        let one = builder.numeric_constant(1.0);
        let x_ge_1 = builder.comparison("x_ge_1", x, Comparator::Ge, one);
        builder.add_operator(OperatorBuilder::new("sa").precondition(b, 1).effect(a, 1));
        builder.add_operator(
            OperatorBuilder::new("sb").precondition(x_ge_1, 1).effect(b, 1),
        );
        builder.add_operator(OperatorBuilder::new("gx").increase(x, one));
        builder.goal(a, 1);
        crate::task::NormalizedTask::new(builder.build()).unwrap()
    }

    #[test]
    fn test_goal_causal_level_order() {
        let task = chain();
        let mut rng = StdRng::seed_from_u64(0);
        let mut finder = VariableOrderFinder::new(
            &task,
            VariableOrderType::GoalCausalLevel,
            false,
            &mut rng,
        );
        // Goal variable a first, then its causal predecessors: b, then x.
        let order: Vec<OrderedVariable> =
            std::iter::from_fn(|| if finder.done() { None } else { finder.next(&task) }).collect();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], OrderedVariable { id: 0, is_numeric: false });
        assert_eq!(order[1], OrderedVariable { id: 1, is_numeric: false });
        assert_eq!(order[2], OrderedVariable { id: 0, is_numeric: true });
    }

    #[test]
    fn test_stops_on_disconnected_variables() {
        let mut builder = TaskBuilder::new();
        let a = builder.prop_variable("a", 2);
        builder.prop_variable("isolated", 2);
        builder.add_operator(OperatorBuilder::new("sa").effect(a, 1));
        builder.goal(a, 1);
        let task = crate::task::NormalizedTask::new(builder.build()).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let mut finder = VariableOrderFinder::new(
            &task,
            VariableOrderType::GoalCausalLevel,
            false,
            &mut rng,
        );
        assert!(finder.next(&task).is_some());
        // The isolated variable is neither goal nor causally connected.
        assert!(finder.next(&task).is_none());
        assert!(!finder.done());
    }

    #[test]
    fn test_numeric_variables_first() {
        let task = chain();
        let mut rng = StdRng::seed_from_u64(0);
        let finder =
            VariableOrderFinder::new(&task, VariableOrderType::CausalGoalLevel, true, &mut rng);
        assert!(finder.remaining[0].is_numeric);
    }

    #[test]
    fn test_random_order_is_seed_deterministic() {
        let task = chain();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let f1 = VariableOrderFinder::new(
            &task,
            VariableOrderType::CausalGoalRandom,
            false,
            &mut rng1,
        );
        let f2 = VariableOrderFinder::new(
            &task,
            VariableOrderType::CausalGoalRandom,
            false,
            &mut rng2,
        );
        assert_eq!(f1.remaining, f2.remaining);
    }
}
