//! Greedy Pattern Generator
//!
//! Builds a single pattern by walking a variable order and adding
//! variables while the product of their (approximate, on the numeric
//! side) domain sizes stays inside the abstract-state budget.

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::errors::Result;
use crate::task::NormalizedTask;
use crate::types::Pattern;
use crate::validation::validate_and_normalize_pattern;

use super::variable_order::{VariableOrderFinder, VariableOrderType};
use super::PatternGenerator;

pub struct PatternGeneratorGreedy {
    max_states: usize,
    order_type: VariableOrderType,
    prefer_numeric_variables: bool,
    seed: u64,
}

impl PatternGeneratorGreedy {
    pub fn new(
        max_states: usize,
        order_type: VariableOrderType,
        prefer_numeric_variables: bool,
        seed: u64,
    ) -> PatternGeneratorGreedy {
        PatternGeneratorGreedy { max_states, order_type, prefer_numeric_variables, seed }
    }

    pub fn from_config(config: &crate::config::Config) -> PatternGeneratorGreedy {
        PatternGeneratorGreedy::new(
            config.pdb.max_pdb_size,
            config.ordering.variable_order,
            config.ordering.prefer_numeric_variables,
            config.hill_climbing.seed,
        )
    }
}

impl PatternGenerator for PatternGeneratorGreedy {
    fn generate(&self, task: &Rc<NormalizedTask>) -> Result<Pattern> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order =
            VariableOrderFinder::new(task, self.order_type, self.prefer_numeric_variables, &mut rng);

        let mut pattern = Pattern::default();
        let mut size: usize = 1;
        while !order.done() {
            let Some(var) = order.next(task) else {
                // Only disconnected variables remain.
                break;
            };
            let var_size = if var.is_numeric {
                task.approximate_domain_size(var.id)?
            } else {
                task.domain_size(var.id)
            };
            match size.checked_mul(var_size) {
                Some(product) if product <= self.max_states => size = product,
                _ => break,
            }
            if var.is_numeric {
                pattern.numeric.push(var.id);
            } else {
                pattern.propositional.push(var.id);
            }
        }

        validate_and_normalize_pattern(task, &mut pattern)?;
        info!(%pattern, size, "greedy pattern");
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Comparator;
    use crate::task::builder::{OperatorBuilder, TaskBuilder};

    /// Goal chain a <- b plus a numeric goal on x.
    fn task() -> Rc<NormalizedTask> {
        let mut builder = TaskBuilder::new();
        let a = builder.prop_variable("a", 2);
        let b = builder.prop_variable("b", 4);
        let x = builder.numeric_variable("x", 0.0);
        let one = builder.numeric_constant(1.0);
        let three = builder.numeric_constant(3.0);
        let cmp = builder.comparison("x_ge_3", x, Comparator::Ge, three);
        builder.add_operator(OperatorBuilder::new("sa").precondition(b, 1).effect(a, 1));
        builder.add_operator(OperatorBuilder::new("sb").effect(b, 1));
        builder.add_operator(OperatorBuilder::new("gx").increase(x, one));
        builder.goal(a, 1).goal(cmp, 1);
        NormalizedTask::new(builder.build()).unwrap()
    }

    #[test]
    fn test_greedy_respects_budget() {
        let task = task();
        // Budget 2 fits only the first goal variable (domain 2).
        let generator =
            PatternGeneratorGreedy::new(2, VariableOrderType::GoalCausalLevel, false, 0);
        let pattern = generator.generate(&task).unwrap();
        assert_eq!(pattern.len(), 1);
        assert_eq!(pattern.propositional, vec![0]);
    }

    #[test]
    fn test_greedy_collects_connected_variables() {
        let task = task();
        let generator =
            PatternGeneratorGreedy::new(1_000_000, VariableOrderType::GoalCausalLevel, false, 0);
        let pattern = generator.generate(&task).unwrap();
        // a, its causal predecessor b, and the numeric goal variable.
        assert_eq!(pattern.propositional, vec![0, 1]);
        assert_eq!(pattern.numeric, vec![0]);
    }

    #[test]
    fn test_greedy_prefers_numeric_when_asked() {
        let task = task();
        let generator =
            PatternGeneratorGreedy::new(5, VariableOrderType::GoalCausalLevel, true, 0);
        let pattern = generator.generate(&task).unwrap();
        // The numeric goal variable comes first and exhausts the budget
        // (approximate domain size 5: span [0, 4] at step 1).
        assert_eq!(pattern.numeric, vec![0]);
        assert!(pattern.propositional.is_empty());
    }
}
