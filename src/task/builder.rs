//! Builder Patterns for Task Construction
//!
//! Fluent API for assembling a [`PlanningTask`] programmatically,
//! particularly useful for tests.
//!
//! ## Example
//!
//! ```rust
//! use numplan::task::{TaskBuilder, OperatorBuilder};
//!
//! let mut builder = TaskBuilder::new();
//! let a = builder.prop_variable("a", 2);
//! let x = builder.numeric_variable("x", 0.0);
//! let one = builder.numeric_constant(1.0);
//!
//! builder.add_operator(
//!     OperatorBuilder::new("step")
//!         .precondition(a, 0)
//!         .effect(a, 1)
//!         .increase(x, one)
//!         .cost(1.0),
//! );
//! builder.goal(a, 1);
//! let task = builder.build();
//! assert_eq!(task.operators.len(), 1);
//! ```

use crate::condition::Comparator;
use crate::expression::ArithOp;

use super::{
    AssignmentAxiom, ComparisonAxiom, Effect, Fact, NumericEffect, NumericEffectOp, NumericKind,
    NumericVariable, Operator, PlanningTask, PropVariable,
};

/// Builder for a complete [`PlanningTask`].
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    task: PlanningTask,
}

impl TaskBuilder {
    pub fn new() -> TaskBuilder {
        TaskBuilder::default()
    }

    /// Add a finite-domain variable with initial value 0; returns its id.
    pub fn prop_variable(&mut self, name: &str, domain_size: usize) -> usize {
        let id = self.task.prop_variables.len();
        self.task.prop_variables.push(PropVariable {
            name: name.to_string(),
            domain_size,
        });
        self.task.initial_propositional.push(0);
        id
    }

    /// Set the initial value of a propositional variable.
    pub fn initial_value(&mut self, var: usize, value: usize) -> &mut Self {
        self.task.initial_propositional[var] = value;
        self
    }

    /// Add a regular numeric variable; returns its global numeric id.
    pub fn numeric_variable(&mut self, name: &str, initial_value: f64) -> usize {
        self.add_numeric(name.to_string(), NumericKind::Regular, initial_value)
    }

    /// Add an immutable numeric constant; returns its global numeric id.
    pub fn numeric_constant(&mut self, value: f64) -> usize {
        let name = format!("const{value}");
        self.add_numeric(name, NumericKind::Constant, value)
    }

    /// Add an instrumentation (metric) variable; returns its global id.
    pub fn instrumentation_variable(&mut self, name: &str) -> usize {
        self.add_numeric(name.to_string(), NumericKind::Instrumentation, 0.0)
    }

    /// Add a derived numeric variable defined by `lhs op rhs`.
    pub fn derived_numeric(&mut self, name: &str, lhs: usize, op: ArithOp, rhs: usize) -> usize {
        let id = self.add_numeric(name.to_string(), NumericKind::Derived, 0.0);
        self.task.assignment_axioms.push(AssignmentAxiom {
            affected: id,
            lhs,
            op,
            rhs,
        });
        id
    }

    /// Add a comparison axiom `lhs cmp rhs`, backed by a fresh derived
    /// propositional variable with domain {0, 1}; returns that variable.
    pub fn comparison(&mut self, name: &str, lhs: usize, comparator: Comparator, rhs: usize) -> usize {
        let derived_var = self.prop_variable(name, 2);
        self.task.comparison_axioms.push(ComparisonAxiom {
            derived_var,
            lhs,
            comparator,
            rhs,
        });
        derived_var
    }

    /// Add a goal fact. Facts on comparison-derived variables (value 1)
    /// encode numeric goals.
    pub fn goal(&mut self, var: usize, value: usize) -> &mut Self {
        self.task.goals.push(Fact { var, value });
        self
    }

    pub fn add_operator(&mut self, operator: impl Into<Operator>) -> &mut Self {
        self.task.operators.push(operator.into());
        self
    }

    pub fn build(self) -> PlanningTask {
        self.task
    }

    fn add_numeric(&mut self, name: String, kind: NumericKind, initial_value: f64) -> usize {
        let id = self.task.numeric_variables.len();
        self.task.numeric_variables.push(NumericVariable {
            name,
            kind,
            initial_value,
        });
        id
    }
}

/// Builder for a single ground [`Operator`].
#[derive(Debug, Clone)]
pub struct OperatorBuilder {
    operator: Operator,
}

impl OperatorBuilder {
    pub fn new(name: &str) -> OperatorBuilder {
        OperatorBuilder {
            operator: Operator {
                name: name.to_string(),
                preconditions: Vec::new(),
                effects: Vec::new(),
                numeric_effects: Vec::new(),
                cost: 1.0,
            },
        }
    }

    pub fn precondition(mut self, var: usize, value: usize) -> Self {
        self.operator.preconditions.push(Fact { var, value });
        self
    }

    pub fn effect(mut self, var: usize, value: usize) -> Self {
        self.operator.effects.push(Fact { var, value }.into());
        self
    }

    /// Add a conditional propositional effect (kept for fragment checks;
    /// normalization rejects operators that use it).
    pub fn conditional_effect(mut self, conditions: Vec<Fact>, var: usize, value: usize) -> Self {
        self.operator.effects.push(Effect {
            conditions,
            fact: Fact { var, value },
        });
        self
    }

    /// `affected += value(operand)`
    pub fn increase(mut self, affected: usize, operand: usize) -> Self {
        self.operator.numeric_effects.push(NumericEffect {
            op: NumericEffectOp::Increase,
            affected,
            operand,
        });
        self
    }

    /// `affected -= value(operand)`
    pub fn decrease(mut self, affected: usize, operand: usize) -> Self {
        self.operator.numeric_effects.push(NumericEffect {
            op: NumericEffectOp::Decrease,
            affected,
            operand,
        });
        self
    }

    /// `affected := value(operand)`
    pub fn assign(mut self, affected: usize, operand: usize) -> Self {
        self.operator.numeric_effects.push(NumericEffect {
            op: NumericEffectOp::Assign,
            affected,
            operand,
        });
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.operator.cost = cost;
        self
    }

    pub fn build(self) -> Operator {
        self.operator
    }
}

impl From<OperatorBuilder> for Operator {
    fn from(builder: OperatorBuilder) -> Operator {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assembles_task() {
        let mut builder = TaskBuilder::new();
        let a = builder.prop_variable("a", 3);
        let x = builder.numeric_variable("x", 2.5);
        let five = builder.numeric_constant(5.0);
        let d = builder.derived_numeric("d", x, ArithOp::Sub, five);
        let cmp = builder.comparison("d_ge_0", d, Comparator::Ge, five);

        builder.add_operator(
            OperatorBuilder::new("op")
                .precondition(a, 0)
                .effect(a, 2)
                .increase(x, five)
                .cost(3.0),
        );
        builder.goal(a, 2).goal(cmp, 1);
        builder.initial_value(a, 1);

        let task = builder.build();
        assert_eq!(task.prop_variables.len(), 2);
        assert_eq!(task.numeric_variables.len(), 3);
        assert_eq!(task.assignment_axioms.len(), 1);
        assert_eq!(task.comparison_axioms.len(), 1);
        assert_eq!(task.goals.len(), 2);
        assert_eq!(task.initial_propositional, vec![1, 0]);
        assert_eq!(task.operators[0].cost, 3.0);
        assert_eq!(task.operators[0].numeric_effects.len(), 1);
    }
}
