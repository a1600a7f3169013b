//! Raw Task Model
//!
//! In-memory representation of a numeric planning task as handed to the
//! engine by the surrounding system: finite-domain variables, typed
//! numeric variables, operators with propositional and numeric effects,
//! comparison and assignment axioms, goals, and the initial state.
//!
//! The raw model is deliberately liberal; [`normalize::NormalizedTask`]
//! verifies the supported fragment and rejects everything else with a
//! typed error. Nothing here is interpreted yet.
//!
//! ## Builders
//!
//! For programmatic construction (and for tests), see [`builder::TaskBuilder`]
//! which provides a fluent API over the raw model.

use serde::{Deserialize, Serialize};

use crate::condition::Comparator;
use crate::expression::ArithOp;

pub mod builder;
pub mod normalize;

pub use builder::{OperatorBuilder, TaskBuilder};
pub use normalize::{NormalizedOperator, NormalizedTask};

/// Categories of numeric variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    /// Unbounded real mutated by operators.
    Regular,
    /// Immutable value fixed by the initial state.
    Constant,
    /// Defined by an assignment axiom over other numeric variables.
    Derived,
    /// Metric/cost accumulator; ignored by pattern databases.
    Instrumentation,
    /// Synthesized during normalization to reduce a two-variable
    /// comparison to a single-variable one; regular downstream.
    Auxiliary,
}

/// A finite-domain variable with values `0..domain_size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropVariable {
    pub name: String,
    pub domain_size: usize,
}

/// A numeric variable with its category and initial value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericVariable {
    pub name: String,
    pub kind: NumericKind,
    pub initial_value: f64,
}

/// A propositional atom `var = value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    pub var: usize,
    pub value: usize,
}

/// A propositional effect, optionally guarded by effect conditions.
///
/// Conditional effects are outside the supported fragment; normalization
/// rejects any effect whose condition list is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub conditions: Vec<Fact>,
    pub fact: Fact,
}

impl From<Fact> for Effect {
    fn from(fact: Fact) -> Self {
        Effect { conditions: Vec::new(), fact }
    }
}

/// The three numeric effect shapes of the supported fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericEffectOp {
    /// `affected += value(operand)`
    Increase,
    /// `affected -= value(operand)`
    Decrease,
    /// `affected := value(operand)`
    Assign,
}

/// A numeric effect; the operand names a numeric variable whose
/// (constant-foldable) expression supplies the delta or assigned value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NumericEffect {
    pub op: NumericEffectOp,
    /// Affected numeric variable (global id; must be regular).
    pub affected: usize,
    /// Operand numeric variable (global id; constant or derived-constant).
    pub operand: usize,
}

/// A ground operator of the raw task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    /// Propositional preconditions; facts on comparison-derived variables
    /// encode numeric preconditions.
    pub preconditions: Vec<Fact>,
    pub effects: Vec<Effect>,
    pub numeric_effects: Vec<NumericEffect>,
    pub cost: f64,
}

/// A comparison axiom: the derived propositional variable holds value 1
/// exactly when `lhs cmp rhs` holds between the two numeric variables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComparisonAxiom {
    /// Derived propositional variable (domain {0, 1}).
    pub derived_var: usize,
    pub lhs: usize,
    pub comparator: Comparator,
    pub rhs: usize,
}

/// An assignment axiom: the derived numeric variable equals
/// `lhs op rhs` over two numeric variables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssignmentAxiom {
    /// Derived numeric variable being defined.
    pub affected: usize,
    pub lhs: usize,
    pub op: ArithOp,
    pub rhs: usize,
}

/// A complete raw numeric planning task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningTask {
    pub prop_variables: Vec<PropVariable>,
    pub numeric_variables: Vec<NumericVariable>,
    pub operators: Vec<Operator>,
    pub comparison_axioms: Vec<ComparisonAxiom>,
    pub assignment_axioms: Vec<AssignmentAxiom>,
    /// Goal conjunction; facts on comparison-derived variables encode
    /// numeric goals.
    pub goals: Vec<Fact>,
    /// Initial propositional state, one value per propositional variable.
    pub initial_propositional: Vec<usize>,
}

impl Default for PropVariable {
    fn default() -> Self {
        PropVariable { name: String::new(), domain_size: 2 }
    }
}

/// A concrete search state as seen by the heuristic interface.
///
/// The numeric side holds one value per *regular* numeric variable
/// (auxiliaries included), indexed by regular index; constant and derived
/// variables are reconstructed on demand by the normalized task.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub propositional: Vec<usize>,
    pub numeric: Vec<f64>,
}

impl State {
    pub fn new(propositional: Vec<usize>, numeric: Vec<f64>) -> State {
        State { propositional, numeric }
    }
}
