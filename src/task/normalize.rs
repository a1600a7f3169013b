//! Task Normalization
//!
//! Wraps a raw [`PlanningTask`] and rewrites it into the fragment the
//! pattern-database machinery understands:
//!
//! - every precondition or goal on a comparison-derived variable becomes a
//!   [`RegularNumericCondition`] over a single regular numeric variable,
//!   unfolding the assignment-axiom DAG into expression trees;
//! - comparisons that still relate two regular variables after
//!   simplification are rewritten through a synthesized *auxiliary*
//!   variable `z := lhs - rhs`, compared against zero;
//! - operators are flattened into propositional preconditions/effects,
//!   numeric preconditions, dense additive effects, and assignment
//!   effects;
//! - each regular numeric variable gets an approximate reachable-value
//!   count used by size budgets.
//!
//! Everything outside the fragment (conditional effects, non-constant
//! numeric effect operands, effects on derived variables, assignments
//! mixed with auxiliary dependence) aborts construction with a typed
//! error.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::causal_graph::CausalGraph;
use crate::condition::{Comparator, RegularNumericCondition};
use crate::errors::{EngineError, Result};
use crate::expression::{ArithExpr, ArithOp};

use super::{
    Fact, NumericEffectOp, NumericKind, NumericVariable, PlanningTask, PropVariable, State,
};

/// An operator after normalization.
#[derive(Debug, Clone)]
pub struct NormalizedOperator {
    pub name: String,
    pub cost: f64,
    /// Preconditions on non-derived propositional variables.
    pub propositional_preconditions: Vec<Fact>,
    /// Preconditions resolved from comparison-derived variables.
    pub numeric_preconditions: Vec<Rc<RegularNumericCondition>>,
    /// Unconditional propositional assignments.
    pub propositional_effects: Vec<Fact>,
    /// Additive deltas, one entry per regular numeric variable
    /// (auxiliaries included).
    pub additive_effects: Vec<f64>,
    /// Full assignments `var := value`, keyed by global numeric id.
    pub assign_effects: Vec<(usize, f64)>,
}

impl NormalizedOperator {
    /// True iff the operator changes any numeric variable.
    pub fn has_numeric_effect(&self) -> bool {
        !self.assign_effects.is_empty() || self.additive_effects.iter().any(|&d| d != 0.0)
    }
}

/// Truth source for one comparison axiom after resolution.
#[derive(Debug, Clone)]
enum ResolvedComparison {
    Condition(Rc<RegularNumericCondition>),
    Constant(bool),
}

/// A normalized numeric planning task.
///
/// Immutable after construction; shared by reference between pattern
/// databases, generators, and heuristics.
pub struct NormalizedTask {
    prop_variables: Vec<PropVariable>,
    numeric_variables: Vec<NumericVariable>,
    is_comparison_var: Vec<bool>,
    comparison_axiom_of_var: Vec<Option<usize>>,
    resolved_comparisons: Vec<ResolvedComparison>,
    /// Global numeric id per regular index; auxiliaries come last.
    regular_to_global: Vec<usize>,
    global_to_regular: Vec<Option<usize>>,
    auxiliary_exprs: Vec<(usize, Rc<ArithExpr>)>,
    operators: Vec<NormalizedOperator>,
    propositional_goals: Vec<Fact>,
    numeric_goals: Vec<Rc<RegularNumericCondition>>,
    initial_propositional: Vec<usize>,
    /// Initial values per regular index (auxiliaries seeded from their
    /// defining expression).
    initial_numeric: Vec<f64>,
    approx_domain_sizes: RefCell<HashMap<usize, usize>>,
    causal_graph: OnceCell<CausalGraph>,
}

impl NormalizedTask {
    pub fn new(task: PlanningTask) -> Result<Rc<NormalizedTask>> {
        Normalizer::new(task)?.finish().map(Rc::new)
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    pub fn prop_variables(&self) -> &[PropVariable] {
        &self.prop_variables
    }

    pub fn domain_size(&self, var: usize) -> usize {
        self.prop_variables[var].domain_size
    }

    /// True iff the propositional variable is derived from a comparison
    /// axiom (and therefore invisible to patterns and effects).
    pub fn is_comparison_variable(&self, var: usize) -> bool {
        self.is_comparison_var[var]
    }

    /// Number of propositional variables that are not comparison-derived.
    pub fn num_concrete_prop_variables(&self) -> usize {
        self.is_comparison_var.iter().filter(|&&d| !d).count()
    }

    pub fn numeric_variables(&self) -> &[NumericVariable] {
        &self.numeric_variables
    }

    pub fn numeric_kind(&self, global_id: usize) -> NumericKind {
        self.numeric_variables[global_id].kind
    }

    /// Number of regular numeric variables, auxiliaries included.
    pub fn num_regular_numeric_variables(&self) -> usize {
        self.regular_to_global.len()
    }

    /// Regular index of a global numeric id, if the variable is regular
    /// or auxiliary.
    pub fn regular_index(&self, global_id: usize) -> Option<usize> {
        self.global_to_regular[global_id]
    }

    pub fn global_of_regular(&self, regular_index: usize) -> usize {
        self.regular_to_global[regular_index]
    }

    /// Defining expressions of the synthesized auxiliary variables.
    pub fn auxiliary_variables(&self) -> &[(usize, Rc<ArithExpr>)] {
        &self.auxiliary_exprs
    }

    // ------------------------------------------------------------------
    // Operators, goals, initial state
    // ------------------------------------------------------------------

    pub fn operators(&self) -> &[NormalizedOperator] {
        &self.operators
    }

    pub fn propositional_goals(&self) -> &[Fact] {
        &self.propositional_goals
    }

    pub fn numeric_goals(&self) -> &[Rc<RegularNumericCondition>] {
        &self.numeric_goals
    }

    pub fn initial_state(&self) -> State {
        State::new(self.initial_propositional.clone(), self.initial_numeric.clone())
    }

    pub fn average_operator_cost(&self) -> f64 {
        if self.operators.is_empty() {
            return 0.0;
        }
        self.operators.iter().map(|op| op.cost).sum::<f64>() / self.operators.len() as f64
    }

    // ------------------------------------------------------------------
    // Concrete-state evaluation (heuristic lookups and sampling)
    // ------------------------------------------------------------------

    /// Value of any numeric variable in a concrete state.
    pub fn numeric_state_value(&self, state: &State, global_id: usize) -> f64 {
        match self.numeric_variables[global_id].kind {
            NumericKind::Regular | NumericKind::Auxiliary => {
                state.numeric[self.global_to_regular[global_id]
                    .expect("regular variable without regular index")]
            }
            NumericKind::Constant | NumericKind::Instrumentation => {
                self.numeric_variables[global_id].initial_value
            }
            NumericKind::Derived => {
                // Derived values only feed resolved conditions, which
                // reference regular variables directly; reconstructing one
                // here means a caller asked for a value normalization
                // already folded away.
                self.numeric_variables[global_id].initial_value
            }
        }
    }

    /// Check a numeric condition against a concrete state.
    pub fn condition_satisfied(&self, condition: &RegularNumericCondition, state: &State) -> bool {
        match condition.var_id() {
            Some(var) => condition.satisfied(self.numeric_state_value(state, var)),
            None => condition.constant_satisfied().unwrap_or(false),
        }
    }

    /// True iff every propositional and numeric goal holds in `state`.
    pub fn is_goal_state(&self, state: &State) -> bool {
        self.propositional_goals
            .iter()
            .all(|goal| state.propositional[goal.var] == goal.value)
            && self
                .numeric_goals
                .iter()
                .all(|goal| self.condition_satisfied(goal, state))
    }

    fn operator_applicable(&self, op: &NormalizedOperator, state: &State) -> bool {
        op.propositional_preconditions
            .iter()
            .all(|pre| state.propositional[pre.var] == pre.value)
            && op
                .numeric_preconditions
                .iter()
                .all(|pre| self.condition_satisfied(pre, state))
    }

    /// Ids of all operators applicable in `state`.
    pub fn applicable_operators(&self, state: &State) -> Vec<usize> {
        self.operators
            .iter()
            .enumerate()
            .filter(|(_, op)| self.operator_applicable(op, state))
            .map(|(id, _)| id)
            .collect()
    }

    /// Apply an operator to a concrete state. Comparison-derived
    /// propositional values are refreshed from the numeric result.
    pub fn apply(&self, state: &State, op_id: usize) -> State {
        let op = &self.operators[op_id];
        let mut successor = state.clone();
        for eff in &op.propositional_effects {
            successor.propositional[eff.var] = eff.value;
        }
        for (idx, delta) in op.additive_effects.iter().enumerate() {
            successor.numeric[idx] += delta;
        }
        for &(global_id, value) in &op.assign_effects {
            if let Some(idx) = self.global_to_regular[global_id] {
                successor.numeric[idx] = value;
            }
        }
        self.refresh_comparison_values(&mut successor);
        successor
    }

    fn refresh_comparison_values(&self, state: &mut State) {
        for (var, axiom) in self.comparison_axiom_of_var.iter().enumerate() {
            if let Some(ax) = axiom {
                let holds = match &self.resolved_comparisons[*ax] {
                    ResolvedComparison::Constant(truth) => *truth,
                    ResolvedComparison::Condition(cond) => self.condition_satisfied(cond, state),
                };
                state.propositional[var] = usize::from(holds);
            }
        }
    }

    // ------------------------------------------------------------------
    // Approximate domain sizes
    // ------------------------------------------------------------------

    /// Estimate of the number of reachable values of a regular numeric
    /// variable: the span of the constants it is compared against,
    /// assigned, or initialized to, widened by the strongest effects and
    /// quantized by the smallest achievable step.
    pub fn approximate_domain_size(&self, global_id: usize) -> Result<usize> {
        if let Some(&cached) = self.approx_domain_sizes.borrow().get(&global_id) {
            return Ok(cached);
        }
        let regular_index = self.global_to_regular[global_id].ok_or_else(|| {
            EngineError::InvalidArgument(format!(
                "approximate domain size of non-regular numeric variable {global_id}"
            ))
        })?;

        let mut min_const: f64 = 0.0;
        let mut max_const: f64 = 0.0;
        let mut increments: Vec<f64> = Vec::new();
        let mut decrements: Vec<f64> = Vec::new();
        let mut min_change = f64::INFINITY;
        let mut max_pos_change: f64 = 0.0;
        let mut max_neg_change: f64 = 0.0;

        let mut widen = |c: f64, min_const: &mut f64, max_const: &mut f64| {
            *min_const = min_const.min(c);
            *max_const = max_const.max(c);
        };

        for op in &self.operators {
            for pre in &op.numeric_preconditions {
                if pre.var_id() == Some(global_id) {
                    widen(pre.constant()?, &mut min_const, &mut max_const);
                }
            }
            let eff = op.additive_effects[regular_index];
            if eff > 0.0 {
                if !increments.contains(&eff) {
                    increments.push(eff);
                }
                min_change = min_change.min(eff);
                max_pos_change = max_pos_change.max(eff);
            } else if eff < 0.0 {
                if !decrements.contains(&eff) {
                    decrements.push(eff);
                }
                min_change = min_change.min(eff.abs());
                max_neg_change = max_neg_change.min(eff);
            }
            for &(var, value) in &op.assign_effects {
                if var == global_id {
                    widen(value, &mut min_const, &mut max_const);
                }
            }
        }

        widen(self.initial_numeric[regular_index], &mut min_const, &mut max_const);
        for goal in &self.numeric_goals {
            if goal.var_id() == Some(global_id) {
                widen(goal.constant()?, &mut min_const, &mut max_const);
            }
        }

        min_const += max_neg_change;
        max_const += max_pos_change;

        let mut min_increment = f64::INFINITY;
        if !increments.is_empty() && !decrements.is_empty() {
            for &inc in &increments {
                for &dec in &decrements {
                    min_increment = min_increment.min((inc + dec).abs());
                }
            }
            if min_increment == 0.0 {
                min_increment = min_change;
            }
        } else {
            min_increment = min_change;
        }

        let estimate = ((max_const - min_const) / min_increment).abs() + 1.0;
        if !estimate.is_finite() || estimate > i32::MAX as f64 {
            return Err(EngineError::Overflow(format!(
                "approximate domain of numeric variable {} spans {estimate} values",
                self.numeric_variables[global_id].name
            )));
        }
        let estimate = estimate as usize;
        self.approx_domain_sizes.borrow_mut().insert(global_id, estimate);
        Ok(estimate)
    }

    // ------------------------------------------------------------------
    // Causal graph
    // ------------------------------------------------------------------

    /// The causal graph of this task, built on first use and cached for
    /// the task's lifetime.
    pub fn causal_graph(&self) -> &CausalGraph {
        self.causal_graph.get_or_init(|| CausalGraph::new(self))
    }
}

impl std::fmt::Debug for NormalizedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedTask")
            .field("prop_variables", &self.prop_variables.len())
            .field("numeric_variables", &self.numeric_variables.len())
            .field("regular_numeric", &self.regular_to_global.len())
            .field("auxiliaries", &self.auxiliary_exprs.len())
            .field("operators", &self.operators.len())
            .finish()
    }
}

// ----------------------------------------------------------------------
// Construction
// ----------------------------------------------------------------------

/// Raw per-operator numeric effect view used during normalization.
struct RawNumericEffects {
    /// Delta per global numeric id.
    deltas: Vec<f64>,
    /// `(global id, value)` assignments.
    assigns: Vec<(usize, f64)>,
}

struct Normalizer {
    task: PlanningTask,
    is_comparison_var: Vec<bool>,
    comparison_axiom_of_var: Vec<Option<usize>>,
    assignment_axiom_of_var: Vec<Option<usize>>,
    regular_to_global: Vec<usize>,
    global_to_regular: Vec<Option<usize>>,
    raw_effects: Vec<RawNumericEffects>,
    /// Signature of a simplified difference expression -> auxiliary id.
    auxiliary_by_signature: HashMap<String, usize>,
    auxiliary_exprs: Vec<(usize, Rc<ArithExpr>)>,
    condition_cache: HashMap<(usize, usize), Rc<RegularNumericCondition>>,
    initial_global_values: Vec<f64>,
}

impl Normalizer {
    fn new(task: PlanningTask) -> Result<Normalizer> {
        let num_prop = task.prop_variables.len();
        let num_numeric = task.numeric_variables.len();

        let mut is_comparison_var = vec![false; num_prop];
        let mut comparison_axiom_of_var = vec![None; num_prop];
        for (ax_id, axiom) in task.comparison_axioms.iter().enumerate() {
            if axiom.derived_var >= num_prop {
                return Err(EngineError::InvalidArgument(format!(
                    "comparison axiom {ax_id} names unknown variable {}",
                    axiom.derived_var
                )));
            }
            is_comparison_var[axiom.derived_var] = true;
            comparison_axiom_of_var[axiom.derived_var] = Some(ax_id);
        }

        let mut assignment_axiom_of_var = vec![None; num_numeric];
        for (ax_id, axiom) in task.assignment_axioms.iter().enumerate() {
            if task.numeric_variables[axiom.affected].kind != NumericKind::Derived {
                return Err(EngineError::Unsupported(format!(
                    "assignment axiom defines non-derived numeric variable {}",
                    task.numeric_variables[axiom.affected].name
                )));
            }
            assignment_axiom_of_var[axiom.affected] = Some(ax_id);
        }

        let mut regular_to_global = Vec::new();
        let mut global_to_regular = vec![None; num_numeric];
        for (id, var) in task.numeric_variables.iter().enumerate() {
            if var.kind == NumericKind::Regular {
                global_to_regular[id] = Some(regular_to_global.len());
                regular_to_global.push(id);
            }
        }

        let initial_global_values: Vec<f64> =
            task.numeric_variables.iter().map(|v| v.initial_value).collect();

        Ok(Normalizer {
            task,
            is_comparison_var,
            comparison_axiom_of_var,
            assignment_axiom_of_var,
            regular_to_global,
            global_to_regular,
            raw_effects: Vec::new(),
            auxiliary_by_signature: HashMap::new(),
            auxiliary_exprs: Vec::new(),
            condition_cache: HashMap::new(),
            initial_global_values,
        })
    }

    fn finish(mut self) -> Result<NormalizedTask> {
        self.verify_fragment()?;
        self.collect_raw_numeric_effects()?;

        // Resolve every comparison up front; auxiliaries appear here.
        let mut resolved_comparisons = Vec::with_capacity(self.task.comparison_axioms.len());
        for ax_id in 0..self.task.comparison_axioms.len() {
            resolved_comparisons.push(self.resolve_comparison(ax_id)?);
        }

        let operators = self.build_operators(&resolved_comparisons)?;
        let (propositional_goals, numeric_goals) = self.split_goals(&resolved_comparisons)?;

        let initial_numeric: Vec<f64> = self
            .regular_to_global
            .iter()
            .map(|&g| self.initial_global_values[g])
            .collect();

        let mut initial_propositional = self.task.initial_propositional.clone();
        initial_propositional.resize(self.task.prop_variables.len(), 0);

        let mut normalized = NormalizedTask {
            prop_variables: std::mem::take(&mut self.task.prop_variables),
            numeric_variables: std::mem::take(&mut self.task.numeric_variables),
            is_comparison_var: self.is_comparison_var,
            comparison_axiom_of_var: self.comparison_axiom_of_var,
            resolved_comparisons,
            regular_to_global: self.regular_to_global,
            global_to_regular: self.global_to_regular,
            auxiliary_exprs: self.auxiliary_exprs,
            operators,
            propositional_goals,
            numeric_goals,
            initial_propositional,
            initial_numeric,
            approx_domain_sizes: RefCell::new(HashMap::new()),
            causal_graph: OnceCell::new(),
        };

        // Comparison-derived values follow from the numeric initial state.
        let mut initial = normalized.initial_state();
        normalized.refresh_comparison_values(&mut initial);
        normalized.initial_propositional = initial.propositional;

        debug!(
            prop_vars = normalized.prop_variables.len(),
            numeric_vars = normalized.numeric_variables.len(),
            regular = normalized.regular_to_global.len(),
            auxiliaries = normalized.auxiliary_exprs.len(),
            operators = normalized.operators.len(),
            "task normalized"
        );

        Ok(normalized)
    }

    fn verify_fragment(&self) -> Result<()> {
        for op in &self.task.operators {
            for eff in &op.effects {
                if !eff.conditions.is_empty() {
                    return Err(EngineError::Unsupported(format!(
                        "operator '{}' has conditional effects",
                        op.name
                    )));
                }
                if self.is_comparison_var[eff.fact.var] {
                    return Err(EngineError::Unsupported(format!(
                        "operator '{}' assigns a comparison-derived variable",
                        op.name
                    )));
                }
            }
            if op.cost < 0.0 {
                return Err(EngineError::InvalidArgument(format!(
                    "operator '{}' has negative cost {}",
                    op.name, op.cost
                )));
            }
        }
        Ok(())
    }

    /// Fold every numeric effect operand to a constant delta/value.
    fn collect_raw_numeric_effects(&mut self) -> Result<()> {
        let num_numeric = self.task.numeric_variables.len();
        let mut raw = Vec::with_capacity(self.task.operators.len());
        for op in &self.task.operators {
            let mut deltas = vec![0.0; num_numeric];
            let mut assigns: Vec<(usize, f64)> = Vec::new();
            for eff in &op.numeric_effects {
                let affected_kind = self.task.numeric_variables[eff.affected].kind;
                if affected_kind == NumericKind::Instrumentation {
                    continue;
                }
                if affected_kind != NumericKind::Regular {
                    return Err(EngineError::Unsupported(format!(
                        "operator '{}' affects non-regular numeric variable '{}'",
                        op.name, self.task.numeric_variables[eff.affected].name
                    )));
                }
                let operand = self.parse_expression(eff.operand)?.simplify()?;
                if !operand.is_constant() {
                    return Err(EngineError::Unsupported(format!(
                        "operator '{}' has a non-linear numeric effect on '{}'",
                        op.name, self.task.numeric_variables[eff.affected].name
                    )));
                }
                let value = operand.evaluate_constant()?;
                match eff.op {
                    NumericEffectOp::Increase => deltas[eff.affected] += value,
                    NumericEffectOp::Decrease => deltas[eff.affected] -= value,
                    NumericEffectOp::Assign => assigns.push((eff.affected, value)),
                }
            }
            for &(var, _) in &assigns {
                if deltas[var] != 0.0 {
                    return Err(EngineError::Unsupported(format!(
                        "operator '{}' both assigns and additively changes '{}'",
                        op.name, self.task.numeric_variables[var].name
                    )));
                }
            }
            raw.push(RawNumericEffects { deltas, assigns });
        }
        self.raw_effects = raw;
        Ok(())
    }

    /// Lift a numeric variable into an arithmetic expression, unfolding
    /// assignment axioms for derived variables.
    fn parse_expression(&self, num_var: usize) -> Result<Rc<ArithExpr>> {
        let var = &self.task.numeric_variables[num_var];
        match var.kind {
            NumericKind::Regular | NumericKind::Auxiliary => Ok(ArithExpr::var(num_var)),
            NumericKind::Constant => Ok(ArithExpr::constant(var.initial_value)),
            NumericKind::Derived => {
                let ax_id = self.assignment_axiom_of_var[num_var].ok_or_else(|| {
                    EngineError::Unsupported(format!(
                        "derived numeric variable '{}' has no assignment axiom",
                        var.name
                    ))
                })?;
                let axiom = self.task.assignment_axioms[ax_id];
                let lhs = self.parse_expression(axiom.lhs)?;
                let rhs = self.parse_expression(axiom.rhs)?;
                Ok(ArithExpr::binary(axiom.op, lhs, rhs))
            }
            NumericKind::Instrumentation => Err(EngineError::Unsupported(format!(
                "instrumentation variable '{}' used in an expression",
                var.name
            ))),
        }
    }

    /// Resolve one comparison axiom into a single-variable condition,
    /// introducing an auxiliary variable when both sides stay variable.
    fn resolve_comparison(&mut self, ax_id: usize) -> Result<ResolvedComparison> {
        let axiom = self.task.comparison_axioms[ax_id];
        let lhs = self.parse_expression(axiom.lhs)?.simplify()?;
        let rhs = self.parse_expression(axiom.rhs)?.simplify()?;

        let mut vars = Vec::new();
        lhs.collect_variables(&mut vars);
        rhs.collect_variables(&mut vars);
        vars.sort_unstable();
        vars.dedup();

        let condition = if vars.is_empty() {
            let cond = RegularNumericCondition::new(lhs, axiom.comparator, rhs)?;
            return Ok(ResolvedComparison::Constant(cond.constant_satisfied()?));
        } else if vars.len() == 1 && (lhs.var_id().is_none() || rhs.var_id().is_none()) {
            RegularNumericCondition::new(lhs, axiom.comparator, rhs)?
        } else {
            // Two-variable comparison: introduce z := lhs - rhs and
            // compare z against zero.
            let aux = self.auxiliary_for(ArithExpr::binary(ArithOp::Sub, lhs, rhs).simplify()?)?;
            RegularNumericCondition::new(
                ArithExpr::var(aux),
                axiom.comparator,
                ArithExpr::constant(0.0),
            )?
        };
        Ok(ResolvedComparison::Condition(Rc::new(condition)))
    }

    /// Auxiliary variable for a difference expression, deduplicated by
    /// the expression's textual signature.
    fn auxiliary_for(&mut self, expr: Rc<ArithExpr>) -> Result<usize> {
        let signature = expr.to_string();
        if let Some(&id) = self.auxiliary_by_signature.get(&signature) {
            return Ok(id);
        }

        let mut expr_vars = Vec::new();
        expr.collect_variables(&mut expr_vars);
        expr_vars.sort_unstable();
        expr_vars.dedup();
        for effects in &self.raw_effects {
            for &(assigned, _) in &effects.assigns {
                if expr_vars.contains(&assigned) {
                    return Err(EngineError::Unsupported(format!(
                        "assignment effect on '{}' mixes with auxiliary expression {signature}",
                        self.task.numeric_variables[assigned].name
                    )));
                }
            }
        }

        let global_id = self.task.numeric_variables.len();
        let initial_value = expr.evaluate_over(&self.initial_global_values);
        debug!(
            aux = %signature,
            global_id,
            initial_value,
            "introducing auxiliary numeric variable"
        );
        self.task.numeric_variables.push(NumericVariable {
            name: format!("aux({signature})"),
            kind: NumericKind::Auxiliary,
            initial_value,
        });
        self.initial_global_values.push(initial_value);
        self.global_to_regular.push(Some(self.regular_to_global.len()));
        self.regular_to_global.push(global_id);

        // The operator's effect on the auxiliary is its expression
        // evaluated over the per-variable deltas; additive constants in
        // the expression do not move under operator application.
        for effects in &mut self.raw_effects {
            let delta = expr.evaluate_ignore_additive_consts(&effects.deltas);
            effects.deltas.push(delta);
        }

        self.auxiliary_by_signature.insert(signature, global_id);
        self.auxiliary_exprs.push((global_id, Rc::clone(&expr)));
        Ok(global_id)
    }

    /// Condition for a precondition/goal fact on a comparison variable.
    fn condition_for_fact(
        &mut self,
        fact: Fact,
        resolved: &[ResolvedComparison],
    ) -> Result<Option<Rc<RegularNumericCondition>>> {
        if let Some(cached) = self.condition_cache.get(&(fact.var, fact.value)) {
            return Ok(Some(Rc::clone(cached)));
        }
        let ax_id = self.comparison_axiom_of_var[fact.var].ok_or_else(|| {
            EngineError::Internal(format!("variable {} is not comparison-derived", fact.var))
        })?;
        let condition = match &resolved[ax_id] {
            ResolvedComparison::Constant(truth) => {
                let holds = if fact.value == 1 { *truth } else { !*truth };
                if !holds {
                    let variable = &self.task.prop_variables[fact.var].name;
                    warn!(%variable, "constant numeric condition is unsatisfiable");
                }
                return Ok(None);
            }
            ResolvedComparison::Condition(cond) => {
                if fact.value == 1 {
                    Rc::clone(cond)
                } else {
                    Rc::new(self.negate_condition(cond)?)
                }
            }
        };
        self.condition_cache.insert((fact.var, fact.value), Rc::clone(&condition));
        Ok(Some(condition))
    }

    fn negate_condition(&self, cond: &RegularNumericCondition) -> Result<RegularNumericCondition> {
        let (comparator, bound) = cond.normalized()?;
        let negated = match comparator {
            Comparator::Lt => Comparator::Ge,
            Comparator::Le => Comparator::Gt,
            Comparator::Ge => Comparator::Lt,
            Comparator::Gt => Comparator::Le,
            Comparator::Eq => {
                return Err(EngineError::Unsupported(
                    "negated numeric equality condition".to_string(),
                ))
            }
        };
        let var = cond
            .var_id()
            .ok_or_else(|| EngineError::Internal("negating constant condition".to_string()))?;
        RegularNumericCondition::new(ArithExpr::var(var), negated, ArithExpr::constant(bound))
    }

    fn build_operators(
        &mut self,
        resolved: &[ResolvedComparison],
    ) -> Result<Vec<NormalizedOperator>> {
        let n_regular = self.regular_to_global.len();
        let raw_ops = std::mem::take(&mut self.task.operators);
        let mut operators = Vec::with_capacity(raw_ops.len());
        for (op_id, op) in raw_ops.iter().enumerate() {
            let mut propositional_preconditions = Vec::new();
            let mut numeric_preconditions = Vec::new();
            for &pre in &op.preconditions {
                if self.is_comparison_var[pre.var] {
                    if let Some(cond) = self.condition_for_fact(pre, resolved)? {
                        numeric_preconditions.push(cond);
                    }
                } else {
                    propositional_preconditions.push(pre);
                }
            }

            let effects = &self.raw_effects[op_id];
            let additive_effects: Vec<f64> = (0..n_regular)
                .map(|idx| effects.deltas[self.regular_to_global[idx]])
                .collect();

            operators.push(NormalizedOperator {
                name: op.name.clone(),
                cost: op.cost,
                propositional_preconditions,
                numeric_preconditions,
                propositional_effects: op.effects.iter().map(|e| e.fact).collect(),
                additive_effects,
                assign_effects: effects.assigns.clone(),
            });
        }
        self.task.operators = raw_ops;
        Ok(operators)
    }

    fn split_goals(
        &mut self,
        resolved: &[ResolvedComparison],
    ) -> Result<(Vec<Fact>, Vec<Rc<RegularNumericCondition>>)> {
        let mut propositional = Vec::new();
        let mut numeric = Vec::new();
        let goals = self.task.goals.clone();
        for goal in goals {
            if self.is_comparison_var[goal.var] {
                if let Some(cond) = self.condition_for_fact(goal, resolved)? {
                    numeric.push(cond);
                }
            } else {
                propositional.push(goal);
            }
        }
        Ok((propositional, numeric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::builder::{OperatorBuilder, TaskBuilder};

    /// var0 - var1 >= 0 with +1/+2 effects, per the auxiliary-variable
    /// construction contract.
    #[test]
    fn test_auxiliary_variable_introduction() {
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 5.0);
        let y = b.numeric_variable("y", 4.0);
        let one = b.numeric_constant(1.0);
        let two = b.numeric_constant(2.0);
        let cmp = b.comparison("x_ge_y", x, Comparator::Ge, y);
        b.add_operator(
            OperatorBuilder::new("drift")
                .increase(x, one)
                .increase(y, two)
                .cost(1.0),
        );
        b.goal(cmp, 1);
        let task = NormalizedTask::new(b.build()).unwrap();

        assert_eq!(task.auxiliary_variables().len(), 1);
        let (aux_id, _) = task.auxiliary_variables()[0];
        assert_eq!(task.numeric_kind(aux_id), NumericKind::Auxiliary);
        let aux_idx = task.regular_index(aux_id).unwrap();

        // z := x - y seeds to 1 and the operator induces -1.
        assert_eq!(task.initial_state().numeric[aux_idx], 1.0);
        assert_eq!(task.operators()[0].additive_effects[aux_idx], -1.0);

        // The goal was rewritten onto the auxiliary.
        assert_eq!(task.numeric_goals().len(), 1);
        assert_eq!(task.numeric_goals()[0].var_id(), Some(aux_id));
    }

    #[test]
    fn test_auxiliary_deduplication() {
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let y = b.numeric_variable("y", 0.0);
        let c1 = b.comparison("c1", x, Comparator::Ge, y);
        let c2 = b.comparison("c2", x, Comparator::Gt, y);
        b.goal(c1, 1).goal(c2, 1);
        let task = NormalizedTask::new(b.build()).unwrap();
        assert_eq!(task.auxiliary_variables().len(), 1);
        assert_eq!(task.numeric_goals().len(), 2);
    }

    #[test]
    fn test_single_variable_condition_stays_direct() {
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let three = b.numeric_constant(3.0);
        let cmp = b.comparison("x_ge_3", x, Comparator::Ge, three);
        b.goal(cmp, 1);
        let task = NormalizedTask::new(b.build()).unwrap();
        assert!(task.auxiliary_variables().is_empty());
        assert_eq!(task.numeric_goals()[0].var_id(), Some(x));
        assert_eq!(task.numeric_goals()[0].constant().unwrap(), 3.0);
    }

    #[test]
    fn test_derived_variable_unfolding() {
        // d := (x - five); goal d >= zero  <=>  x >= 5
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let five = b.numeric_constant(5.0);
        let zero = b.numeric_constant(0.0);
        let d = b.derived_numeric("d", x, ArithOp::Sub, five);
        let cmp = b.comparison("d_ge_0", d, Comparator::Ge, zero);
        b.goal(cmp, 1);
        let task = NormalizedTask::new(b.build()).unwrap();
        let goal = &task.numeric_goals()[0];
        assert_eq!(goal.var_id(), Some(x));
        assert_eq!(goal.constant().unwrap(), 5.0);
    }

    #[test]
    fn test_conditional_effects_rejected() {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        let c = b.prop_variable("c", 2);
        b.add_operator(OperatorBuilder::new("bad").conditional_effect(
            vec![Fact { var: c, value: 1 }],
            a,
            1,
        ));
        assert!(matches!(
            NormalizedTask::new(b.build()),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_assign_plus_additive_rejected() {
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let one = b.numeric_constant(1.0);
        b.add_operator(OperatorBuilder::new("bad").increase(x, one).assign(x, one));
        assert!(matches!(
            NormalizedTask::new(b.build()),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_assign_mixed_with_auxiliary_rejected() {
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let y = b.numeric_variable("y", 0.0);
        let one = b.numeric_constant(1.0);
        let cmp = b.comparison("x_ge_y", x, Comparator::Ge, y);
        b.add_operator(OperatorBuilder::new("set_x").assign(x, one));
        b.goal(cmp, 1);
        assert!(matches!(
            NormalizedTask::new(b.build()),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_instrumentation_effects_ignored() {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        let m = b.instrumentation_variable("total-cost");
        let one = b.numeric_constant(1.0);
        b.add_operator(OperatorBuilder::new("op").effect(a, 1).increase(m, one));
        b.goal(a, 1);
        let task = NormalizedTask::new(b.build()).unwrap();
        assert!(!task.operators()[0].has_numeric_effect());
        assert_eq!(task.num_regular_numeric_variables(), 0);
    }

    #[test]
    fn test_successor_application_and_goal_check() {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        let x = b.numeric_variable("x", 0.0);
        let two = b.numeric_constant(2.0);
        let three = b.numeric_constant(3.0);
        let cmp = b.comparison("x_ge_3", x, Comparator::Ge, three);
        b.add_operator(OperatorBuilder::new("bump").effect(a, 1).increase(x, two));
        b.goal(a, 1).goal(cmp, 1);
        let task = NormalizedTask::new(b.build()).unwrap();

        let s0 = task.initial_state();
        assert!(!task.is_goal_state(&s0));
        assert_eq!(task.applicable_operators(&s0), vec![0]);

        let s1 = task.apply(&s0, 0);
        let s2 = task.apply(&s1, 0);
        assert_eq!(s2.numeric[task.regular_index(x).unwrap()], 4.0);
        assert!(task.is_goal_state(&s2));
        // The comparison-derived entry tracks the numeric state.
        assert_eq!(s2.propositional[cmp], 1);
        assert_eq!(s1.propositional[cmp], 0);
    }

    #[test]
    fn test_approximate_domain_size() {
        // x in [0, 3]-ish: initial 0, goal >= 3, +1 and +2 steps.
        let mut b = TaskBuilder::new();
        let x = b.numeric_variable("x", 0.0);
        let one = b.numeric_constant(1.0);
        let two = b.numeric_constant(2.0);
        let three = b.numeric_constant(3.0);
        let cmp = b.comparison("x_ge_3", x, Comparator::Ge, three);
        b.add_operator(OperatorBuilder::new("p1").increase(x, one));
        b.add_operator(OperatorBuilder::new("p2").increase(x, two));
        b.goal(cmp, 1);
        let task = NormalizedTask::new(b.build()).unwrap();

        // span [0, 3+2] with min step 1 -> 6 values
        assert_eq!(task.approximate_domain_size(x).unwrap(), 6);
    }

    #[test]
    fn test_average_operator_cost() {
        let mut b = TaskBuilder::new();
        let a = b.prop_variable("a", 2);
        b.add_operator(OperatorBuilder::new("c1").effect(a, 1).cost(1.0));
        b.add_operator(OperatorBuilder::new("c3").effect(a, 1).cost(3.0));
        let task = NormalizedTask::new(b.build()).unwrap();
        assert_eq!(task.average_operator_cost(), 2.0);
    }
}
