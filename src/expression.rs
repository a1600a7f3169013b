//! Arithmetic Expression Trees
//!
//! Lazy symbolic expressions over numeric task variables and constants.
//! Expressions are built during task normalization by unfolding assignment
//! axioms, are immutable afterwards, and are shared by reference
//! ([`Rc`]); simplification allocates fresh nodes instead of mutating.
//!
//! Invariant maintained by the normalizer: no expression refers to more
//! than one distinct regular numeric variable. Comparisons that would
//! violate this are rewritten with an auxiliary variable first.

use std::fmt;
use std::rc::Rc;

use crate::errors::{EngineError, Result};

/// Binary arithmetic operators appearing in assignment axioms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ArithOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
}

impl ArithOp {
    /// Parse an arithmetic operator from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Sub),
            "*" => Some(ArithOp::Mul),
            "/" => Some(ArithOp::Div),
            _ => None,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }

    fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }
    }
}

/// Arithmetic expression tree
///
/// Leaves are variable references (by global numeric variable id) or
/// constants; internal nodes combine two subtrees with an [`ArithOp`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArithExpr {
    /// Reference to a regular numeric variable (global id).
    Var(usize),
    /// A constant value.
    Const(f64),
    /// Binary operation over two subexpressions.
    Binary {
        op: ArithOp,
        lhs: Rc<ArithExpr>,
        rhs: Rc<ArithExpr>,
    },
}

impl ArithExpr {
    pub fn var(id: usize) -> Rc<ArithExpr> {
        Rc::new(ArithExpr::Var(id))
    }

    pub fn constant(value: f64) -> Rc<ArithExpr> {
        Rc::new(ArithExpr::Const(value))
    }

    pub fn binary(op: ArithOp, lhs: Rc<ArithExpr>, rhs: Rc<ArithExpr>) -> Rc<ArithExpr> {
        Rc::new(ArithExpr::Binary { op, lhs, rhs })
    }

    /// Append all variable ids referenced by this expression.
    pub fn collect_variables(&self, out: &mut Vec<usize>) {
        match self {
            ArithExpr::Var(id) => out.push(*id),
            ArithExpr::Const(_) => {}
            ArithExpr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }

    /// The variable referenced by this expression, if any.
    ///
    /// Expressions hold at most one distinct variable; the first reference
    /// found is returned.
    pub fn var_id(&self) -> Option<usize> {
        match self {
            ArithExpr::Var(id) => Some(*id),
            ArithExpr::Const(_) => None,
            ArithExpr::Binary { lhs, rhs, .. } => lhs.var_id().or_else(|| rhs.var_id()),
        }
    }

    /// True iff no variable appears.
    pub fn is_constant(&self) -> bool {
        match self {
            ArithExpr::Var(_) => false,
            ArithExpr::Const(_) => true,
            ArithExpr::Binary { lhs, rhs, .. } => lhs.is_constant() && rhs.is_constant(),
        }
    }

    /// Fold a constant expression to its value.
    ///
    /// Errors with [`EngineError::NumericError`] on division by zero and
    /// with [`EngineError::Internal`] when a variable appears.
    pub fn evaluate_constant(&self) -> Result<f64> {
        match self {
            ArithExpr::Var(id) => Err(EngineError::Internal(format!(
                "constant evaluation of expression containing var{id}"
            ))),
            ArithExpr::Const(c) => Ok(*c),
            ArithExpr::Binary { op, lhs, rhs } => {
                let l = lhs.evaluate_constant()?;
                let r = rhs.evaluate_constant()?;
                if *op == ArithOp::Div && r == 0.0 {
                    return Err(EngineError::NumericError(format!(
                        "division by zero while folding {self}"
                    )));
                }
                Ok(op.apply(l, r))
            }
        }
    }

    /// Evaluate with `value` substituted for the (single) variable.
    pub fn evaluate(&self, value: f64) -> f64 {
        match self {
            ArithExpr::Var(_) => value,
            ArithExpr::Const(c) => *c,
            ArithExpr::Binary { op, lhs, rhs } => {
                op.apply(lhs.evaluate(value), rhs.evaluate(value))
            }
        }
    }

    /// Evaluate against a full numeric assignment, one entry per global
    /// numeric variable.
    pub fn evaluate_over(&self, values: &[f64]) -> f64 {
        match self {
            ArithExpr::Var(id) => values[*id],
            ArithExpr::Const(c) => *c,
            ArithExpr::Binary { op, lhs, rhs } => {
                op.apply(lhs.evaluate_over(values), rhs.evaluate_over(values))
            }
        }
    }

    /// Evaluate against a full numeric assignment while dropping additive
    /// constant terms.
    ///
    /// Used to derive the additive effect an operator has on an auxiliary
    /// variable: substituting the operator's per-variable deltas for the
    /// variables gives the delta of the whole expression, and constant
    /// summands must not contribute (`x - y + 3` changes by `dx - dy`).
    pub fn evaluate_ignore_additive_consts(&self, values: &[f64]) -> f64 {
        match self {
            ArithExpr::Var(id) => values[*id],
            ArithExpr::Const(_) => 0.0,
            ArithExpr::Binary { op, lhs, rhs } => match op {
                ArithOp::Add => {
                    if lhs.is_constant() {
                        rhs.evaluate_ignore_additive_consts(values)
                    } else if rhs.is_constant() {
                        lhs.evaluate_ignore_additive_consts(values)
                    } else {
                        lhs.evaluate_ignore_additive_consts(values)
                            + rhs.evaluate_ignore_additive_consts(values)
                    }
                }
                ArithOp::Sub => {
                    if lhs.is_constant() {
                        -rhs.evaluate_ignore_additive_consts(values)
                    } else if rhs.is_constant() {
                        lhs.evaluate_ignore_additive_consts(values)
                    } else {
                        lhs.evaluate_ignore_additive_consts(values)
                            - rhs.evaluate_ignore_additive_consts(values)
                    }
                }
                // Multiplicative constants scale the delta and must be kept.
                ArithOp::Mul => {
                    lhs.evaluate_scale(values) * rhs.evaluate_scale(values)
                }
                ArithOp::Div => {
                    lhs.evaluate_scale(values) / rhs.evaluate_scale(values)
                }
            },
        }
    }

    /// Like [`Self::evaluate_ignore_additive_consts`], but keeps constant
    /// leaves so they can act as multiplicative factors.
    fn evaluate_scale(&self, values: &[f64]) -> f64 {
        match self {
            ArithExpr::Const(c) => *c,
            _ => self.evaluate_ignore_additive_consts(values),
        }
    }

    /// Fold constant subtrees, returning a (possibly shared) simplified tree.
    pub fn simplify(self: &Rc<Self>) -> Result<Rc<ArithExpr>> {
        match self.as_ref() {
            ArithExpr::Var(_) | ArithExpr::Const(_) => Ok(Rc::clone(self)),
            ArithExpr::Binary { op, lhs, rhs } => {
                if self.is_constant() {
                    return Ok(ArithExpr::constant(self.evaluate_constant()?));
                }
                let lhs = lhs.simplify()?;
                let rhs = rhs.simplify()?;
                Ok(ArithExpr::binary(*op, lhs, rhs))
            }
        }
    }

    /// Coefficients `(m, s)` of the affine form `m * v + s`.
    ///
    /// Defined only when exactly one variable appears; a constant
    /// expression is an internal error (callers check `is_constant`
    /// first), and dividing a constant *by* the variable is rejected as
    /// unsupported.
    pub fn affine(&self) -> Result<(f64, f64)> {
        match self {
            ArithExpr::Var(_) => Ok((1.0, 0.0)),
            ArithExpr::Const(_) => Err(EngineError::Internal(
                "affine form requested for a constant expression".to_string(),
            )),
            ArithExpr::Binary { op, lhs, rhs } => {
                if lhs.var_id().is_some() {
                    let (m, s) = lhs.affine()?;
                    let c = rhs.evaluate_constant()?;
                    match op {
                        ArithOp::Add => Ok((m, s + c)),
                        ArithOp::Sub => Ok((m, s - c)),
                        ArithOp::Mul => Ok((m * c, s * c)),
                        ArithOp::Div => {
                            if c == 0.0 {
                                Err(EngineError::NumericError(format!(
                                    "division by zero in {self}"
                                )))
                            } else {
                                Ok((m / c, s / c))
                            }
                        }
                    }
                } else {
                    let c = lhs.evaluate_constant()?;
                    let (m, s) = rhs.affine()?;
                    match op {
                        ArithOp::Add => Ok((m, s + c)),
                        ArithOp::Sub => Ok((-m, c - s)),
                        ArithOp::Mul => Ok((m * c, s * c)),
                        ArithOp::Div => Err(EngineError::Unsupported(format!(
                            "division by a variable expression in {self}"
                        ))),
                    }
                }
            }
        }
    }

    /// Coefficient `m` of the affine form `m * v + s`.
    pub fn multiplier(&self) -> Result<f64> {
        self.affine().map(|(m, _)| m)
    }

    /// Offset `s` of the affine form `m * v + s`.
    pub fn summand(&self) -> Result<f64> {
        self.affine().map(|(_, s)| s)
    }
}

impl fmt::Display for ArithExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithExpr::Var(id) => write!(f, "var{id}"),
            ArithExpr::Const(c) => write!(f, "{c}"),
            ArithExpr::Binary { op, lhs, rhs } => {
                write!(f, "({lhs} {} {rhs})", op.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_affine() -> Rc<ArithExpr> {
        // (var0 * 2) + 5
        ArithExpr::binary(
            ArithOp::Add,
            ArithExpr::binary(ArithOp::Mul, ArithExpr::var(0), ArithExpr::constant(2.0)),
            ArithExpr::constant(5.0),
        )
    }

    #[test]
    fn test_constant_expression() {
        // 2 + 3 * 4
        let e = ArithExpr::binary(
            ArithOp::Add,
            ArithExpr::constant(2.0),
            ArithExpr::binary(ArithOp::Mul, ArithExpr::constant(3.0), ArithExpr::constant(4.0)),
        );
        assert!(e.is_constant());
        assert_eq!(e.evaluate(7.0), 14.0);
        assert_eq!(e.evaluate(-100.0), 14.0);
        let simplified = e.simplify().unwrap();
        assert_eq!(*simplified, ArithExpr::Const(14.0));
    }

    #[test]
    fn test_affine_expression() {
        let e = sample_affine();
        assert!(!e.is_constant());
        assert_eq!(e.var_id(), Some(0));
        assert_eq!(e.multiplier().unwrap(), 2.0);
        assert_eq!(e.summand().unwrap(), 5.0);
        assert_eq!(e.evaluate(3.0), 11.0);
    }

    #[test]
    fn test_affine_with_variable_on_rhs() {
        // 10 - (var2 * 3)
        let e = ArithExpr::binary(
            ArithOp::Sub,
            ArithExpr::constant(10.0),
            ArithExpr::binary(ArithOp::Mul, ArithExpr::var(2), ArithExpr::constant(3.0)),
        );
        assert_eq!(e.multiplier().unwrap(), -3.0);
        assert_eq!(e.summand().unwrap(), 10.0);
        for v in [-2.0, 0.0, 4.5] {
            assert_eq!(e.evaluate(v), -3.0 * v + 10.0);
        }
    }

    #[test]
    fn test_affine_division() {
        // (var1 + 4) / 2
        let e = ArithExpr::binary(
            ArithOp::Div,
            ArithExpr::binary(ArithOp::Add, ArithExpr::var(1), ArithExpr::constant(4.0)),
            ArithExpr::constant(2.0),
        );
        assert_eq!(e.multiplier().unwrap(), 0.5);
        assert_eq!(e.summand().unwrap(), 2.0);
    }

    #[test]
    fn test_division_by_variable_unsupported() {
        let e = ArithExpr::binary(ArithOp::Div, ArithExpr::constant(6.0), ArithExpr::var(0));
        assert!(matches!(e.affine(), Err(EngineError::Unsupported(_))));
    }

    #[test]
    fn test_division_by_zero_is_numeric_error() {
        let e = ArithExpr::binary(ArithOp::Div, ArithExpr::constant(1.0), ArithExpr::constant(0.0));
        assert!(matches!(
            e.simplify(),
            Err(EngineError::NumericError(_))
        ));
    }

    #[test]
    fn test_simplify_preserves_evaluation() {
        // (var0 + (2 * 3)) - (4 - 4)
        let e = ArithExpr::binary(
            ArithOp::Sub,
            ArithExpr::binary(
                ArithOp::Add,
                ArithExpr::var(0),
                ArithExpr::binary(ArithOp::Mul, ArithExpr::constant(2.0), ArithExpr::constant(3.0)),
            ),
            ArithExpr::binary(ArithOp::Sub, ArithExpr::constant(4.0), ArithExpr::constant(4.0)),
        );
        let s = e.simplify().unwrap();
        for v in [-3.0, 0.0, 0.5, 17.0] {
            assert_eq!(e.evaluate(v), s.evaluate(v));
        }
    }

    #[test]
    fn test_ignore_additive_consts() {
        // var0 - var1: deltas (+1, +2) combine to -1
        let e = ArithExpr::binary(ArithOp::Sub, ArithExpr::var(0), ArithExpr::var(1));
        assert_eq!(e.evaluate_ignore_additive_consts(&[1.0, 2.0]), -1.0);

        // (var0 + 3) - var1: the constant summand must not contribute
        let e = ArithExpr::binary(
            ArithOp::Sub,
            ArithExpr::binary(ArithOp::Add, ArithExpr::var(0), ArithExpr::constant(3.0)),
            ArithExpr::var(1),
        );
        assert_eq!(e.evaluate_ignore_additive_consts(&[1.0, 2.0]), -1.0);

        // (var0 * 2) scales the delta
        let e = ArithExpr::binary(ArithOp::Mul, ArithExpr::var(0), ArithExpr::constant(2.0));
        assert_eq!(e.evaluate_ignore_additive_consts(&[1.5, 0.0]), 3.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample_affine().to_string(), "((var0 * 2) + 5)");
    }
}
