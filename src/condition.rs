//! Regular Numeric Conditions
//!
//! A regular numeric condition compares two arithmetic expressions that
//! together reference at most one regular numeric variable, so it reduces
//! to `var cmp const`. Conditions come out of task normalization (operator
//! preconditions and goals) and are shared immutably by reference.

use std::fmt;
use std::rc::Rc;

use crate::errors::{EngineError, Result};
use crate::expression::ArithExpr;

/// Comparison operators of numeric conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Comparator {
    /// Strictly less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Equal (=)
    Eq,
    /// Greater than or equal (>=)
    Ge,
    /// Strictly greater than (>)
    Gt,
}

impl Comparator {
    /// Parse a comparator from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Comparator::Lt),
            "<=" => Some(Comparator::Le),
            "=" | "==" => Some(Comparator::Eq),
            ">=" => Some(Comparator::Ge),
            ">" => Some(Comparator::Gt),
            _ => None,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "=",
            Comparator::Ge => ">=",
            Comparator::Gt => ">",
        }
    }

    /// Apply the comparison to two values.
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Eq => lhs == rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Gt => lhs > rhs,
        }
    }

    /// The comparator after multiplying both sides by a negative factor.
    pub fn flipped(&self) -> Comparator {
        match self {
            Comparator::Lt => Comparator::Gt,
            Comparator::Le => Comparator::Ge,
            Comparator::Eq => Comparator::Eq,
            Comparator::Ge => Comparator::Le,
            Comparator::Gt => Comparator::Lt,
        }
    }
}

/// A comparison `lhs cmp rhs` over at most one regular numeric variable.
#[derive(Debug, Clone)]
pub struct RegularNumericCondition {
    lhs: Rc<ArithExpr>,
    comparator: Comparator,
    rhs: Rc<ArithExpr>,
}

impl RegularNumericCondition {
    /// Build a condition; both sides are simplified up front.
    ///
    /// Errors with [`EngineError::Unsupported`] when both sides still
    /// reference a variable after simplification. Callers rewrite such
    /// comparisons through an auxiliary variable first.
    pub fn new(
        lhs: Rc<ArithExpr>,
        comparator: Comparator,
        rhs: Rc<ArithExpr>,
    ) -> Result<RegularNumericCondition> {
        let lhs = lhs.simplify()?;
        let rhs = rhs.simplify()?;
        if lhs.var_id().is_some() && rhs.var_id().is_some() {
            return Err(EngineError::Unsupported(format!(
                "condition {lhs} {} {rhs} refers to two numeric variables",
                comparator.as_str()
            )));
        }
        Ok(RegularNumericCondition { lhs, comparator, rhs })
    }

    /// The variable the condition constrains, if any.
    pub fn var_id(&self) -> Option<usize> {
        self.lhs.var_id().or_else(|| self.rhs.var_id())
    }

    /// True iff neither side references a variable.
    pub fn is_constant(&self) -> bool {
        self.var_id().is_none()
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Check the condition with `value` substituted for the variable.
    pub fn satisfied(&self, value: f64) -> bool {
        self.comparator
            .holds(self.lhs.evaluate(value), self.rhs.evaluate(value))
    }

    /// Truth value of a constant condition.
    pub fn constant_satisfied(&self) -> Result<bool> {
        let lhs = self.lhs.evaluate_constant()?;
        let rhs = self.rhs.evaluate_constant()?;
        Ok(self.comparator.holds(lhs, rhs))
    }

    /// The normalized form `var cmp' const`.
    ///
    /// Folds the affine coefficients of the variable side through the
    /// comparison: `m*v + s cmp c` becomes `v cmp (c - s) / m`, with the
    /// comparator flipped when `m` is negative.
    pub fn normalized(&self) -> Result<(Comparator, f64)> {
        let (var_side, const_side, comparator) = if self.lhs.var_id().is_some() {
            (&self.lhs, &self.rhs, self.comparator)
        } else if self.rhs.var_id().is_some() {
            // Mirror `c cmp m*v + s` to `m*v + s cmp' c` first.
            (&self.rhs, &self.lhs, self.comparator.flipped())
        } else {
            return Err(EngineError::Internal(
                "normalized form requested for a constant condition".to_string(),
            ));
        };
        let c = const_side.evaluate_constant()?;
        let (m, s) = var_side.affine()?;
        if m == 0.0 {
            return Err(EngineError::NumericError(format!(
                "variable coefficient is zero in {self}"
            )));
        }
        let bound = (c - s) / m;
        if m < 0.0 {
            Ok((comparator.flipped(), bound))
        } else {
            Ok((comparator, bound))
        }
    }

    /// Right-hand constant of the normalized form `var cmp const`.
    pub fn constant(&self) -> Result<f64> {
        self.normalized().map(|(_, c)| c)
    }
}

impl fmt::Display for RegularNumericCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.comparator.as_str(), self.rhs)
    }
}
