//! Engine Error Types
//!
//! All fatal conditions surface as one [`EngineError`]. Construction of the
//! normalized task, of pattern databases, and of pattern collections aborts
//! with a distinct kind; nothing in this crate panics on malformed but
//! well-typed input.
//!
//! Non-fatal conditions are reported through values instead: heuristic
//! lookups return infinity for proven dead ends, and pattern validation
//! deduplicates with a warning.

use std::time::Duration;

/// Fatal errors reported by the engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Task uses a feature outside the supported fragment
    /// (non-numeric axioms, conditional effects, non-linear effects,
    /// two-variable expressions that survive normalization, ...).
    #[error("unsupported task feature: {0}")]
    Unsupported(String),

    /// An option or argument outside its documented bounds.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The mixed-radix product of a pattern's domain sizes does not fit
    /// the hash index range.
    #[error("pattern too large, domain size product overflows: {0}")]
    Overflow(String),

    /// Division by zero while folding or solving arithmetic.
    #[error("numeric error: {0}")]
    NumericError(String),

    /// A case the type system could not rule out was reached.
    #[error("internal error: {0}")]
    Internal(String),

    /// A cooperative deadline expired.
    #[error("timed out after {elapsed:?} (limit {limit:?})")]
    Timeout { limit: Duration, elapsed: Duration },
}

impl EngineError {
    /// True for [`EngineError::Timeout`]; hill climbing catches this kind
    /// and returns the best collection found so far.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;
