//! Pattern Validation
//!
//! Patterns arriving from callers or generators are normalized before
//! use: both sides sorted, duplicates removed with a warning, and
//! out-of-range variables rejected.

use tracing::warn;

use crate::errors::{EngineError, Result};
use crate::task::NormalizedTask;
use crate::types::{Pattern, PatternCollection};

fn validate_and_normalize_side(vars: &mut Vec<usize>, num_variables: usize, side: &str) -> Result<()> {
    vars.sort_unstable();
    let before = vars.len();
    vars.dedup();
    if vars.len() < before {
        warn!(side, "duplicate variables in pattern have been removed");
    }
    if let Some(&last) = vars.last() {
        if last >= num_variables {
            return Err(EngineError::InvalidArgument(format!(
                "{side} variable {last} out of range (task has {num_variables})"
            )));
        }
    }
    Ok(())
}

/// Sort and deduplicate both sides; error on out-of-range variables.
pub fn validate_and_normalize_pattern(task: &NormalizedTask, pattern: &mut Pattern) -> Result<()> {
    validate_and_normalize_side(
        &mut pattern.propositional,
        task.prop_variables().len(),
        "propositional",
    )?;
    validate_and_normalize_side(
        &mut pattern.numeric,
        task.numeric_variables().len(),
        "numeric",
    )?;
    for &var in &pattern.numeric {
        if task.regular_index(var).is_none() {
            return Err(EngineError::InvalidArgument(format!(
                "numeric pattern variable {var} is not a regular numeric variable"
            )));
        }
    }
    Ok(())
}

/// Validate every pattern of a collection; warn about duplicates.
pub fn validate_and_normalize_patterns(
    task: &NormalizedTask,
    patterns: &mut PatternCollection,
) -> Result<()> {
    for pattern in patterns.iter_mut() {
        validate_and_normalize_pattern(task, pattern)?;
    }
    let mut sorted = patterns.clone();
    sorted.sort();
    let before = sorted.len();
    sorted.dedup();
    if sorted.len() < before {
        warn!("duplicate patterns have been detected");
    }
    Ok(())
}
