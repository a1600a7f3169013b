//! Construction and Search Statistics
//!
//! Plain serializable records describing what a construction run did.
//! They are logged through `tracing` at the point of origin and exposed
//! on the owning objects so callers can persist or inspect them.

use serde::Serialize;

/// Statistics of one pattern-database construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdbStats {
    /// Abstract states interned during forward exploration (mixed path)
    /// or enumerated (propositional path).
    pub generated_states: usize,
    /// Abstract goal states discovered.
    pub reached_goal_states: usize,
    /// States assigned a finite distance by the backward pass.
    pub backward_reachable_states: usize,
    /// Registry size before compaction, when compaction fired.
    pub shrunk_from: Option<usize>,
    /// True when forward exploration drained the abstract state space
    /// within budget.
    pub exhausted_abstract_state_space: bool,
}

/// Statistics of one hill-climbing run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HillClimbingStats {
    pub iterations: usize,
    /// Distinct candidate patterns for which a PDB was built.
    pub generated_patterns: usize,
    /// Candidates rejected by the per-PDB size budget.
    pub rejected_patterns: usize,
    /// Largest candidate PDB size estimate seen.
    pub max_pdb_size: usize,
    /// Total size estimate of the final collection.
    pub collection_size: usize,
    /// Number of patterns in the final collection.
    pub num_patterns: usize,
    /// True when the run ended on the wall-clock budget.
    pub timed_out: bool,
}
