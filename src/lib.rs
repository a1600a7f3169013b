//! # NumPlan Pattern Database Engine
//!
//! Admissible pattern-database heuristics for numeric planning tasks:
//! tasks whose states combine finite-domain ("propositional") variables
//! with real-valued ("numeric") variables connected by comparisons,
//! additive effects, and assignments.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Raw PlanningTask
//!     ↓
//! [Normalization]        → NormalizedTask (conditions, auxiliaries,
//!     ↓                    flattened operators, domain estimates)
//! [Causal Graph]         → pre→eff / eff↔eff adjacency (cached per task)
//!     ↓
//! [Pattern Generators]   → greedy | systematic | hill climbing | manual
//!     ↓
//! [Pattern Databases]    → per-pattern abstract goal distances
//!     ↓                    (match tree + state registry inside)
//! [Additivity Analysis]  → maximal additive subsets (max cliques)
//!     ↓
//! [Canonical Evaluator]  → max over subsets of summed PDB values
//!     ↓
//! [Heuristic Façade]     → h(state) or DeadEnd, cached per state
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use numplan::condition::Comparator;
//! use numplan::task::{NormalizedTask, OperatorBuilder, TaskBuilder};
//! use numplan::{CanonicalPdbsHeuristic, Config, HeuristicValue};
//!
//! // A toy task: reach truck_loaded=1 and fuel >= 3.
//! let mut builder = TaskBuilder::new();
//! let loaded = builder.prop_variable("truck_loaded", 2);
//! let fuel = builder.numeric_variable("fuel", 0.0);
//! let one = builder.numeric_constant(1.0);
//! let three = builder.numeric_constant(3.0);
//! let fueled = builder.comparison("fueled", fuel, Comparator::Ge, three);
//!
//! builder.add_operator(OperatorBuilder::new("load").effect(loaded, 1).cost(1.0));
//! builder.add_operator(OperatorBuilder::new("refuel").increase(fuel, one).cost(1.0));
//! builder.goal(loaded, 1).goal(fueled, 1);
//!
//! let task = NormalizedTask::new(builder.build()).unwrap();
//! let heuristic = CanonicalPdbsHeuristic::from_config(&task, &Config::default()).unwrap();
//!
//! let eval = heuristic.evaluate(&task.initial_state());
//! assert_eq!(eval.value, HeuristicValue::Estimate(4.0));
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `task` | raw task model, builders, normalization |
//! | `expression`, `condition` | arithmetic trees and numeric conditions |
//! | `causal_graph` | variable dependency analysis |
//! | `search` | match tree and abstract-state registry |
//! | `pdb` | pattern databases, additivity, canonical evaluation |
//! | `generators` | pattern and pattern-collection generators |
//! | `sampling` | random-walk state sampling |
//! | `heuristic` | the `h(state)` façade |
//! | `config`, `logging` | figment configuration and tracing setup |

pub mod causal_graph;
pub mod condition;
pub mod config;
pub mod errors;
pub mod expression;
pub mod generators;
pub mod heuristic;
pub mod logging;
pub mod pdb;
pub mod sampling;
pub mod search;
pub mod statistics;
pub mod task;
pub mod timeout;
pub mod types;
pub mod validation;
pub mod value;

// Re-export the public surface
pub use crate::causal_graph::CausalGraph;
pub use crate::condition::{Comparator, RegularNumericCondition};
pub use crate::config::Config;
pub use crate::errors::{EngineError, Result};
pub use crate::expression::{ArithExpr, ArithOp};
pub use crate::generators::{
    PatternCollectionGenerator, PatternCollectionGeneratorHillclimbing,
    PatternCollectionGeneratorSystematic, PatternCollectionInformation, PatternGenerator,
    PatternGeneratorGreedy, PatternGeneratorManual, VariableOrderType,
};
pub use crate::heuristic::{CanonicalPdbsHeuristic, Evaluation, HeuristicValue, PdbHeuristic};
pub use crate::pdb::additivity::{are_patterns_additive, compute_additive_vars};
pub use crate::pdb::canonical::CanonicalPdbs;
pub use crate::pdb::incremental::IncrementalCanonicalPdbs;
pub use crate::pdb::PatternDatabase;
pub use crate::task::{NormalizedTask, PlanningTask, State, TaskBuilder};
pub use crate::timeout::CountdownTimer;
pub use crate::types::{MaxAdditiveSubsets, Pattern, PatternCollection, PdbCollection};
