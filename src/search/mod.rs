//! Abstract-State Search Support
//!
//! Building blocks for the exploration of projected state spaces: a
//! successor trie over abstract propositional states ([`match_tree`]) and
//! a content-addressed registry of abstract numeric states
//! ([`state_registry`]).

pub mod match_tree;
pub mod state_registry;

pub use match_tree::MatchTree;
pub use state_registry::{AbstractState, NumericStateRegistry};
