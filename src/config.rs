//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - numplan.toml (default configuration)
//! - numplan.local.toml (git-ignored local overrides)
//! - Environment variables (NUMPLAN_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # numplan.toml
//! [pdb]
//! max_number_pdb_states = 10000
//! max_pdb_size = 1000000
//!
//! [hill_climbing]
//! num_samples = 1000
//! max_time_secs = 60.0
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! NUMPLAN_PDB__MAX_PDB_SIZE=500000
//! NUMPLAN_HILL_CLIMBING__NUM_SAMPLES=200
//! ```

use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::generators::VariableOrderType;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pdb: PdbConfig,
    #[serde(default)]
    pub hill_climbing: HillClimbingConfig,
    #[serde(default)]
    pub systematic: SystematicConfig,
    #[serde(default)]
    pub ordering: OrderingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Budgets for individual pattern databases and the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdbConfig {
    /// Hard cap on reached abstract states per PDB that contains a
    /// numeric variable; purely propositional PDBs are fully explored.
    #[serde(default = "default_max_number_pdb_states")]
    pub max_number_pdb_states: usize,

    /// Cap on the domain-size product of a pattern.
    #[serde(default = "default_max_pdb_size")]
    pub max_pdb_size: usize,

    /// Cap on total states across all PDBs in the canonical collection.
    #[serde(default = "default_collection_max_size")]
    pub collection_max_size: usize,

    /// Prune dominated additive subsets after collection construction.
    #[serde(default = "default_true")]
    pub dominance_pruning: bool,
}

/// Hill-climbing loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HillClimbingConfig {
    /// Samples per iteration.
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    /// Minimum improvement count to accept a candidate.
    #[serde(default = "default_min_improvement")]
    pub min_improvement: usize,

    /// Wall-clock budget in seconds; absent = run to convergence,
    /// 0 = skip hill climbing.
    #[serde(default)]
    pub max_time_secs: Option<f64>,

    /// Seed for sampling and randomized variable orders.
    #[serde(default)]
    pub seed: u64,
}

/// Systematic enumeration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystematicConfig {
    /// Maximum variable count per pattern.
    #[serde(default = "default_pattern_max_size")]
    pub pattern_max_size: usize,

    /// Restrict enumeration to interesting (SGA-union) patterns.
    #[serde(default = "default_true")]
    pub only_interesting_patterns: bool,
}

/// Variable-order parameters for the greedy generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Tie-break variable ordering toward numeric variables.
    #[serde(default = "default_true")]
    pub prefer_numeric_variables: bool,

    #[serde(default = "default_variable_order")]
    pub variable_order: VariableOrderType,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_max_number_pdb_states() -> usize { 10_000 }
fn default_max_pdb_size() -> usize { 1_000_000 }
fn default_collection_max_size() -> usize { 10_000_000 }
fn default_num_samples() -> usize { 1000 }
fn default_min_improvement() -> usize { 10 }
fn default_pattern_max_size() -> usize { 1 }
fn default_variable_order() -> VariableOrderType { VariableOrderType::GoalCausalLevel }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }

impl Default for PdbConfig {
    fn default() -> Self {
        PdbConfig {
            max_number_pdb_states: default_max_number_pdb_states(),
            max_pdb_size: default_max_pdb_size(),
            collection_max_size: default_collection_max_size(),
            dominance_pruning: true,
        }
    }
}

impl Default for HillClimbingConfig {
    fn default() -> Self {
        HillClimbingConfig {
            num_samples: default_num_samples(),
            min_improvement: default_min_improvement(),
            max_time_secs: None,
            seed: 0,
        }
    }
}

impl Default for SystematicConfig {
    fn default() -> Self {
        SystematicConfig {
            pattern_max_size: default_pattern_max_size(),
            only_interesting_patterns: true,
        }
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        OrderingConfig {
            prefer_numeric_variables: true,
            variable_order: default_variable_order(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pdb: PdbConfig::default(),
            hill_climbing: HillClimbingConfig::default(),
            systematic: SystematicConfig::default(),
            ordering: OrderingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HillClimbingConfig {
    /// The wall-clock budget as a duration, if one is set.
    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_secs.map(Duration::from_secs_f64)
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. numplan.toml (base configuration)
    /// 2. numplan.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (NUMPLAN_* prefix)
    pub fn load() -> std::result::Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("numplan.toml"))
            .merge(Toml::file("numplan.local.toml"))
            .merge(Env::prefixed("NUMPLAN_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> std::result::Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("NUMPLAN_").split("__"))
            .extract()
    }

    /// Check every option against its documented bounds.
    pub fn validate(&self) -> Result<()> {
        fn at_least_one(value: usize, name: &str) -> Result<()> {
            if value == 0 {
                return Err(EngineError::InvalidArgument(format!(
                    "{name} must be at least 1"
                )));
            }
            Ok(())
        }
        at_least_one(self.pdb.max_number_pdb_states, "pdb.max_number_pdb_states")?;
        at_least_one(self.pdb.max_pdb_size, "pdb.max_pdb_size")?;
        at_least_one(self.pdb.collection_max_size, "pdb.collection_max_size")?;
        at_least_one(self.hill_climbing.num_samples, "hill_climbing.num_samples")?;
        at_least_one(self.hill_climbing.min_improvement, "hill_climbing.min_improvement")?;
        at_least_one(self.systematic.pattern_max_size, "systematic.pattern_max_size")?;
        if self.hill_climbing.min_improvement > self.hill_climbing.num_samples {
            return Err(EngineError::InvalidArgument(
                "hill_climbing.min_improvement must not exceed num_samples".to_string(),
            ));
        }
        if let Some(secs) = self.hill_climbing.max_time_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(EngineError::InvalidArgument(format!(
                    "hill_climbing.max_time_secs must be a non-negative number, got {secs}"
                )));
            }
        }
        Ok(())
    }
}
