//! Logging Setup
//!
//! Installs a `tracing` subscriber according to the `[logging]` config
//! section. Library code only emits events; hosts that want output call
//! this once at startup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::errors::{EngineError, Result};

/// Initialize the global subscriber from the logging configuration.
///
/// The `NUMPLAN_LOG` environment variable overrides the configured
/// level with a full filter directive. Fails if a subscriber is already
/// installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_env("NUMPLAN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        "text" => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        other => {
            return Err(EngineError::InvalidArgument(format!(
                "unknown log format '{other}' (expected 'text' or 'json')"
            )))
        }
    };
    result.map_err(|err| EngineError::Internal(format!("failed to install subscriber: {err}")))
}
