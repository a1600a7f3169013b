//! Countdown Timer
//!
//! Cooperative deadline enforcement for long-running construction.
//!
//! ## Design
//!
//! The engine is single-threaded, so there is no preemption: code that
//! may run long (the hill-climbing loop, sampling) periodically calls
//! [`CountdownTimer::check`] and unwinds with a timeout error when the
//! deadline has passed. Callers that own the loop catch that error and
//! return the best result so far.

use std::time::{Duration, Instant};

use crate::errors::{EngineError, Result};

/// Deadline checked cooperatively between work items.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    start_time: Instant,
    limit: Option<Duration>,
}

impl CountdownTimer {
    /// Create a timer with the given limit; `None` never expires.
    pub fn new(limit: Option<Duration>) -> CountdownTimer {
        CountdownTimer { start_time: Instant::now(), limit }
    }

    /// A timer that never expires.
    pub fn infinite() -> CountdownTimer {
        CountdownTimer::new(None)
    }

    /// Time spent since construction.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Remaining time before expiry, if a limit is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(self.elapsed()))
    }

    pub fn is_expired(&self) -> bool {
        match self.limit {
            Some(limit) => self.elapsed() > limit,
            None => false,
        }
    }

    /// Ok while running; [`EngineError::Timeout`] once expired.
    pub fn check(&self) -> Result<()> {
        match self.limit {
            Some(limit) if self.elapsed() > limit => Err(EngineError::Timeout {
                limit,
                elapsed: self.elapsed(),
            }),
            _ => Ok(()),
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        CountdownTimer::infinite()
    }
}
