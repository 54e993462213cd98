//! Engine configuration
//!
//! This module provides the tunables of the constraint engine: the retry budget of a single
//! generation step and the optional time budget handed to the solver.

use std::time::Duration;

/// Configuration for constraint generation and solving
///
/// The defaults reproduce the unbounded solver behaviour: every check may block until the
/// solver reaches a verdict. Setting a [`solver_timeout`](Self::solver_timeout) turns long
/// checks into `unknown` answers, which the completeness checker treats as "not complete".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmorConfig {
    /// Maximum number of candidates tried by one generation step before it gives up
    /// (default: 1000)
    pub max_attempts: usize,

    /// Time budget applied to every solver check, `None` for no limit (default: `None`)
    pub solver_timeout: Option<Duration>,
}

impl Default for ArmorConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            solver_timeout: None,
        }
    }
}

impl ArmorConfig {
    /// Default retry budget of one generation step.
    pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

    /// Sets the retry budget of one generation step.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the time budget applied to every solver check.
    #[must_use]
    pub fn with_solver_timeout(mut self, timeout: Duration) -> Self {
        self.solver_timeout = Some(timeout);
        self
    }

    /// Returns the solver timeout in milliseconds, saturated to `u32::MAX`.
    #[must_use]
    pub fn solver_timeout_ms(&self) -> Option<u32> {
        self.solver_timeout
            .map(|timeout| u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX))
    }
}
