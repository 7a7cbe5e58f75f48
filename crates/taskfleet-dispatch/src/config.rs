//! Dispatcher configuration.

use std::time::Duration;

use crate::error::DispatchError;

/// Timing parameters of the poll loop.
///
/// `result_wait` bounds a single result retrieval on a handle that
/// already reported ready. It is independent of `timeout_budget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum time a task may stay unresolved before it is timed out.
    pub timeout_budget: Duration,

    /// Delay between two scans of the outstanding handles.
    pub poll_interval: Duration,

    /// Upper bound on one result retrieval.
    pub result_wait: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_budget: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            result_wait: Duration::from_secs(20),
        }
    }
}

impl DispatchConfig {
    /// Builder method to set the timeout budget.
    pub fn with_timeout_budget(mut self, budget: Duration) -> Self {
        self.timeout_budget = budget;
        self
    }

    /// Builder method to set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method to set the result retrieval bound.
    pub fn with_result_wait(mut self, wait: Duration) -> Self {
        self.result_wait = wait;
        self
    }

    /// Reject values that would make the loop spin or never time out.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.poll_interval.is_zero() {
            return Err(DispatchError::InvalidConfig(
                "poll_interval must be positive".to_string(),
            ));
        }
        if self.timeout_budget.is_zero() {
            return Err(DispatchError::InvalidConfig(
                "timeout_budget must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
