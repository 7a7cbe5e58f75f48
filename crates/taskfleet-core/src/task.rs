//! Task specifications and their retry policy.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Automatic retry policy declared by a task.
///
/// The fabric re-invokes a task that failed transiently up to
/// `max_attempts - 1` more times, waiting `backoff_delay` between
/// attempts. The dispatcher never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of invocations allowed, first one included.
    pub max_attempts: u32,

    /// Wait between two consecutive attempts.
    #[serde(with = "crate::secs")]
    pub backoff_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a new RetryPolicy.
    pub fn new(max_attempts: u32, backoff_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff_delay,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Number of re-invocations after the first attempt.
    pub fn retries_allowed(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }
}

/// A unit of work to dispatch: a stable name, a target queue and the
/// retry policy the fabric applies to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task name, unique within a batch.
    pub name: String,

    /// Queue the task is routed to.
    pub queue: String,

    /// Automatic retry policy.
    pub retry: RetryPolicy,
}

impl TaskSpec {
    /// Create a new TaskSpec with the default retry policy.
    pub fn new(name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: queue.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Builder method to replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder method to set the attempt limit.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    /// Builder method to set the delay between attempts.
    pub fn with_backoff(mut self, delay: Duration) -> Self {
        self.retry.backoff_delay = delay;
        self
    }

    /// Check this spec on its own.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("task name is empty".to_string()));
        }
        if self.queue.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "queue for task '{}' is empty",
                self.name
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::InvalidRetryPolicy {
                task: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Check batch preconditions before anything is submitted.
pub fn validate_batch(specs: &[TaskSpec]) -> Result<(), CoreError> {
    if specs.is_empty() {
        return Err(CoreError::EmptyBatch);
    }

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        spec.validate()?;
        if !seen.insert(spec.name.as_str()) {
            return Err(CoreError::DuplicateTaskName(spec.name.clone()));
        }
    }
    Ok(())
}
