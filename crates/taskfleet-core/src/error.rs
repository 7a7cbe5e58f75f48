//! Core domain errors.

use thiserror::Error;

/// Batch-level precondition failures.
///
/// These are the only errors a dispatch call raises; per-task failures
/// are captured as [`crate::Outcome`] data instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The batch contained no tasks.
    #[error("Batch is empty")]
    EmptyBatch,

    /// Two specs in one batch share a name.
    #[error("Duplicate task name in batch: {0}")]
    DuplicateTaskName(String),

    /// Retry policy allows no attempts at all.
    #[error("Invalid retry policy for task '{task}': max_attempts must be positive")]
    InvalidRetryPolicy { task: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
