//! Error types for the execution fabric.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by an [`crate::ExecutionFabric`] call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FabricError {
    /// No task implementation registered under this name.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The handle does not belong to this fabric.
    #[error("Handle not found: {0}")]
    HandleNotFound(String),

    /// The task raised an error that survived its retry policy.
    #[error("{0}")]
    TaskFailed(String),

    /// The task was revoked before it produced a result.
    #[error("Task was revoked")]
    Revoked,

    /// Result retrieval exceeded its wait bound.
    #[error("Timed out after {0:?} waiting for result")]
    WaitTimeout(Duration),

    /// The queue's consumers are gone.
    #[error("Queue closed: {0}")]
    QueueClosed(String),

    /// Invalid fabric configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors a task implementation returns from one invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Failure worth retrying under the task's retry policy.
    #[error("{0}")]
    Transient(String),

    /// Failure surfaced immediately, without retry.
    #[error("{0}")]
    Fatal(String),
}

impl TaskError {
    /// Create a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Create a fatal error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Returns true if the retry policy applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
