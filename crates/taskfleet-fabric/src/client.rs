//! Client side of the execution fabric.
//!
//! The dispatcher only ever talks to a fabric through [`ExecutionFabric`]:
//! submit a spec, poll the returned handle, fetch its result, or ask for
//! it to be cancelled.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::Instant;

use taskfleet_core::{HandleId, TaskSpec};

use crate::error::FabricError;

/// Caller-side reference to an in-flight task execution.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    /// Submission identifier.
    pub id: HandleId,

    /// Name of the submitted task.
    pub task_name: String,

    /// Queue the task was routed to.
    pub queue: String,

    /// Wall-clock submission time.
    pub submitted_at: DateTime<Utc>,

    /// Monotonic submission instant, used for durations and timeouts.
    pub submitted: Instant,
}

impl TaskHandle {
    /// Create a handle for a spec submitted now.
    pub fn new(spec: &TaskSpec) -> Self {
        Self {
            id: HandleId::generate(),
            task_name: spec.name.clone(),
            queue: spec.queue.clone(),
            submitted_at: Utc::now(),
            submitted: Instant::now(),
        }
    }

    /// Time since submission.
    pub fn elapsed(&self) -> Duration {
        self.submitted.elapsed()
    }
}

/// Payload of a successful task, plus the retries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    /// Value returned by the task.
    pub value: Value,

    /// Failed attempts before the successful one.
    pub retries: u32,
}

impl TaskOutput {
    /// Create a new TaskOutput.
    pub fn new(value: Value, retries: u32) -> Self {
        Self { value, retries }
    }
}

/// Contract of the broker and worker pool that execute tasks.
#[async_trait]
pub trait ExecutionFabric: Send + Sync {
    /// Submit a task. Never blocks on execution.
    async fn submit(&self, spec: &TaskSpec) -> Result<TaskHandle, FabricError>;

    /// Non-blocking readiness poll: true once the task has a final
    /// result or error.
    async fn is_ready(&self, handle: &TaskHandle) -> bool;

    /// Retrieve the final result, waiting at most `wait_bound`.
    async fn get_result(
        &self,
        handle: &TaskHandle,
        wait_bound: Duration,
    ) -> Result<TaskOutput, FabricError>;

    /// Best-effort cancellation. May be a no-op when the task already
    /// finished; an error is informational only.
    async fn cancel(&self, handle: &TaskHandle) -> Result<(), FabricError>;
}
