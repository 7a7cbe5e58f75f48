//! Task contract executed by fabric workers.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared reference to a task implementation.
pub type TaskRef = Arc<dyn Task>;

/// Context passed to every invocation of a task.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Name the task was registered under.
    pub task_name: String,

    /// Failed attempts so far (0 on the first invocation).
    pub retries: u32,

    /// Cancelled when the submission is revoked.
    pub cancel: CancellationToken,
}

/// A unit of business logic a worker can invoke.
///
/// One invocation is one attempt; the fabric applies the retry policy
/// around it.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    async fn run(&self, ctx: TaskContext) -> Result<Value, TaskError>;
}

/// Function-backed task.
///
/// Wraps a closure that creates a new future per invocation.
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Create a new function-backed task.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Create the task and return it as a [`TaskRef`].
    pub fn arc<Fut>(f: F) -> TaskRef
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: TaskContext) -> Result<Value, TaskError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_task_fn_sees_context() {
        let task = TaskFn::arc(|ctx: TaskContext| async move {
            Ok(json!({ "task": ctx.task_name, "retries": ctx.retries }))
        });

        let ctx = TaskContext {
            task_name: "echo".to_string(),
            retries: 2,
            cancel: CancellationToken::new(),
        };
        let value = task.run(ctx).await.unwrap();
        assert_eq!(value, json!({ "task": "echo", "retries": 2 }));
    }

    #[tokio::test]
    async fn test_task_fn_error() {
        let task = TaskFn::arc(|_ctx: TaskContext| async { Err(TaskError::fatal("nope")) });
        let ctx = TaskContext {
            task_name: "bad".to_string(),
            retries: 0,
            cancel: CancellationToken::new(),
        };
        let err = task.run(ctx).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "nope");
    }
}
