//! Queue consumers that execute jobs and apply retry policies.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use taskfleet_core::{HandleId, RetryPolicy};

use crate::backend::{JobState, ResultBackend};
use crate::client::TaskOutput;
use crate::error::TaskError;
use crate::task::{TaskContext, TaskRef};

/// One submission travelling through a queue.
pub(crate) struct Job {
    pub id: HandleId,
    pub task_name: String,
    pub retry: RetryPolicy,
    pub task: TaskRef,
    pub cancel: CancellationToken,
}

/// Receiver shared by all consumers of one queue.
pub(crate) type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Consume jobs from a queue until shutdown or until the queue closes.
pub(crate) async fn consume(
    queue: String,
    consumer: usize,
    jobs: SharedReceiver,
    backend: Arc<ResultBackend>,
    shutdown: CancellationToken,
) {
    debug!(queue = %queue, consumer, "Worker started");

    loop {
        let job = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                _ = shutdown.cancelled() => break,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            }
        };

        execute(job, &backend).await;
    }

    debug!(queue = %queue, consumer, "Worker stopped");
}

/// Run a job to a terminal state, retrying transient failures.
pub(crate) async fn execute(job: Job, backend: &ResultBackend) {
    if job.cancel.is_cancelled() {
        info!(handle = %job.id, task = %job.task_name, "Job revoked before start");
        backend.set(&job.id, JobState::Revoked).await;
        return;
    }

    let mut retries = 0;
    loop {
        backend.set(&job.id, JobState::Started { retries }).await;

        let ctx = TaskContext {
            task_name: job.task_name.clone(),
            retries,
            cancel: job.cancel.child_token(),
        };
        let task = job.task.clone();
        let mut attempt = tokio::spawn(async move { task.run(ctx).await });

        let joined = tokio::select! {
            _ = job.cancel.cancelled() => None,
            joined = &mut attempt => Some(joined),
        };

        let result = match joined {
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(TaskError::fatal(format!("task panicked: {e}"))),
            None => {
                attempt.abort();
                info!(handle = %job.id, task = %job.task_name, retries, "Job revoked while running");
                backend.set(&job.id, JobState::Revoked).await;
                return;
            }
        };

        match result {
            Ok(value) => {
                info!(handle = %job.id, task = %job.task_name, retries, "Job succeeded");
                backend
                    .set(&job.id, JobState::Succeeded(TaskOutput::new(value, retries)))
                    .await;
                return;
            }
            Err(TaskError::Transient(message)) if retries < job.retry.retries_allowed() => {
                warn!(
                    handle = %job.id,
                    task = %job.task_name,
                    retries,
                    max_attempts = job.retry.max_attempts,
                    delay_ms = job.retry.backoff_delay.as_millis() as u64,
                    error = %message,
                    "Attempt failed, retrying"
                );
                backend
                    .set(&job.id, JobState::Retrying { retries: retries + 1 })
                    .await;

                tokio::select! {
                    _ = job.cancel.cancelled() => {
                        info!(handle = %job.id, task = %job.task_name, "Job revoked during backoff");
                        backend.set(&job.id, JobState::Revoked).await;
                        return;
                    }
                    _ = tokio::time::sleep(job.retry.backoff_delay) => {}
                }
                retries += 1;
            }
            Err(e) => {
                warn!(handle = %job.id, task = %job.task_name, retries, error = %e, "Job failed");
                backend.set(&job.id, JobState::Failed(e.to_string())).await;
                return;
            }
        }
    }
}
