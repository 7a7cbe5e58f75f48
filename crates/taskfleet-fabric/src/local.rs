//! In-process execution fabric.
//!
//! [`LocalFabric`] routes submissions to named queues, each drained by a
//! fixed number of worker loops, and records results in a
//! [`ResultBackend`]. Jobs routed to a queue nobody consumes are parked
//! and stay pending, the same way a broker holds messages for a queue
//! whose workers are down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use taskfleet_core::TaskSpec;

use crate::backend::{JobState, ResultBackend};
use crate::client::{ExecutionFabric, TaskHandle, TaskOutput};
use crate::config::FabricConfig;
use crate::error::FabricError;
use crate::task::TaskRef;
use crate::worker::{self, Job};

/// Builder for [`LocalFabric`].
pub struct LocalFabricBuilder {
    config: FabricConfig,
    tasks: HashMap<String, TaskRef>,
    queues: Vec<(String, usize)>,
}

impl LocalFabricBuilder {
    /// Register a task implementation under `name`.
    pub fn task(mut self, name: impl Into<String>, task: TaskRef) -> Self {
        self.tasks.insert(name.into(), task);
        self
    }

    /// Declare a queue drained by `consumers` workers.
    pub fn queue(mut self, name: impl Into<String>, consumers: usize) -> Self {
        self.queues.push((name.into(), consumers));
        self
    }

    /// Spawn the workers and return the fabric.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<LocalFabric, FabricError> {
        let backend = Arc::new(ResultBackend::new());
        let shutdown = CancellationToken::new();
        let mut queues = HashMap::new();

        for (name, consumers) in self.queues {
            if consumers == 0 {
                return Err(FabricError::Config(format!(
                    "queue '{}' declared with no consumers",
                    name
                )));
            }
            if queues.contains_key(&name) {
                return Err(FabricError::Config(format!(
                    "queue '{}' declared twice",
                    name
                )));
            }

            let (tx, rx) = mpsc::unbounded_channel::<Job>();
            let rx = Arc::new(tokio::sync::Mutex::new(rx));
            for consumer in 0..consumers {
                tokio::spawn(worker::consume(
                    name.clone(),
                    consumer,
                    rx.clone(),
                    backend.clone(),
                    shutdown.clone(),
                ));
            }
            queues.insert(name, tx);
        }

        let queue_names: Vec<&str> = queues.keys().map(String::as_str).collect();
        info!(
            broker = %self.config.broker_url,
            backend = %self.config.result_backend,
            queues = ?queue_names,
            tasks = self.tasks.len(),
            "Local fabric started"
        );

        Ok(LocalFabric {
            config: self.config,
            tasks: self.tasks,
            queues,
            parked: Mutex::new(Vec::new()),
            backend,
            shutdown,
        })
    }
}

/// Execution fabric running tasks on tokio workers in this process.
///
/// A submission's slot is released once its terminal result has been
/// retrieved. Handles abandoned without retrieval, such as revoked ones,
/// keep their slot until the fabric is dropped.
pub struct LocalFabric {
    config: FabricConfig,
    tasks: HashMap<String, TaskRef>,
    queues: HashMap<String, mpsc::UnboundedSender<Job>>,
    parked: Mutex<Vec<Job>>,
    backend: Arc<ResultBackend>,
    shutdown: CancellationToken,
}

impl LocalFabric {
    /// Start building a fabric.
    pub fn builder(config: FabricConfig) -> LocalFabricBuilder {
        LocalFabricBuilder {
            config,
            tasks: HashMap::new(),
            queues: Vec::new(),
        }
    }

    /// Connection parameters this fabric was built with.
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Current state of a submission.
    pub async fn state(&self, handle: &TaskHandle) -> Option<JobState> {
        self.backend.state(&handle.id).await
    }

    /// Number of jobs waiting on queues without consumers.
    pub fn parked_count(&self) -> usize {
        self.parked.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Stop all workers. Jobs already running finish their attempt.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for LocalFabric {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl ExecutionFabric for LocalFabric {
    async fn submit(&self, spec: &TaskSpec) -> Result<TaskHandle, FabricError> {
        let task = self
            .tasks
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| FabricError::UnknownTask(spec.name.clone()))?;

        let handle = TaskHandle::new(spec);
        let cancel = CancellationToken::new();
        self.backend.register(handle.id.clone(), cancel.clone()).await;

        let job = Job {
            id: handle.id.clone(),
            task_name: spec.name.clone(),
            retry: spec.retry,
            task,
            cancel,
        };

        match self.queues.get(&spec.queue) {
            Some(tx) => {
                if tx.send(job).is_err() {
                    self.backend.remove(&handle.id).await;
                    return Err(FabricError::QueueClosed(spec.queue.clone()));
                }
                debug!(handle = %handle.id, task = %spec.name, queue = %spec.queue, "Job enqueued");
            }
            None => {
                warn!(
                    handle = %handle.id,
                    task = %spec.name,
                    queue = %spec.queue,
                    "No consumer for queue, job parked"
                );
                if let Ok(mut parked) = self.parked.lock() {
                    parked.push(job);
                }
            }
        }

        Ok(handle)
    }

    /// Unknown handles report ready so that retrieval surfaces the error.
    async fn is_ready(&self, handle: &TaskHandle) -> bool {
        self.backend
            .state(&handle.id)
            .await
            .map_or(true, |state| state.is_terminal())
    }

    async fn get_result(
        &self,
        handle: &TaskHandle,
        wait_bound: Duration,
    ) -> Result<TaskOutput, FabricError> {
        let result = self.backend.wait(&handle.id, wait_bound).await;
        // Delivered terminal results are not kept.
        if !matches!(result, Err(FabricError::WaitTimeout(_))) {
            self.backend.remove(&handle.id).await;
        }
        result
    }

    async fn cancel(&self, handle: &TaskHandle) -> Result<(), FabricError> {
        self.backend.cancel(&handle.id).await?;
        if let Ok(mut parked) = self.parked.lock() {
            parked.retain(|job| job.id != handle.id);
        }
        info!(handle = %handle.id, task = %handle.task_name, "Revoke requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::task::{TaskContext, TaskFn};
    use serde_json::json;

    fn hello(text: &'static str) -> TaskRef {
        TaskFn::arc(move |_ctx: TaskContext| async move { Ok(json!(text)) })
    }

    fn fabric() -> LocalFabric {
        LocalFabric::builder(FabricConfig::default())
            .task("task_a", hello("Hello from Task A"))
            .task("task_b", hello("Hello from Task B"))
            .task(
                "broken",
                TaskFn::arc(|ctx: TaskContext| async move {
                    Err(TaskError::transient(format!("attempt {} failed", ctx.retries + 1)))
                }),
            )
            .queue("queue_a", 2)
            .queue("queue_b", 1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_get_result() {
        let fabric = fabric();
        let handle = fabric
            .submit(&TaskSpec::new("task_a", "queue_a"))
            .await
            .unwrap();

        let output = fabric
            .get_result(&handle, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output, TaskOutput::new(json!("Hello from Task A"), 0));
        assert!(fabric.is_ready(&handle).await);
    }

    #[tokio::test]
    async fn test_unknown_task_rejected() {
        let fabric = fabric();
        let err = fabric
            .submit(&TaskSpec::new("nope", "queue_a"))
            .await
            .unwrap_err();
        assert_eq!(err, FabricError::UnknownTask("nope".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_task_surfaces_last_error() {
        let fabric = fabric();
        let spec = TaskSpec::new("broken", "queue_b")
            .with_max_attempts(2)
            .with_backoff(Duration::from_millis(100));
        let handle = fabric.submit(&spec).await.unwrap();

        let err = fabric
            .get_result(&handle, Duration::from_secs(20))
            .await
            .unwrap_err();
        assert_eq!(err, FabricError::TaskFailed("attempt 2 failed".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconsumed_queue_parks_job() {
        let fabric = fabric();
        let handle = fabric
            .submit(&TaskSpec::new("task_b", "queue_nobody_reads"))
            .await
            .unwrap();

        assert_eq!(fabric.parked_count(), 1);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!fabric.is_ready(&handle).await);
        assert_eq!(fabric.state(&handle).await, Some(JobState::Pending));

        fabric.cancel(&handle).await.unwrap();
        assert_eq!(fabric.parked_count(), 0);
        assert_eq!(fabric.state(&handle).await, Some(JobState::Revoked));
    }

    #[tokio::test]
    async fn test_cancel_finished_job_is_noop() {
        let fabric = fabric();
        let handle = fabric
            .submit(&TaskSpec::new("task_a", "queue_a"))
            .await
            .unwrap();
        while !fabric.is_ready(&handle).await {
            tokio::task::yield_now().await;
        }

        fabric.cancel(&handle).await.unwrap();
        assert!(matches!(
            fabric.state(&handle).await,
            Some(JobState::Succeeded(_))
        ));
        let output = fabric
            .get_result(&handle, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.value, json!("Hello from Task A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_released_after_retrieval() {
        let fabric = fabric();
        let ok = fabric
            .submit(&TaskSpec::new("task_a", "queue_a"))
            .await
            .unwrap();
        let failed = fabric
            .submit(&TaskSpec::new("broken", "queue_b").with_max_attempts(1))
            .await
            .unwrap();

        fabric.get_result(&ok, Duration::from_secs(5)).await.unwrap();
        fabric
            .get_result(&failed, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(fabric.state(&ok).await, None);
        assert_eq!(fabric.state(&failed).await, None);
        assert_eq!(
            fabric.get_result(&ok, Duration::from_secs(1)).await,
            Err(FabricError::HandleNotFound(ok.id.to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_kept_while_result_pending() {
        let fabric = fabric();
        let handle = fabric
            .submit(&TaskSpec::new("task_b", "queue_nobody_reads"))
            .await
            .unwrap();

        let err = fabric
            .get_result(&handle, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, FabricError::WaitTimeout(Duration::from_secs(1)));
        assert_eq!(fabric.state(&handle).await, Some(JobState::Pending));
    }

    #[tokio::test]
    async fn test_zero_consumers_rejected() {
        let result = LocalFabric::builder(FabricConfig::default())
            .queue("queue_a", 0)
            .build();
        assert!(matches!(result, Err(FabricError::Config(_))));
    }
}
