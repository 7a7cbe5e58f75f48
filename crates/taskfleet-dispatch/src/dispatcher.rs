//! Dispatch-and-monitor loop.
//!
//! [`Dispatcher::submit_batch`] submits every spec, then scans the
//! outstanding handles from a single loop: ready handles are resolved to
//! success or failure, handles past the timeout budget are cancelled and
//! timed out, the rest wait for the next pass. Each pass moves resolved
//! handles out of the outstanding list; the loop ends when it is empty.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use taskfleet_core::{finalize, validate_batch, LifecycleEvent, Outcome, RunReport, TaskSpec};
use taskfleet_fabric::{ExecutionFabric, TaskHandle};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::sink::ObservabilitySink;

/// Submits batches to an execution fabric and tracks them to completion.
pub struct Dispatcher {
    fabric: Arc<dyn ExecutionFabric>,
    sink: Arc<dyn ObservabilitySink>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a new Dispatcher.
    pub fn new(
        fabric: Arc<dyn ExecutionFabric>,
        sink: Arc<dyn ObservabilitySink>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            fabric,
            sink,
            config,
        }
    }

    /// Timing parameters in use.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch a batch and wait until every task has an outcome.
    ///
    /// Only precondition failures (bad config, empty batch, duplicate
    /// names, invalid retry policy) are returned as errors, and always
    /// before anything is submitted. Task failures and timeouts are
    /// part of the returned report.
    pub async fn submit_batch(&self, specs: Vec<TaskSpec>) -> Result<RunReport, DispatchError> {
        self.config.validate()?;
        validate_batch(&specs)?;

        let batch_start = Instant::now();
        info!(
            tasks = specs.len(),
            timeout_budget_s = self.config.timeout_budget.as_secs_f64(),
            poll_interval_s = self.config.poll_interval.as_secs_f64(),
            "Dispatching batch"
        );
        self.emit(LifecycleEvent::start(specs.len()));

        let mut outcomes = BTreeMap::new();
        let mut outstanding = Vec::with_capacity(specs.len());

        for spec in &specs {
            match self.fabric.submit(spec).await {
                Ok(handle) => {
                    debug!(task = %spec.name, queue = %spec.queue, handle = %handle.id, "Task submitted");
                    outstanding.push(handle);
                }
                Err(e) => {
                    warn!(task = %spec.name, queue = %spec.queue, error = %e, "Task submission failed");
                    let elapsed = batch_start.elapsed();
                    let outcome = Outcome::failure(e.to_string(), std::time::Duration::ZERO)
                        .with_resolved_after(elapsed);
                    self.record(&spec.name, outcome, &mut outcomes);
                }
            }
        }

        while !outstanding.is_empty() {
            let pending = std::mem::take(&mut outstanding);
            for handle in pending {
                match self.poll(&handle).await {
                    Some(outcome) => {
                        let outcome = outcome.with_resolved_after(batch_start.elapsed());
                        self.record(&handle.task_name, outcome, &mut outcomes);
                    }
                    None => outstanding.push(handle),
                }
            }

            if !outstanding.is_empty() {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        let report = finalize(outcomes);
        info!(
            total = report.total(),
            successes = report.successes(),
            success_rate = report.success_rate_rounded(),
            total_elapsed_s = report.total_elapsed.as_secs_f64(),
            "Batch finished"
        );

        self.emit(LifecycleEvent::summary(&report));
        if let Err(e) = self.sink.render_summary(&report) {
            warn!(error = %e, "Failed to render summary");
        }

        Ok(report)
    }

    /// Check one handle. Returns an outcome once it is terminal.
    async fn poll(&self, handle: &TaskHandle) -> Option<Outcome> {
        if self.fabric.is_ready(handle).await {
            let outcome = match self
                .fabric
                .get_result(handle, self.config.result_wait)
                .await
            {
                Ok(output) => Outcome::success(output.value, output.retries, handle.elapsed()),
                Err(e) => Outcome::failure(e.to_string(), handle.elapsed()),
            };
            return Some(outcome);
        }

        let elapsed = handle.elapsed();
        if elapsed > self.config.timeout_budget {
            self.revoke(handle);
            return Some(Outcome::timeout(self.config.timeout_budget, elapsed));
        }

        None
    }

    /// Ask the fabric to cancel a timed-out handle without waiting on it.
    ///
    /// The timeout stands however the request ends.
    fn revoke(&self, handle: &TaskHandle) {
        let fabric = self.fabric.clone();
        let handle = handle.clone();
        tokio::spawn(async move {
            match fabric.cancel(&handle).await {
                Ok(()) => debug!(task = %handle.task_name, handle = %handle.id, "Cancellation requested"),
                Err(e) => {
                    debug!(task = %handle.task_name, handle = %handle.id, error = %e, "Cancellation failed")
                }
            }
        });
    }

    /// Store an outcome and announce it.
    fn record(&self, task: &str, outcome: Outcome, outcomes: &mut BTreeMap<String, Outcome>) {
        info!(
            task = %task,
            status = %outcome.status,
            duration_s = outcome.duration.as_secs_f64(),
            "Task resolved"
        );
        self.emit(LifecycleEvent::for_outcome(
            task,
            &outcome,
            self.config.timeout_budget,
        ));
        outcomes.insert(task.to_string(), outcome);
    }

    fn emit(&self, event: LifecycleEvent) {
        if let Err(e) = self.sink.emit(&event) {
            warn!(event = event.name(), error = %e, "Failed to emit event");
        }
    }
}
