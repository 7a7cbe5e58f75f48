//! Sink forwarding events to `tracing`.

use serde_json::Value;
use tracing::info;

use taskfleet_core::{LifecycleEvent, OutcomeStatus, RunReport};

use super::{ObservabilitySink, SinkError};

/// Emits lifecycle events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        let details = Value::Object(event.details.clone());
        info!(
            target: "taskfleet::events",
            event = event.name(),
            details = %details,
            "Lifecycle event"
        );
        Ok(())
    }

    fn render_summary(&self, report: &RunReport) -> Result<(), SinkError> {
        for (task, outcome) in &report.outcomes {
            info!(
                target: "taskfleet::events",
                task = %task,
                status = %outcome.status,
                duration_s = outcome.duration.as_secs_f64(),
                "Task outcome"
            );
        }
        info!(
            target: "taskfleet::events",
            total = report.total(),
            successes = report.successes(),
            failures = report.count(OutcomeStatus::Failure),
            timeouts = report.count(OutcomeStatus::Timeout),
            success_rate = report.success_rate_rounded(),
            total_elapsed_s = report.total_elapsed.as_secs_f64(),
            "Run summary"
        );
        Ok(())
    }
}
