//! Sink that keeps everything in memory, for assertions.

use std::sync::{Mutex, MutexGuard};

use taskfleet_core::{LifecycleEvent, RunReport};

use super::{ObservabilitySink, SinkError};

/// Captures emitted events and rendered reports.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<LifecycleEvent>>,
    reports: Mutex<Vec<RunReport>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        lock(&self.events).clone()
    }

    /// Names of all events in emission order.
    pub fn event_names(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(|e| e.name()).collect()
    }

    /// Reports passed to `render_summary`.
    pub fn reports(&self) -> Vec<RunReport> {
        lock(&self.reports).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ObservabilitySink for MemorySink {
    fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }

    fn render_summary(&self, report: &RunReport) -> Result<(), SinkError> {
        lock(&self.reports).push(report.clone());
        Ok(())
    }
}
