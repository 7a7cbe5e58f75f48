//! Observability sinks.
//!
//! The dispatcher reports every lifecycle event and the final report to
//! an [`ObservabilitySink`] it is handed at construction. Sink errors
//! are returned to the dispatcher, which logs and ignores them.

mod json_log;
mod memory;
mod trace;

use std::sync::Arc;

use taskfleet_core::{LifecycleEvent, RunReport};
use thiserror::Error;

pub use json_log::JsonLogSink;
pub use memory::MemorySink;
pub use trace::TracingSink;

/// Errors raised by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the console or log file failed.
    #[error("Sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The event could not be serialized.
    #[error("Sink serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receiver of dispatch lifecycle events.
pub trait ObservabilitySink: Send + Sync {
    /// Record one structured event.
    fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError>;

    /// Present the finalized report.
    fn render_summary(&self, report: &RunReport) -> Result<(), SinkError>;
}

/// Forwards to several sinks.
///
/// Every sink is tried; the first error is returned.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ObservabilitySink>>,
}

impl FanoutSink {
    /// Create an empty fanout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a sink.
    pub fn with(mut self, sink: Arc<dyn ObservabilitySink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ObservabilitySink for FanoutSink {
    fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn render_summary(&self, report: &RunReport) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.render_summary(report) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
