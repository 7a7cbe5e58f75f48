//! Dispatch-and-monitor core for taskfleet.
//!
//! A [`Dispatcher`] takes a batch of [`TaskSpec`](taskfleet_core::TaskSpec)s,
//! submits them to an [`ExecutionFabric`](taskfleet_fabric::ExecutionFabric),
//! watches every handle until it succeeds, fails or runs past its timeout
//! budget, and returns a [`RunReport`](taskfleet_core::RunReport). Progress
//! is reported to an [`ObservabilitySink`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod sink;
pub mod summary;

pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use sink::{FanoutSink, JsonLogSink, MemorySink, ObservabilitySink, SinkError, TracingSink};
pub use summary::render_table;
