//! taskfleet Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - The execution fabric
//! - Console or file output
//!
//! Task specifications, outcomes, the run report and lifecycle events
//! all live here so every other crate speaks the same vocabulary.

pub mod error;
pub mod event;
pub mod ids;
pub mod outcome;
pub mod report;
mod secs;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use event::{EventKind, LifecycleEvent};
pub use ids::HandleId;
pub use outcome::Outcome;
pub use report::{finalize, RunReport};
pub use status::OutcomeStatus;
pub use task::{validate_batch, RetryPolicy, TaskSpec};
