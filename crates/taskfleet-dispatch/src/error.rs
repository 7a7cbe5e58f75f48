//! Dispatcher errors.

use taskfleet_core::CoreError;
use thiserror::Error;

/// Hard failures of a dispatch call, raised before anything is submitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The batch failed its preconditions.
    #[error(transparent)]
    Batch(#[from] CoreError),

    /// The dispatcher configuration is unusable.
    #[error("Invalid dispatch configuration: {0}")]
    InvalidConfig(String),
}
