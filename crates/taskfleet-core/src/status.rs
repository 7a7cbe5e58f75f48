//! Terminal status of a dispatched task.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal classification the dispatcher assigns to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The task returned a payload.
    Success,
    /// The task raised an error, possibly after exhausting its retries.
    Failure,
    /// The task did not resolve within the timeout budget.
    Timeout,
}

impl OutcomeStatus {
    /// Lowercase name as it appears in events and the summary table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
        }
    }

    /// Returns true for the success status.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
