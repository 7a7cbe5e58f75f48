//! Run report and the aggregation that produces it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Outcome, OutcomeStatus};

/// Aggregated outcomes of one dispatch batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// One outcome per submitted task, keyed by task name.
    pub outcomes: BTreeMap<String, Outcome>,

    /// Percentage of tasks that succeeded, in `[0, 100]`.
    pub success_rate: f64,

    /// Time from batch start to the last resolution.
    #[serde(with = "crate::secs")]
    pub total_elapsed: Duration,
}

impl RunReport {
    /// Number of tasks in the batch.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of successful tasks.
    pub fn successes(&self) -> usize {
        self.count(OutcomeStatus::Success)
    }

    /// Number of outcomes with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes
            .values()
            .filter(|o| o.status == status)
            .count()
    }

    /// Outcome for a task by name.
    pub fn get(&self, task_name: &str) -> Option<&Outcome> {
        self.outcomes.get(task_name)
    }

    /// Success rate rounded to two decimals, as displayed.
    pub fn success_rate_rounded(&self) -> f64 {
        crate::secs::round(self.success_rate, 2)
    }
}

/// Fold a completed outcome set into a report.
///
/// Pure: the denominator is the number of outcomes (failures and
/// timeouts included) and `total_elapsed` is the latest
/// `resolved_after`.
pub fn finalize(outcomes: BTreeMap<String, Outcome>) -> RunReport {
    let total = outcomes.len();
    let successes = outcomes
        .values()
        .filter(|o| o.status.is_success())
        .count();

    let success_rate = if total == 0 {
        0.0
    } else {
        100.0 * successes as f64 / total as f64
    };

    let total_elapsed = outcomes
        .values()
        .map(|o| o.resolved_after)
        .max()
        .unwrap_or_default();

    RunReport {
        outcomes,
        success_rate,
        total_elapsed,
    }
}
