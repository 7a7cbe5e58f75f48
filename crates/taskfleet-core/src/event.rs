//! Lifecycle events emitted while a batch is dispatched.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::secs::round;
use crate::{Outcome, OutcomeStatus, RunReport};

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Batch dispatch begins.
    Start,
    /// A task resolved with success or failure.
    TaskCompleted,
    /// A task exceeded its timeout budget.
    TaskTimeout,
    /// Batch finished; carries run-level metrics.
    Summary,
}

impl EventKind {
    /// Event name as written to logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TaskCompleted => "task_completed",
            Self::TaskTimeout => "task_timeout",
            Self::Summary => "summary",
        }
    }
}

/// A structured event with a name and a flat details object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub event: EventKind,
    pub timestamp: String,
    pub details: Map<String, Value>,
}

impl LifecycleEvent {
    /// Create a new event with the current timestamp.
    pub fn new(event: EventKind, details: Map<String, Value>) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            details,
        }
    }

    /// Create a start event.
    pub fn start(total_tasks: usize) -> Self {
        Self::new(
            EventKind::Start,
            object(json!({
                "message": "Dispatching tasks",
                "total_tasks": total_tasks,
            })),
        )
    }

    /// Create a task_completed event for a success or failure outcome.
    pub fn task_completed(task: &str, outcome: &Outcome) -> Self {
        Self::new(EventKind::TaskCompleted, task_details(task, outcome))
    }

    /// Create a task_timeout event.
    pub fn task_timeout(task: &str, outcome: &Outcome, budget: Duration) -> Self {
        let mut details = task_details(task, outcome);
        details.insert(
            "timeout_threshold_s".to_string(),
            json!(budget.as_secs_f64()),
        );
        Self::new(EventKind::TaskTimeout, details)
    }

    /// Event matching how an outcome was resolved.
    pub fn for_outcome(task: &str, outcome: &Outcome, budget: Duration) -> Self {
        match outcome.status {
            OutcomeStatus::Timeout => Self::task_timeout(task, outcome, budget),
            _ => Self::task_completed(task, outcome),
        }
    }

    /// Create a summary event from a finalized report.
    pub fn summary(report: &RunReport) -> Self {
        Self::new(
            EventKind::Summary,
            object(json!({
                "total_tasks": report.total(),
                "successes": report.successes(),
                "failures": report.count(OutcomeStatus::Failure),
                "timeouts": report.count(OutcomeStatus::Timeout),
                "success_rate": format!("{}%", report.success_rate_rounded()),
                "total_time_s": round(report.total_elapsed.as_secs_f64(), 3),
            })),
        )
    }

    /// Event name as written to logs.
    pub fn name(&self) -> &'static str {
        self.event.as_str()
    }

    /// Look up a detail field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// Render as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn task_details(task: &str, outcome: &Outcome) -> Map<String, Value> {
    let mut details = object(json!({
        "task": task,
        "status": outcome.status.as_str(),
        "result": outcome.result,
        "execution_time_s": round(outcome.duration.as_secs_f64(), 3),
    }));
    if let Some(attempts) = outcome.attempts {
        details.insert("attempts".to_string(), json!(attempts));
    }
    details
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize;
    use std::collections::BTreeMap;

    #[test]
    fn test_start_event() {
        let event = LifecycleEvent::start(2);
        assert_eq!(event.name(), "start");
        assert_eq!(event.field("total_tasks"), Some(&json!(2)));
        assert!(!event.timestamp.is_empty());
    }

    #[test]
    fn test_task_completed_rounds_duration() {
        let outcome = Outcome::success(json!("ok"), 1, Duration::from_micros(1_234_567));
        let event = LifecycleEvent::task_completed("task_a", &outcome);

        assert_eq!(event.event, EventKind::TaskCompleted);
        assert_eq!(event.field("task"), Some(&json!("task_a")));
        assert_eq!(event.field("status"), Some(&json!("success")));
        assert_eq!(event.field("execution_time_s"), Some(&json!(1.235)));
        assert_eq!(event.field("attempts"), Some(&json!(1)));
    }

    #[test]
    fn test_for_outcome_picks_timeout_event() {
        let budget = Duration::from_secs(30);
        let outcome = Outcome::timeout(budget, Duration::from_secs(31));
        let event = LifecycleEvent::for_outcome("task_b", &outcome, budget);

        assert_eq!(event.name(), "task_timeout");
        assert_eq!(event.field("timeout_threshold_s"), Some(&json!(30.0)));
        assert!(event.field("attempts").is_none());
    }

    #[test]
    fn test_summary_event() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            "a".to_string(),
            Outcome::success(json!(1), 0, Duration::from_secs(1)),
        );
        outcomes.insert(
            "b".to_string(),
            Outcome::failure("x", Duration::from_secs(2)),
        );
        let event = LifecycleEvent::summary(&finalize(outcomes));

        assert_eq!(event.field("total_tasks"), Some(&json!(2)));
        assert_eq!(event.field("success_rate"), Some(&json!("50%")));
        assert_eq!(event.field("total_time_s"), Some(&json!(2.0)));
    }

    #[test]
    fn test_json_line_shape() {
        let line = LifecycleEvent::start(1).to_json_line().unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "start");
        assert_eq!(parsed["details"]["message"], "Dispatching tasks");
    }
}
