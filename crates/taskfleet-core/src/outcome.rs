//! Resolved result of one dispatched task.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OutcomeStatus;

/// Terminal record for one submitted task.
///
/// Exactly one outcome exists per submission. `duration` is measured from
/// the submission instant to the instant the dispatcher resolved the
/// task; `resolved_after` is the same resolution instant measured from
/// the start of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Terminal classification.
    pub status: OutcomeStatus,

    /// Task payload on success, error message on failure or timeout.
    pub result: Value,

    /// Time between submission and resolution.
    #[serde(with = "crate::secs")]
    pub duration: Duration,

    /// Retries the task reported before succeeding. Only set on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,

    /// Offset from batch start at which the outcome was recorded.
    #[serde(with = "crate::secs")]
    pub resolved_after: Duration,
}

impl Outcome {
    /// A task that returned `value` after `retries` failed attempts.
    pub fn success(value: Value, retries: u32, duration: Duration) -> Self {
        Self {
            status: OutcomeStatus::Success,
            result: value,
            duration,
            attempts: Some(retries),
            resolved_after: duration,
        }
    }

    /// A task whose final error surfaced to the dispatcher.
    pub fn failure(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            result: Value::String(message.into()),
            duration,
            attempts: None,
            resolved_after: duration,
        }
    }

    /// A task that stayed unresolved past `budget`.
    pub fn timeout(budget: Duration, duration: Duration) -> Self {
        Self {
            status: OutcomeStatus::Timeout,
            result: Value::String(timeout_message(budget)),
            duration,
            attempts: None,
            resolved_after: duration,
        }
    }

    /// Builder method to set the offset from batch start.
    pub fn with_resolved_after(mut self, offset: Duration) -> Self {
        self.resolved_after = offset;
        self
    }

    /// Error message for failure and timeout outcomes.
    pub fn message(&self) -> Option<&str> {
        match self.status {
            OutcomeStatus::Success => None,
            _ => self.result.as_str(),
        }
    }

    /// Result rendered as plain text: strings unquoted, anything else as JSON.
    pub fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Message recorded for a timed out task.
pub fn timeout_message(budget: Duration) -> String {
    format!(
        "Task timed out after {}s (worker may be down)",
        budget.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_records_attempts() {
        let outcome = Outcome::success(json!("done"), 2, Duration::from_millis(1200));
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.attempts, Some(2));
        assert_eq!(outcome.message(), None);
        assert_eq!(outcome.result_text(), "done");
    }

    #[test]
    fn test_failure_has_no_attempts() {
        let outcome = Outcome::failure("boom", Duration::from_secs(1));
        assert_eq!(outcome.attempts, None);
        assert_eq!(outcome.message(), Some("boom"));
    }

    #[test]
    fn test_timeout_message_mentions_budget() {
        let outcome = Outcome::timeout(Duration::from_secs(30), Duration::from_millis(30_500));
        assert_eq!(
            outcome.message(),
            Some("Task timed out after 30s (worker may be down)")
        );
        assert_eq!(
            timeout_message(Duration::from_millis(1500)),
            "Task timed out after 1.5s (worker may be down)"
        );
    }

    #[test]
    fn test_result_text_for_structured_payload() {
        let outcome = Outcome::success(json!({"rows": 3}), 0, Duration::ZERO);
        assert_eq!(outcome.result_text(), r#"{"rows":3}"#);
    }

    #[test]
    fn test_serialize_skips_attempts_on_failure() {
        let outcome = Outcome::failure("boom", Duration::from_millis(250));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["duration"], 0.25);
        assert!(json.get("attempts").is_none());
    }
}
