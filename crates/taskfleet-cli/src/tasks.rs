//! Demo task catalogue.

use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;

use taskfleet_core::TaskSpec;
use taskfleet_fabric::{FabricConfig, FabricError, LocalFabric, TaskContext, TaskError, TaskFn, TaskRef};

/// Attempts the `flaky` task fails before it succeeds.
const FLAKY_FAILURES: u32 = 2;

/// A task the demo fabric knows how to run.
pub struct DemoTask {
    pub name: &'static str,
    pub queue: &'static str,
    pub description: &'static str,
    pub max_attempts: u32,
    pub backoff: Duration,
    task: fn() -> TaskRef,
}

impl DemoTask {
    /// Spec submitted for this task.
    pub fn spec(&self) -> TaskSpec {
        TaskSpec::new(self.name, self.queue)
            .with_max_attempts(self.max_attempts)
            .with_backoff(self.backoff)
    }
}

/// Queues served by the demo fabric. `queue_c` is deliberately absent.
pub const QUEUES: &[&str] = &["queue_a", "queue_b"];

pub fn catalogue() -> Vec<DemoTask> {
    vec![
        DemoTask {
            name: "task_a",
            queue: "queue_a",
            description: "Returns a greeting",
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            task: || greeting("Hello from Task A"),
        },
        DemoTask {
            name: "task_b",
            queue: "queue_b",
            description: "Returns a greeting after a short delay",
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            task: || {
                TaskFn::arc(|_ctx: TaskContext| async {
                    sleep(Duration::from_millis(1200)).await;
                    Ok(json!("Hello from Task B"))
                })
            },
        },
        DemoTask {
            name: "flaky",
            queue: "queue_a",
            description: "Fails twice, then succeeds",
            max_attempts: 3,
            backoff: Duration::from_millis(500),
            task: || {
                TaskFn::arc(|ctx: TaskContext| async move {
                    if ctx.retries < FLAKY_FAILURES {
                        return Err(TaskError::transient(format!(
                            "{} attempt {} hit a transient error",
                            ctx.task_name,
                            ctx.retries + 1
                        )));
                    }
                    Ok(json!({"recovered_after": ctx.retries}))
                })
            },
        },
        DemoTask {
            name: "broken",
            queue: "queue_b",
            description: "Always fails",
            max_attempts: 2,
            backoff: Duration::from_millis(500),
            task: || {
                TaskFn::arc(|_ctx: TaskContext| async {
                    Err(TaskError::transient("downstream service unavailable"))
                })
            },
        },
        DemoTask {
            name: "orphan",
            queue: "queue_c",
            description: "Routed to a queue nobody consumes",
            max_attempts: 1,
            backoff: Duration::ZERO,
            task: || greeting("unreachable"),
        },
    ]
}

fn greeting(text: &'static str) -> TaskRef {
    TaskFn::arc(move |_ctx: TaskContext| async move { Ok(json!(text)) })
}

/// Build a local fabric with every demo task registered.
pub fn build_fabric(config: FabricConfig, consumers: usize) -> Result<LocalFabric, FabricError> {
    let mut builder = LocalFabric::builder(config);
    for demo in catalogue() {
        builder = builder.task(demo.name, (demo.task)());
    }
    for queue in QUEUES {
        builder = builder.queue(*queue, consumers);
    }
    builder.build()
}

/// Resolve `--tasks` selections against the catalogue.
///
/// An empty selection means every task. Unknown names are kept so the
/// dispatcher reports them as failed submissions.
pub fn select(names: &[String]) -> Vec<TaskSpec> {
    let catalogue = catalogue();
    if names.is_empty() {
        return catalogue.iter().map(DemoTask::spec).collect();
    }

    names
        .iter()
        .map(|name| {
            catalogue
                .iter()
                .find(|demo| demo.name == name.as_str())
                .map(DemoTask::spec)
                .unwrap_or_else(|| TaskSpec::new(name.as_str(), QUEUES[0]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use taskfleet_core::OutcomeStatus;
    use taskfleet_dispatch::{DispatchConfig, Dispatcher, MemorySink};

    #[test]
    fn test_select_all_by_default() {
        let specs = select(&[]);
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["task_a", "task_b", "flaky", "broken", "orphan"]);
    }

    #[test]
    fn test_select_unknown_name_kept() {
        let specs = select(&["flaky".to_string(), "nope".to_string()]);
        assert_eq!(specs[0].queue, "queue_a");
        assert_eq!(specs[0].retry.max_attempts, 3);
        assert_eq!(specs[1].name, "nope");
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_batch_end_to_end() {
        let fabric = Arc::new(build_fabric(FabricConfig::default(), 2).unwrap());
        let sink = Arc::new(MemorySink::new());
        let config = DispatchConfig::default().with_timeout_budget(Duration::from_secs(5));
        let dispatcher = Dispatcher::new(fabric.clone(), sink.clone(), config);

        let report = dispatcher.submit_batch(select(&[])).await.unwrap();

        assert_eq!(report.total(), 5);
        assert_eq!(report.get("task_a").unwrap().result, json!("Hello from Task A"));
        assert_eq!(report.get("task_b").unwrap().result, json!("Hello from Task B"));

        let flaky = report.get("flaky").unwrap();
        assert_eq!(flaky.status, OutcomeStatus::Success);
        assert_eq!(flaky.attempts, Some(2));

        let broken = report.get("broken").unwrap();
        assert_eq!(broken.status, OutcomeStatus::Failure);
        assert_eq!(broken.message(), Some("downstream service unavailable"));

        let orphan = report.get("orphan").unwrap();
        assert_eq!(orphan.status, OutcomeStatus::Timeout);
        assert!(orphan.duration >= Duration::from_secs(5));

        // The revoke request runs detached from the batch.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fabric.parked_count(), 0);

        assert_eq!(report.success_rate, 60.0);
        assert_eq!(sink.event_names().last(), Some(&"summary"));
    }
}
