//! In-memory result backend.
//!
//! Each submission owns a slot holding its current [`JobState`] in a
//! watch channel, so readers can poll it or wait for a terminal state,
//! plus the cancellation token used to revoke it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use taskfleet_core::HandleId;

use crate::client::TaskOutput;
use crate::error::FabricError;

/// Execution state of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// A worker is running an attempt.
    Started { retries: u32 },
    /// Waiting out the backoff delay before the next attempt.
    Retrying { retries: u32 },
    /// Finished with a payload.
    Succeeded(TaskOutput),
    /// Finished with an error, retries exhausted or not applicable.
    Failed(String),
    /// Revoked before producing a result.
    Revoked,
}

impl JobState {
    /// Returns true once no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_) | Self::Revoked)
    }

    /// Convert a terminal state into the caller-facing result.
    fn into_result(self) -> Result<TaskOutput, FabricError> {
        match self {
            Self::Succeeded(output) => Ok(output),
            Self::Failed(message) => Err(FabricError::TaskFailed(message)),
            _ => Err(FabricError::Revoked),
        }
    }
}

struct Slot {
    state: watch::Sender<JobState>,
    cancel: CancellationToken,
}

/// Result store shared by the fabric front-end and its workers.
#[derive(Default)]
pub struct ResultBackend {
    slots: RwLock<HashMap<HandleId, Slot>>,
}

impl ResultBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending submission.
    pub async fn register(&self, id: HandleId, cancel: CancellationToken) {
        let (state, _) = watch::channel(JobState::Pending);
        self.slots.write().await.insert(id, Slot { state, cancel });
    }

    /// Forget a submission that never reached a queue.
    pub async fn remove(&self, id: &HandleId) {
        self.slots.write().await.remove(id);
    }

    /// Record a state transition. Terminal states are final.
    pub async fn set(&self, id: &HandleId, next: JobState) {
        let slots = self.slots.read().await;
        let Some(slot) = slots.get(id) else {
            debug!(handle = %id, "State update for unknown handle ignored");
            return;
        };
        slot.state.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Current state of a submission.
    pub async fn state(&self, id: &HandleId) -> Option<JobState> {
        self.slots
            .read()
            .await
            .get(id)
            .map(|slot| (*slot.state.borrow()).clone())
    }

    /// Wait up to `bound` for a terminal state.
    pub async fn wait(&self, id: &HandleId, bound: Duration) -> Result<TaskOutput, FabricError> {
        let mut rx = {
            let slots = self.slots.read().await;
            let slot = slots
                .get(id)
                .ok_or_else(|| FabricError::HandleNotFound(id.to_string()))?;
            slot.state.subscribe()
        };

        let waited = tokio::time::timeout(bound, async {
            rx.wait_for(JobState::is_terminal)
                .await
                .map(|state| (*state).clone())
        })
        .await;

        match waited {
            Ok(Ok(state)) => state.into_result(),
            // Sender dropped: the slot was removed underneath us.
            Ok(Err(_)) => Err(FabricError::HandleNotFound(id.to_string())),
            Err(_) => Err(FabricError::WaitTimeout(bound)),
        }
    }

    /// Trigger cancellation. Pending submissions are revoked at once;
    /// running ones are revoked by their worker.
    pub async fn cancel(&self, id: &HandleId) -> Result<(), FabricError> {
        let slots = self.slots.read().await;
        let slot = slots
            .get(id)
            .ok_or_else(|| FabricError::HandleNotFound(id.to_string()))?;

        if slot.state.borrow().is_terminal() {
            return Ok(());
        }

        slot.cancel.cancel();
        slot.state.send_if_modified(|current| {
            if *current == JobState::Pending {
                *current = JobState::Revoked;
                true
            } else {
                false
            }
        });
        Ok(())
    }
}
