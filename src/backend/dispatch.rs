// ABOUTME: Delegate dispatch trait with SNAFU error pattern.
// ABOUTME: Submission is fire-and-forget; nothing awaits the remote result.

use async_trait::async_trait;
use snafu::Snafu;

use crate::model::DelegateTask;
use crate::types::ActivityId;

/// Dispatch failure, raised before any remote work starts.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DispatchError {
    #[snafu(display("delegate queue rejected task {correlation_id}: {reason}"))]
    QueueRejected {
        correlation_id: ActivityId,
        reason: String,
    },

    #[snafu(display("delegate queue closed"))]
    QueueClosed,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    Rejected,
    Closed,
}

impl DispatchError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            DispatchError::QueueRejected { .. } => DispatchErrorKind::Rejected,
            DispatchError::QueueClosed => DispatchErrorKind::Closed,
        }
    }
}

/// Opaque handle for a submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub correlation_id: ActivityId,
}

/// Remote-execution queue operations.
#[async_trait]
pub trait DispatchOps: Send + Sync {
    /// Enqueue a task and return immediately. The eventual response arrives
    /// through the engine's response channel keyed by the correlation id.
    async fn submit(&self, task: DelegateTask) -> Result<TaskHandle, DispatchError>;
}
