// ABOUTME: In-process delegate queue over a tokio channel.
// ABOUTME: Lets an embedder or test consume tasks and deliver responses by correlation id.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::model::DelegateTask;
use crate::types::ActivityId;

use super::dispatch::{DispatchError, DispatchOps, TaskHandle};

/// A dispatcher backed by an in-process queue.
///
/// The paired receiver is the "delegate side": whoever holds it performs
/// the work and delivers a response map back to the engine keyed by the
/// task's correlation id. Dropping the receiver closes the queue and
/// subsequent submissions fail with `QueueClosed`.
pub struct LocalDispatcher {
    sender: mpsc::UnboundedSender<DelegateTask>,
    submitted: Mutex<Vec<ActivityId>>,
}

impl LocalDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DelegateTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            LocalDispatcher {
                sender,
                submitted: Mutex::new(Vec::new()),
            },
            receiver,
        )
    }

    /// Correlation ids of every task submitted so far, in order.
    pub fn submitted(&self) -> Vec<ActivityId> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl DispatchOps for LocalDispatcher {
    async fn submit(&self, task: DelegateTask) -> Result<TaskHandle, DispatchError> {
        let correlation_id = task.correlation_id.clone();
        self.sender
            .send(task)
            .map_err(|_| DispatchError::QueueClosed)?;
        self.submitted.lock().push(correlation_id.clone());
        Ok(TaskHandle { correlation_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResizeTaskParams, ResizeStrategy, TaskParams};
    use std::time::Duration;

    fn task(id: &str) -> DelegateTask {
        DelegateTask {
            correlation_id: ActivityId::new(id),
            params: TaskParams::Resize(ResizeTaskParams {
                new_scale_set_name: "new".to_string(),
                old_scale_set_name: None,
                new_desired_count: 1,
                old_desired_count: 0,
                resize_strategy: ResizeStrategy::ResizeNewFirst,
                pre_deployment_data: None,
            }),
            rollback: false,
            timeout: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn submitted_tasks_arrive_in_order() {
        let (dispatcher, mut receiver) = LocalDispatcher::new();

        dispatcher.submit(task("a")).await.unwrap();
        dispatcher.submit(task("b")).await.unwrap();

        assert_eq!(receiver.recv().await.unwrap().correlation_id.as_str(), "a");
        assert_eq!(receiver.recv().await.unwrap().correlation_id.as_str(), "b");
        assert_eq!(dispatcher.submitted().len(), 2);
    }

    #[tokio::test]
    async fn closed_queue_rejects_submission() {
        let (dispatcher, receiver) = LocalDispatcher::new();
        drop(receiver);

        let err = dispatcher.submit(task("a")).await.unwrap_err();
        assert_eq!(err.kind(), crate::backend::DispatchErrorKind::Closed);
        assert!(dispatcher.submitted().is_empty());
    }
}
