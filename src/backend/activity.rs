// ABOUTME: Activity store operations and the execution log callback.
// ABOUTME: Create a durable record, stream log lines, drive the single status transition.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{Activity, ActivityStatus, NewActivity};
use crate::types::{ActivityId, AppId};

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity store unavailable: {0}")]
    Unavailable(String),

    #[error("activity not found: {0}")]
    NotFound(ActivityId),
}

/// Severity of an execution log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Sink for human-readable progress lines tied to one activity.
///
/// Always passed explicitly; no function reads an ambient "current
/// activity".
pub trait LogCallback: Send + Sync {
    fn save_execution_log(&self, line: &str, level: LogLevel);

    fn info(&self, line: &str) {
        self.save_execution_log(line, LogLevel::Info);
    }

    fn error(&self, line: &str) {
        self.save_execution_log(line, LogLevel::Error);
    }
}

/// Activity persistence operations.
#[async_trait]
pub trait ActivityOps: Send + Sync {
    /// Persist a new activity; the store assigns the id and returns the
    /// record with status Running.
    async fn create_activity(&self, activity: NewActivity) -> Result<Activity, ActivityError>;

    /// Transition an activity's status. The transition from Running to a
    /// terminal status happens exactly once; repeating the same terminal
    /// status is a no-op, not an error.
    async fn update_activity_status(
        &self,
        id: &ActivityId,
        app_id: &AppId,
        status: ActivityStatus,
    ) -> Result<(), ActivityError>;

    /// Log callback streaming to this activity's execution record.
    fn log_callback(&self, activity: &Activity) -> Arc<dyn LogCallback>;
}
