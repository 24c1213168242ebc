// ABOUTME: Durable activity records for dispatched phase work.
// ABOUTME: An activity transitions exactly once from Running to a terminal status.

use chrono::{DateTime, Utc};
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, AppId, EnvId, ServiceId};

/// One command unit within an activity, shown as a log section in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandUnit {
    pub name: String,
}

impl CommandUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Lifecycle status of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Running,
    Success,
    Failed,
}

impl ActivityStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ActivityStatus::Running)
    }
}

/// A not-yet-persisted activity. The activity store assigns the id on create.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub app_id: AppId,
    pub env_id: EnvId,
    pub service_id: ServiceId,
    pub command_name: String,
    pub command_units: NonEmpty<CommandUnit>,
    pub triggered_by: Option<String>,
    pub artifact_name: Option<String>,
}

/// A durable, audit-visible record of one phase's remote task.
///
/// The id doubles as the delegate-task correlation id; it is the single
/// join key between dispatch and resumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub app_id: AppId,
    pub env_id: EnvId,
    pub service_id: ServiceId,
    pub command_name: String,
    pub command_units: NonEmpty<CommandUnit>,
    pub triggered_by: Option<String>,
    pub artifact_name: Option<String>,
    pub status: ActivityStatus,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Materialize a new activity with an assigned id, status Running.
    pub fn persisted(new: NewActivity, id: ActivityId) -> Self {
        Activity {
            id,
            app_id: new.app_id,
            env_id: new.env_id,
            service_id: new.service_id,
            command_name: new.command_name,
            command_units: new.command_units,
            triggered_by: new.triggered_by,
            artifact_name: new.artifact_name,
            status: ActivityStatus::Running,
            created_at: Utc::now(),
        }
    }
}
