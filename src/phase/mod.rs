// ABOUTME: Phase state machines for the scale-set rollout contract.
// ABOUTME: Each phase dispatches work, then resumes from a serializable Dispatched value.

mod correlate;
mod deploy;
mod rollback;
mod setup;
mod state_data;
mod switch_routes;
mod timeouts;

pub use correlate::{correlate, execution_status, finalize_activity};
pub use deploy::DeployPhase;
pub use rollback::RollbackPhase;
pub use setup::SetupPhase;
pub use state_data::{ScaleSetStateData, assemble_state_data};
pub use switch_routes::SwitchRoutesPhase;
pub use timeouts::{render_double_or_default, render_int_or_default, render_timeout_or_default};

use nonempty::{NonEmpty, nonempty};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{ActivityOps, DispatchOps};
use crate::context::ExecutionContext;
use crate::error::{PhaseError, Result};
use crate::model::{
    Activity, ActivityStatus, CommandUnit, DelegateTask, ExecutionStatus, InstanceElement,
    NewActivity, PhaseExecutionData, SetupContextElement, TaskParams,
};
use crate::types::{ActivityId, AppId};

/// The closed set of phase kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Setup,
    Deploy,
    SwitchRoutes,
    SwitchRoutesRollback,
    Rollback,
}

impl PhaseKind {
    pub fn command_name(&self) -> &'static str {
        match self {
            PhaseKind::Setup => "Scale Set Setup",
            PhaseKind::Deploy => "Scale Set Deploy",
            PhaseKind::SwitchRoutes => "Switch Scale Set Routes",
            PhaseKind::SwitchRoutesRollback => "Rollback Scale Set Routes",
            PhaseKind::Rollback => "Scale Set Rollback",
        }
    }

    /// Command units shown as log sections for this phase's activity.
    /// The list is deterministic per kind; the delegate streams into it by
    /// unit name.
    pub fn command_units(&self) -> NonEmpty<CommandUnit> {
        match self {
            PhaseKind::Setup => nonempty![CommandUnit::new("Create Scale Set")],
            PhaseKind::Deploy => nonempty![
                CommandUnit::new("Resize Scale Set"),
                CommandUnit::new("Wait for Steady State")
            ],
            PhaseKind::SwitchRoutes => nonempty![CommandUnit::new("Switch Routes")],
            PhaseKind::SwitchRoutesRollback => {
                nonempty![CommandUnit::new("Switch Routes Rollback")]
            }
            PhaseKind::Rollback => nonempty![
                CommandUnit::new("Rollback Scale Set"),
                CommandUnit::new("Wait for Steady State")
            ],
        }
    }

    /// Message attached to a SKIPPED outcome when the upstream setup
    /// context element is absent.
    pub fn skip_message(&self) -> &'static str {
        match self {
            PhaseKind::Setup => "nothing to set up",
            PhaseKind::Deploy => "no setup context element found, nothing to deploy",
            PhaseKind::SwitchRoutes => "no setup context element found, no routes to switch",
            PhaseKind::SwitchRoutesRollback => {
                "no setup context element found, no routes to restore"
            }
            PhaseKind::Rollback => "no setup context element found, nothing to roll back",
        }
    }

    /// Compiled-in timeout used when no configured value renders to a
    /// positive number.
    pub fn default_timeout(&self) -> Duration {
        match self {
            PhaseKind::Setup | PhaseKind::Deploy | PhaseKind::Rollback => {
                Duration::from_secs(20 * 60)
            }
            PhaseKind::SwitchRoutes | PhaseKind::SwitchRoutesRollback => {
                Duration::from_secs(10 * 60)
            }
        }
    }
}

/// The serializable DISPATCHED state of a phase.
///
/// `execute` produces this; `handle_async_response` consumes it, possibly
/// in a different process. Everything resumption needs travels inside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchedPhase {
    pub kind: PhaseKind,
    pub activity_id: ActivityId,
    pub app_id: AppId,
    pub execution_data: PhaseExecutionData,
}

/// Result of `execute`.
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// Preconditions absent; a valid non-error terminal outcome.
    Skipped { message: String },

    /// Terminal without dispatching (e.g. rollback already done).
    Completed {
        status: ExecutionStatus,
        message: String,
    },

    /// Work is on the queue; resumption happens via the response channel.
    Dispatched(DispatchedPhase),
}

/// Terminal result delivered back to the workflow engine after the async
/// response arrives.
#[derive(Debug)]
pub struct PhaseCompletion {
    pub status: ExecutionStatus,
    pub execution_data: PhaseExecutionData,
    /// Setup publishes the context element downstream phases read.
    pub setup_element: Option<SetupContextElement>,
    /// Notify elements for downstream steps.
    pub new_instances: Vec<InstanceElement>,
}

/// Result of `handle_async_response`.
#[derive(Debug)]
pub enum AsyncOutcome {
    /// The response map held no entry for this phase's activity id;
    /// another phase owns those keys.
    NotMine,

    Completed(PhaseCompletion),
}

/// Abort hook. Safe to call whether or not a task was ever dispatched:
/// with no dispatched state this is a no-op.
pub async fn handle_abort_event<B>(backend: &B, dispatched: Option<&DispatchedPhase>) -> Result<()>
where
    B: ActivityOps,
{
    let Some(dispatched) = dispatched else {
        return Ok(());
    };

    tracing::info!(activity = %dispatched.activity_id, kind = ?dispatched.kind, "aborting dispatched phase");
    backend
        .update_activity_status(
            &dispatched.activity_id,
            &dispatched.app_id,
            ActivityStatus::Failed,
        )
        .await
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
    Ok(())
}

/// Create and persist this phase's activity record.
pub(crate) async fn create_phase_activity<B>(
    backend: &B,
    kind: PhaseKind,
    state: &ScaleSetStateData,
    triggered_by: Option<&str>,
) -> Result<Activity>
where
    B: ActivityOps,
{
    let new = NewActivity {
        app_id: state.application.id.clone(),
        env_id: state.environment.id.clone(),
        service_id: state.service.id.clone(),
        command_name: kind.command_name().to_string(),
        command_units: kind.command_units(),
        triggered_by: triggered_by.map(str::to_string),
        artifact_name: Some(state.artifact.display_name.clone()),
    };

    backend
        .create_activity(new)
        .await
        .map_err(|e| PhaseError::Unexpected(e.to_string()))
}

/// Submit a task keyed by the activity id. A dispatch failure aborts the
/// phase before any remote work exists, so no orphaned task is created.
pub(crate) async fn dispatch_task<B>(
    backend: &B,
    activity_id: ActivityId,
    params: TaskParams,
    rollback: bool,
    timeout: Duration,
) -> Result<()>
where
    B: DispatchOps,
{
    debug_assert!(!timeout.is_zero());

    let task = DelegateTask {
        correlation_id: activity_id,
        params,
        rollback,
        timeout,
    };
    backend
        .submit(task)
        .await
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
    Ok(())
}

/// Shared execute preamble: read the setup element or skip.
pub(crate) fn setup_element_or_skip(
    ctx: &dyn ExecutionContext,
    kind: PhaseKind,
) -> std::result::Result<SetupContextElement, ExecuteOutcome> {
    match ctx.setup_element() {
        Some(element) => Ok(element.clone()),
        None => {
            tracing::info!(kind = ?kind, "{}", kind.skip_message());
            Err(ExecuteOutcome::Skipped {
                message: kind.skip_message().to_string(),
            })
        }
    }
}
