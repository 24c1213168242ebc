// ABOUTME: Response correlation and status decoding for async resumption.
// ABOUTME: Unknown correlation ids are "not mine"; activities finalize before errors surface.

use crate::backend::ActivityOps;
use crate::error::{PhaseError, Result};
use crate::model::{
    ActivityStatus, CommandExecutionStatus, ExecutionStatus, ResponseMap, TaskResponse,
};
use crate::types::ActivityId;

use super::DispatchedPhase;

/// Look up the response owned by the given activity id, if present.
///
/// A response batch may carry keys for several unrelated activities; a
/// phase must only consume the key it owns and treat everything else as
/// belonging to someone else.
pub fn correlate<'a>(responses: &'a ResponseMap, activity_id: &ActivityId) -> Option<&'a TaskResponse> {
    responses.get(activity_id)
}

/// Derive the phase execution status from a remote command status.
/// Anything but SUCCESS is FAILED; remote failure is a normal terminal
/// outcome, not an error.
pub fn execution_status(response: &TaskResponse) -> ExecutionStatus {
    match response.status {
        CommandExecutionStatus::Success => ExecutionStatus::Success,
        CommandExecutionStatus::Failure => ExecutionStatus::Failed,
    }
}

/// Drive the activity's single RUNNING → terminal transition.
///
/// Must run before any decode error is surfaced: a dangling RUNNING
/// activity is a correctness bug.
pub async fn finalize_activity<B>(
    backend: &B,
    dispatched: &DispatchedPhase,
    status: ExecutionStatus,
) -> Result<()>
where
    B: ActivityOps,
{
    let activity_status = match status {
        ExecutionStatus::Success => ActivityStatus::Success,
        _ => ActivityStatus::Failed,
    };

    backend
        .update_activity_status(&dispatched.activity_id, &dispatched.app_id, activity_status)
        .await
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
    Ok(())
}

/// Turn a failed response into the error reported upward. A known domain
/// error keeps its code; everything else stays a plain failure message for
/// the execution summary.
pub fn failure_error(response: &TaskResponse) -> Option<PhaseError> {
    let code = response.error_code?;
    Some(PhaseError::Domain {
        code,
        message: response
            .error_message
            .clone()
            .unwrap_or_else(|| "delegate reported a domain failure".to_string()),
    })
}
