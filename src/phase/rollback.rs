// ABOUTME: Rollback phase: restore the old scale set and drain the new one.
// ABOUTME: A workflow-scoped done marker collapses repeated rollbacks into one.

use crate::backend::{ActivityOps, DispatchOps, InfraOps, SettingsOps, SweepingOutputs, find_typed};
use crate::config::RollbackConfig;
use crate::context::ExecutionContext;
use crate::error::{PhaseError, Result};
use crate::model::{
    ALL_PHASE_ROLLBACK_DONE, AllPhaseRollbackDone, ExecutionStatus, InstanceElement,
    PhaseExecutionData, ResizeTaskParams, ResponseMap, Scope, SweepingOutputInquiry,
    SweepingOutputInstance, TaskParams, TaskPayload, VmInstanceData, instance_status_summaries,
};

use super::correlate::{correlate, execution_status, failure_error, finalize_activity};
use super::state_data::assemble_state_data;
use super::timeouts::render_timeout_or_default;
use super::{
    AsyncOutcome, DispatchedPhase, ExecuteOutcome, PhaseCompletion, PhaseKind,
    create_phase_activity, dispatch_task, setup_element_or_skip,
};

/// The Rollback phase.
///
/// Every phase in a multi-phase workflow may independently trigger
/// rollback, so the phase consults the workflow-scoped done marker before
/// doing any work and sets it only after a successful async response. A
/// failed rollback leaves the marker unset so a retry is possible.
#[derive(Debug, Clone)]
pub struct RollbackPhase {
    config: RollbackConfig,
}

impl RollbackPhase {
    pub fn new(config: RollbackConfig) -> Self {
        RollbackPhase { config }
    }

    pub async fn execute<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
    ) -> Result<ExecuteOutcome>
    where
        B: ActivityOps + DispatchOps + InfraOps + SettingsOps + SweepingOutputs,
    {
        let element = match setup_element_or_skip(ctx, PhaseKind::Rollback) {
            Ok(element) => element,
            Err(outcome) => return Ok(outcome),
        };

        if self.rollback_already_done(ctx, backend).await? {
            tracing::info!(
                execution = %ctx.workflow_execution_id(),
                "rollback already completed for this execution"
            );
            return Ok(ExecuteOutcome::Completed {
                status: ExecutionStatus::Success,
                message: "rollback already completed for this execution".to_string(),
            });
        }

        let state = assemble_state_data(ctx, backend).await?;

        let old_desired_count = element.pre_deployment_data.desired_capacity;
        let activity =
            create_phase_activity(backend, PhaseKind::Rollback, &state, ctx.triggered_by()).await?;
        let log = backend.log_callback(&activity);
        log.info(&format!(
            "rolling back: draining {} and restoring {} to {} instances",
            element.new_scale_set_name,
            element
                .old_scale_set_name
                .as_deref()
                .unwrap_or("no old scale set"),
            old_desired_count,
        ));

        let timeout = render_timeout_or_default(
            ctx,
            self.config.timeout.as_deref(),
            PhaseKind::Rollback.default_timeout(),
        );

        let params = TaskParams::Resize(ResizeTaskParams {
            new_scale_set_name: element.new_scale_set_name.clone(),
            old_scale_set_name: element.old_scale_set_name.clone(),
            new_desired_count: 0,
            old_desired_count,
            resize_strategy: element.resize_strategy,
            pre_deployment_data: Some(element.pre_deployment_data.clone()),
        });

        let activity_id = activity.id.clone();
        dispatch_task(backend, activity_id.clone(), params, true, timeout).await?;

        let mut execution_data = PhaseExecutionData::dispatched(
            activity_id.clone(),
            format!("rolling back scale set {}", element.new_scale_set_name),
        );
        execution_data.new_scale_set_name = Some(element.new_scale_set_name.clone());
        execution_data.old_scale_set_name = element.old_scale_set_name.clone();
        execution_data.new_desired_count = Some(0);
        execution_data.old_desired_count = Some(old_desired_count);

        Ok(ExecuteOutcome::Dispatched(DispatchedPhase {
            kind: PhaseKind::Rollback,
            activity_id,
            app_id: state.application.id,
            execution_data,
        }))
    }

    pub async fn handle_async_response<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
        dispatched: &DispatchedPhase,
        responses: &ResponseMap,
    ) -> Result<AsyncOutcome>
    where
        B: ActivityOps + SweepingOutputs,
    {
        let Some(response) = correlate(responses, &dispatched.activity_id) else {
            return Ok(AsyncOutcome::NotMine);
        };

        let status = execution_status(response);
        if status != ExecutionStatus::Success {
            // Marker stays unset so a later retry can run the rollback again.
            finalize_activity(backend, dispatched, status).await?;
            if let Some(err) = failure_error(response) {
                return Err(err);
            }
            let mut execution_data = dispatched.execution_data.clone();
            execution_data.summary = response
                .error_message
                .clone()
                .unwrap_or_else(|| "scale set rollback failed".to_string());
            return Ok(AsyncOutcome::Completed(PhaseCompletion {
                status,
                execution_data,
                setup_element: None,
                new_instances: Vec::new(),
            }));
        }

        let restored = match response.payload.clone() {
            Some(TaskPayload::Resize { instances }) => instances,
            Some(_) => {
                finalize_activity(backend, dispatched, ExecutionStatus::Failed).await?;
                return Err(PhaseError::invalid_request(
                    "rollback response carried an unexpected payload",
                ));
            }
            None => Vec::new(),
        };

        if let Err(err) = self.mark_rollback_done(ctx, backend).await {
            finalize_activity(backend, dispatched, ExecutionStatus::Failed).await?;
            return Err(err);
        }

        finalize_activity(backend, dispatched, ExecutionStatus::Success).await?;

        let restored: Vec<InstanceElement> = restored
            .into_iter()
            .map(|vm: VmInstanceData| InstanceElement {
                instance_id: vm.instance_id,
                host_name: vm.host_name,
                private_ip: vm.private_ip,
                new_instance: false,
            })
            .collect();

        let mut execution_data = dispatched.execution_data.clone();
        execution_data.summary = "rollback completed".to_string();
        execution_data.instance_summaries =
            instance_status_summaries(ExecutionStatus::Success, &restored);

        Ok(AsyncOutcome::Completed(PhaseCompletion {
            status: ExecutionStatus::Success,
            execution_data,
            setup_element: None,
            new_instances: restored,
        }))
    }

    async fn rollback_already_done<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
    ) -> Result<bool>
    where
        B: SweepingOutputs,
    {
        let inquiry = SweepingOutputInquiry::new(
            ctx.workflow_execution_id().clone(),
            ALL_PHASE_ROLLBACK_DONE,
        );
        let marker: Option<AllPhaseRollbackDone> = find_typed(backend, &inquiry)
            .await
            .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
        Ok(marker.map(|m| m.done).unwrap_or(false))
    }

    async fn mark_rollback_done<B>(&self, ctx: &dyn ExecutionContext, backend: &B) -> Result<()>
    where
        B: SweepingOutputs,
    {
        let output = SweepingOutputInstance::typed(
            ctx.workflow_execution_id().clone(),
            Scope::Workflow,
            ALL_PHASE_ROLLBACK_DONE,
            &AllPhaseRollbackDone { done: true },
        )
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
        backend
            .save(output)
            .await
            .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
