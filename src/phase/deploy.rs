// ABOUTME: Deploy phase: resize the new scale set toward its target capacity.
// ABOUTME: Persists the provisioned instances so later phases and the UI can read them.

use crate::backend::{ActivityOps, DispatchOps, InfraOps, SettingsOps, SweepingOutputs};
use crate::config::DeployConfig;
use crate::context::ExecutionContext;
use crate::error::{PhaseError, Result};
use crate::model::{
    DEPLOYED_INSTANCES, ExecutionStatus, InstanceElement, PhaseExecutionData, ResizeTaskParams,
    ResponseMap, Scope, SweepingOutputInstance, TaskParams, TaskPayload, TaskResponse,
    VmInstanceData, instance_status_summaries,
};

use super::correlate::{correlate, execution_status, failure_error, finalize_activity};
use super::state_data::assemble_state_data;
use super::timeouts::render_timeout_or_default;
use super::{
    AsyncOutcome, DispatchedPhase, ExecuteOutcome, PhaseCompletion, PhaseKind,
    create_phase_activity, dispatch_task, setup_element_or_skip,
};

/// The Deploy phase. The target capacity comes from the deploy
/// configuration resolved against the total the Setup phase established.
#[derive(Debug, Clone)]
pub struct DeployPhase {
    config: DeployConfig,
}

impl DeployPhase {
    pub fn new(config: DeployConfig) -> Self {
        DeployPhase { config }
    }

    pub async fn execute<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
    ) -> Result<ExecuteOutcome>
    where
        B: ActivityOps + DispatchOps + InfraOps + SettingsOps,
    {
        let element = match setup_element_or_skip(ctx, PhaseKind::Deploy) {
            Ok(element) => element,
            Err(outcome) => return Ok(outcome),
        };

        let state = assemble_state_data(ctx, backend).await?;

        let new_desired_count = self.config.instances.resolve(element.desired_instances);
        let old_desired_count = element.old_desired_count.saturating_sub(new_desired_count);

        let activity =
            create_phase_activity(backend, PhaseKind::Deploy, &state, ctx.triggered_by()).await?;
        let log = backend.log_callback(&activity);
        log.info(&format!(
            "resizing {} to {} instances ({} remaining on {})",
            element.new_scale_set_name,
            new_desired_count,
            old_desired_count,
            element
                .old_scale_set_name
                .as_deref()
                .unwrap_or("no old scale set"),
        ));

        let timeout = render_timeout_or_default(
            ctx,
            self.config.timeout.as_deref(),
            PhaseKind::Deploy.default_timeout(),
        );

        let params = TaskParams::Resize(ResizeTaskParams {
            new_scale_set_name: element.new_scale_set_name.clone(),
            old_scale_set_name: element.old_scale_set_name.clone(),
            new_desired_count,
            old_desired_count,
            resize_strategy: element.resize_strategy,
            pre_deployment_data: None,
        });

        let activity_id = activity.id.clone();
        dispatch_task(backend, activity_id.clone(), params, false, timeout).await?;

        let mut execution_data = PhaseExecutionData::dispatched(
            activity_id.clone(),
            format!(
                "resizing scale set {} to {}",
                element.new_scale_set_name, new_desired_count
            ),
        );
        execution_data.new_scale_set_name = Some(element.new_scale_set_name.clone());
        execution_data.old_scale_set_name = element.old_scale_set_name.clone();
        execution_data.new_desired_count = Some(new_desired_count);
        execution_data.old_desired_count = Some(old_desired_count);

        Ok(ExecuteOutcome::Dispatched(DispatchedPhase {
            kind: PhaseKind::Deploy,
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
            finalize_activity(backend, dispatched, status).await?;
            if let Some(err) = failure_error(response) {
                return Err(err);
            }
            let mut execution_data = dispatched.execution_data.clone();
            execution_data.summary = response
                .error_message
                .clone()
                .unwrap_or_else(|| "scale set resize failed".to_string());
            return Ok(AsyncOutcome::Completed(PhaseCompletion {
                status,
                execution_data,
                setup_element: None,
                new_instances: Vec::new(),
            }));
        }

        match self.decode_success(ctx, backend, dispatched, response).await {
            Ok(completion) => {
                finalize_activity(backend, dispatched, ExecutionStatus::Success).await?;
                Ok(AsyncOutcome::Completed(completion))
            }
            Err(err) => {
                finalize_activity(backend, dispatched, ExecutionStatus::Failed).await?;
                Err(err)
            }
        }
    }

    async fn decode_success<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
        dispatched: &DispatchedPhase,
        response: &TaskResponse,
    ) -> Result<PhaseCompletion>
    where
        B: SweepingOutputs,
    {
        let Some(TaskPayload::Resize { instances }) = response.payload.clone() else {
            return Err(PhaseError::invalid_request(
                "deploy response carried no resize payload",
            ));
        };

        let new_instances: Vec<InstanceElement> = instances
            .into_iter()
            .map(|vm: VmInstanceData| InstanceElement {
                instance_id: vm.instance_id,
                host_name: vm.host_name,
                private_ip: vm.private_ip,
                new_instance: true,
            })
            .collect();

        let output = SweepingOutputInstance::typed(
            ctx.workflow_execution_id().clone(),
            Scope::Workflow,
            DEPLOYED_INSTANCES,
            &new_instances,
        )
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
        backend
            .save(output)
            .await
            .map_err(|e| PhaseError::Unexpected(e.to_string()))?;

        let mut execution_data = dispatched.execution_data.clone();
        execution_data.summary = format!("provisioned {} instances", new_instances.len());
        execution_data.instance_summaries =
            instance_status_summaries(ExecutionStatus::Success, &new_instances);

        Ok(PhaseCompletion {
            status: ExecutionStatus::Success,
            execution_data,
            setup_element: None,
            new_instances,
        })
    }
}
