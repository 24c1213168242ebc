// ABOUTME: SwitchRoutes phase: move traffic between the old and new scale sets.
// ABOUTME: Forward and rollback runs share one task shape; only the rollback flag differs.

use crate::backend::{ActivityOps, DispatchOps, InfraOps, SettingsOps, SweepingOutputs};
use crate::config::SwitchRoutesConfig;
use crate::context::ExecutionContext;
use crate::error::{PhaseError, Result};
use crate::model::{
    ExecutionStatus, PhaseExecutionData, ResponseMap, Scope, SweepingOutputInstance,
    SwitchRoutesTaskParams, TRAFFIC_SHIFT_PERCENT, TaskParams, TaskPayload,
};

use super::correlate::{correlate, execution_status, failure_error, finalize_activity};
use super::state_data::assemble_state_data;
use super::timeouts::render_timeout_or_default;
use super::{
    AsyncOutcome, DispatchedPhase, ExecuteOutcome, PhaseCompletion, PhaseKind,
    create_phase_activity, dispatch_task, setup_element_or_skip,
};

/// The SwitchRoutes phase.
///
/// Rollback is "switch routes with roles reversed": the same parameters are
/// built from the same context element, and only the task-level rollback
/// flag tells the delegate which direction traffic moves. Forward and
/// rollback logic cannot diverge because there is only one code path.
#[derive(Debug, Clone)]
pub struct SwitchRoutesPhase {
    config: SwitchRoutesConfig,
    rollback: bool,
}

impl SwitchRoutesPhase {
    pub fn forward(config: SwitchRoutesConfig) -> Self {
        SwitchRoutesPhase {
            config,
            rollback: false,
        }
    }

    pub fn rollback(config: SwitchRoutesConfig) -> Self {
        SwitchRoutesPhase {
            config,
            rollback: true,
        }
    }

    pub fn kind(&self) -> PhaseKind {
        if self.rollback {
            PhaseKind::SwitchRoutesRollback
        } else {
            PhaseKind::SwitchRoutes
        }
    }

    /// Task parameters for this run. Public so the symmetry between forward
    /// and rollback runs is directly observable.
    pub fn task_params(
        &self,
        ctx: &dyn ExecutionContext,
    ) -> Result<Option<SwitchRoutesTaskParams>> {
        let Some(element) = ctx.setup_element() else {
            return Ok(None);
        };

        let route_detail = element.route_detail.clone().ok_or_else(|| {
            PhaseError::invalid_request(
                "no load balancer route detail found in setup context element",
            )
        })?;

        Ok(Some(SwitchRoutesTaskParams {
            old_scale_set_name: element.old_scale_set_name.clone(),
            new_scale_set_name: element.new_scale_set_name.clone(),
            downscale_old_scale_set: self.config.downscale_old_scale_set,
            route_detail,
        }))
    }

    pub async fn execute<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
    ) -> Result<ExecuteOutcome>
    where
        B: ActivityOps + DispatchOps + InfraOps + SettingsOps,
    {
        let kind = self.kind();
        if let Err(outcome) = setup_element_or_skip(ctx, kind) {
            return Ok(outcome);
        }
        let Some(params) = self.task_params(ctx)? else {
            return Ok(ExecuteOutcome::Skipped {
                message: kind.skip_message().to_string(),
            });
        };

        let state = assemble_state_data(ctx, backend).await?;

        let activity = create_phase_activity(backend, kind, &state, ctx.triggered_by()).await?;
        let log = backend.log_callback(&activity);
        log.info(&format!(
            "switching routes from {} to {}{}",
            params.old_scale_set_name.as_deref().unwrap_or("none"),
            params.new_scale_set_name,
            if self.rollback { " (rollback)" } else { "" },
        ));

        let timeout = render_timeout_or_default(
            ctx,
            self.config.timeout.as_deref(),
            kind.default_timeout(),
        );

        let mut execution_data = PhaseExecutionData::dispatched(
            activity.id.clone(),
            format!("switching routes to {}", params.new_scale_set_name),
        );
        execution_data.new_scale_set_name = Some(params.new_scale_set_name.clone());
        execution_data.old_scale_set_name = params.old_scale_set_name.clone();

        let activity_id = activity.id.clone();
        dispatch_task(
            backend,
            activity_id.clone(),
            TaskParams::SwitchRoutes(params),
            self.rollback,
            timeout,
        )
        .await?;

        Ok(ExecuteOutcome::Dispatched(DispatchedPhase {
            kind,
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
                .unwrap_or_else(|| "route switch failed".to_string());
            return Ok(AsyncOutcome::Completed(PhaseCompletion {
                status,
                execution_data,
                setup_element: None,
                new_instances: Vec::new(),
            }));
        }

        if let Some(payload) = &response.payload {
            if !matches!(payload, TaskPayload::SwitchRoutes) {
                finalize_activity(backend, dispatched, ExecutionStatus::Failed).await?;
                return Err(PhaseError::invalid_request(
                    "switch-routes response carried an unexpected payload",
                ));
            }
        }

        // Traffic now lands entirely on whichever set this run targeted.
        let percent: f64 = if self.rollback { 0.0 } else { 100.0 };
        if let Err(err) = self.save_traffic_shift(ctx, backend, percent).await {
            finalize_activity(backend, dispatched, ExecutionStatus::Failed).await?;
            return Err(err);
        }

        finalize_activity(backend, dispatched, ExecutionStatus::Success).await?;

        let mut execution_data = dispatched.execution_data.clone();
        execution_data.summary = if self.rollback {
            "routes restored to previous scale set".to_string()
        } else {
            "routes switched to new scale set".to_string()
        };

        Ok(AsyncOutcome::Completed(PhaseCompletion {
            status: ExecutionStatus::Success,
            execution_data,
            setup_element: None,
            new_instances: Vec::new(),
        }))
    }

    async fn save_traffic_shift<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
        percent: f64,
    ) -> Result<()>
    where
        B: SweepingOutputs,
    {
        let output = SweepingOutputInstance::typed(
            ctx.workflow_execution_id().clone(),
            Scope::Workflow,
            TRAFFIC_SHIFT_PERCENT,
            &percent,
        )
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
        backend
            .save(output)
            .await
            .map_err(|e| PhaseError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
