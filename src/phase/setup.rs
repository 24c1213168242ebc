// ABOUTME: Setup phase: provision a new scale set next to the old one.
// ABOUTME: Publishes the setup context element every downstream phase reads.

use crate::backend::{ActivityOps, DispatchOps, InfraOps, SettingsOps};
use crate::config::SetupConfig;
use crate::context::ExecutionContext;
use crate::error::{PhaseError, Result};
use crate::model::{
    PhaseExecutionData, ResponseMap, SetupContextElement, SetupTaskParams, TaskParams, TaskPayload,
    TaskResponse,
};
use crate::types::{NamePrefix, default_name_prefix};

use super::correlate::{correlate, execution_status, failure_error, finalize_activity};
use super::state_data::{ScaleSetStateData, assemble_state_data};
use super::timeouts::{render_int_or_default, render_timeout_or_default};
use super::{
    AsyncOutcome, DispatchedPhase, ExecuteOutcome, PhaseCompletion, PhaseKind,
    create_phase_activity, dispatch_task,
};
use crate::model::ExecutionStatus;

const DEFAULT_DESIRED_INSTANCES: i64 = 2;
const DEFAULT_MIN_INSTANCES: i64 = 0;
const DEFAULT_MAX_INSTANCES: i64 = 4;

/// The Setup phase. Provisions new capacity without moving any traffic;
/// the switch happens later, or never if the rollout fails first.
#[derive(Debug, Clone)]
pub struct SetupPhase {
    config: SetupConfig,
}

impl SetupPhase {
    pub fn new(config: SetupConfig) -> Self {
        SetupPhase { config }
    }

    pub async fn execute<B>(
        &self,
        ctx: &dyn ExecutionContext,
        backend: &B,
    ) -> Result<ExecuteOutcome>
    where
        B: ActivityOps + DispatchOps + InfraOps + SettingsOps,
    {
        let state = assemble_state_data(ctx, backend).await?;
        let name_prefix = self.resolve_name_prefix(ctx, &state)?;

        let desired_instances = self.render_count(
            ctx,
            self.config.desired_instances.as_deref(),
            DEFAULT_DESIRED_INSTANCES,
        );
        let min_instances =
            self.render_count(ctx, self.config.min_instances.as_deref(), DEFAULT_MIN_INSTANCES);
        let max_instances =
            self.render_count(ctx, self.config.max_instances.as_deref(), DEFAULT_MAX_INSTANCES);

        let activity = create_phase_activity(
            backend,
            PhaseKind::Setup,
            &state,
            ctx.triggered_by(),
        )
        .await?;
        let log = backend.log_callback(&activity);
        log.info(&format!(
            "setting up scale set with prefix {} (desired {}, min {}, max {})",
            name_prefix, desired_instances, min_instances, max_instances
        ));

        let timeout = render_timeout_or_default(
            ctx,
            self.config.timeout.as_deref(),
            PhaseKind::Setup.default_timeout(),
        );

        let params = TaskParams::Setup(SetupTaskParams {
            name_prefix: name_prefix.as_str().to_string(),
            subscription_id: state.infra.subscription_id.clone(),
            resource_group: state.infra.resource_group.clone(),
            desired_instances,
            min_instances,
            max_instances,
            blue_green: ctx.is_blue_green(),
            artifact_reference: state.artifact.display_name.clone(),
        });

        let activity_id = activity.id.clone();
        dispatch_task(backend, activity_id.clone(), params, false, timeout).await?;

        let execution_data = PhaseExecutionData::dispatched(
            activity_id.clone(),
            format!("creating scale set with prefix {}", name_prefix),
        );
        Ok(ExecuteOutcome::Dispatched(DispatchedPhase {
            kind: PhaseKind::Setup,
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
        B: ActivityOps,
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
                .unwrap_or_else(|| "scale set setup failed".to_string());
            return Ok(AsyncOutcome::Completed(PhaseCompletion {
                status,
                execution_data,
                setup_element: None,
                new_instances: Vec::new(),
            }));
        }

        match self.decode_success(ctx, dispatched, response) {
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

    fn decode_success(
        &self,
        ctx: &dyn ExecutionContext,
        dispatched: &DispatchedPhase,
        response: &TaskResponse,
    ) -> Result<PhaseCompletion> {
        let Some(TaskPayload::Setup {
            new_scale_set_name,
            old_scale_set_name,
            old_desired_count,
            pre_deployment_data,
            route_detail,
        }) = response.payload.clone()
        else {
            return Err(PhaseError::invalid_request(
                "setup response carried no setup payload",
            ));
        };

        let desired_instances = self.render_count(
            ctx,
            self.config.desired_instances.as_deref(),
            DEFAULT_DESIRED_INSTANCES,
        );
        let min_instances =
            self.render_count(ctx, self.config.min_instances.as_deref(), DEFAULT_MIN_INSTANCES);
        let max_instances =
            self.render_count(ctx, self.config.max_instances.as_deref(), DEFAULT_MAX_INSTANCES);
        let steady_state_timeout_minutes = self
            .config
            .timeout
            .as_deref()
            .map(|expr| render_int_or_default(ctx, expr, 0))
            .unwrap_or(0);

        let element = SetupContextElement {
            new_scale_set_name: new_scale_set_name.clone(),
            old_scale_set_name: old_scale_set_name.clone(),
            desired_instances,
            min_instances,
            max_instances,
            old_desired_count,
            blue_green: ctx.is_blue_green(),
            resize_strategy: self.config.resize_strategy,
            steady_state_timeout_minutes,
            pre_deployment_data,
            route_detail,
        };

        let mut execution_data = dispatched.execution_data.clone();
        execution_data.new_scale_set_name = Some(new_scale_set_name.clone());
        execution_data.old_scale_set_name = old_scale_set_name;
        execution_data.new_desired_count = Some(desired_instances);
        execution_data.old_desired_count = Some(old_desired_count);
        execution_data.summary = format!("created scale set {}", new_scale_set_name);

        Ok(PhaseCompletion {
            status: ExecutionStatus::Success,
            execution_data,
            setup_element: Some(element),
            new_instances: Vec::new(),
        })
    }

    /// Configured prefix rendered against the context, or the
    /// `app__service__env` default. Validation runs after rendering.
    fn resolve_name_prefix(
        &self,
        ctx: &dyn ExecutionContext,
        state: &ScaleSetStateData,
    ) -> Result<NamePrefix> {
        let raw = match &self.config.name_prefix {
            Some(expr) => ctx.render_expression(expr),
            None => default_name_prefix(
                &state.application.name,
                &state.service.name,
                &state.environment.name,
            ),
        };
        NamePrefix::new(&raw).map_err(|e| PhaseError::invalid_request(e.to_string()))
    }

    fn render_count(
        &self,
        ctx: &dyn ExecutionContext,
        expr: Option<&str>,
        default: i64,
    ) -> u32 {
        let value = match expr {
            Some(expr) => render_int_or_default(ctx, expr, default),
            None => default,
        };
        value.max(0) as u32
    }
}
