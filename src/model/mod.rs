// ABOUTME: Data model for the phase orchestration core.
// ABOUTME: Context elements, activities, delegate tasks, sweeping outputs, resize math.

mod activity;
mod context_element;
mod execution;
mod infra;
mod resize;
mod sweeping;
mod task;

pub use activity::{Activity, ActivityStatus, CommandUnit, NewActivity};
pub use context_element::{LoadBalancerRouteDetail, PreDeploymentData, SetupContextElement};
pub use execution::{
    ExecutionStatus, InstanceElement, InstanceStatusSummary, PhaseExecutionData,
    instance_status_summaries, mark_new_instances,
};
pub use infra::{
    CloudCredentials, EncryptedDataDetail, InfrastructureMapping, ScaleSetInfraMapping,
};
pub use resize::{InstanceSpec, ResizeStrategy, total_expected_count};
pub use sweeping::{
    ALL_PHASE_ROLLBACK_DONE, AllPhaseRollbackDone, DEPLOYED_INSTANCES, Scope,
    SweepingOutputInquiry, SweepingOutputInstance, TRAFFIC_SHIFT_PERCENT,
};
pub use task::{
    CommandExecutionStatus, DelegateTask, ResizeTaskParams, ResponseMap, SetupTaskParams,
    SwitchRoutesTaskParams, TaskParams, TaskPayload, TaskResponse, VmInstanceData,
};
