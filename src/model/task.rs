// ABOUTME: Provider-agnostic delegate task parameters and response payloads.
// ABOUTME: The activity id is the correlation key joining dispatch to resumption.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ErrorCode;
use crate::types::ActivityId;

use super::context_element::{LoadBalancerRouteDetail, PreDeploymentData};
use super::resize::ResizeStrategy;

/// Parameters for the Setup task: provision a new scale set next to the old
/// one without moving traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupTaskParams {
    pub name_prefix: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub desired_instances: u32,
    pub min_instances: u32,
    pub max_instances: u32,
    pub blue_green: bool,
    pub artifact_reference: String,
}

/// Parameters for a resize task, used by both Deploy and Rollback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeTaskParams {
    pub new_scale_set_name: String,
    pub old_scale_set_name: Option<String>,
    pub new_desired_count: u32,
    pub old_desired_count: u32,
    pub resize_strategy: ResizeStrategy,
    /// Restore target for rollback; `None` on forward deploys.
    pub pre_deployment_data: Option<PreDeploymentData>,
}

/// Parameters for a traffic switch.
///
/// The same shape serves forward and rollback execution: rollback is
/// "switch routes with roles reversed", distinguished only by the task-level
/// rollback flag, so forward and rollback logic cannot diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchRoutesTaskParams {
    pub old_scale_set_name: Option<String>,
    pub new_scale_set_name: String,
    pub downscale_old_scale_set: bool,
    pub route_detail: LoadBalancerRouteDetail,
}

/// The provider-agnostic parameter union carried by a delegate task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskParams {
    Setup(SetupTaskParams),
    Resize(ResizeTaskParams),
    SwitchRoutes(SwitchRoutesTaskParams),
}

/// A unit of work submitted to the remote-execution queue.
///
/// Submission is fire-and-forget; the timeout is enforced by the remote
/// layer, the core only computes and forwards it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateTask {
    pub correlation_id: ActivityId,
    pub params: TaskParams,
    pub rollback: bool,
    pub timeout: Duration,
}

/// Remote command outcome. FAILURE is a normal terminal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandExecutionStatus {
    Success,
    Failure,
}

/// A virtual machine instance reported by the delegate after a resize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmInstanceData {
    pub instance_id: String,
    pub host_name: String,
    pub private_ip: Option<String>,
}

/// What the delegate produced, by task kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    Setup {
        new_scale_set_name: String,
        old_scale_set_name: Option<String>,
        old_desired_count: u32,
        pre_deployment_data: PreDeploymentData,
        route_detail: Option<LoadBalancerRouteDetail>,
    },
    Resize {
        instances: Vec<VmInstanceData>,
    },
    SwitchRoutes,
}

/// The delegate's eventual answer for one correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub status: CommandExecutionStatus,
    pub payload: Option<TaskPayload>,
    pub error_message: Option<String>,
    /// Set when the failure is a known domain error whose code must survive.
    pub error_code: Option<ErrorCode>,
}

impl TaskResponse {
    pub fn success(payload: TaskPayload) -> Self {
        TaskResponse {
            status: CommandExecutionStatus::Success,
            payload: Some(payload),
            error_message: None,
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        TaskResponse {
            status: CommandExecutionStatus::Failure,
            payload: None,
            error_message: Some(message.into()),
            error_code: None,
        }
    }
}

/// An inbound response batch, keyed by correlation id. One batch may carry
/// responses for several unrelated activities; each phase consumes only the
/// key it owns.
pub type ResponseMap = HashMap<ActivityId, TaskResponse>;
