// ABOUTME: Cross-phase context values published by the Setup phase.
// ABOUTME: Immutable once published; later phases read, never mutate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::resize::ResizeStrategy;

/// Load-balancer routing detail for blue/green cutovers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerRouteDetail {
    pub load_balancer_id: String,
    pub prod_backend_pool_id: String,
    pub stage_backend_pool_id: String,
}

/// Capacity/config snapshot of the old scale set taken before Setup mutated
/// anything.
///
/// Consumed only by Rollback: because the snapshot predates every mutating
/// call, Rollback can restore the exact prior state even when Setup itself
/// partially failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreDeploymentData {
    pub old_scale_set_name: Option<String>,
    pub desired_capacity: u32,
    pub min_capacity: u32,
    /// Serialized auto-scaling policy of the old scale set, if any.
    pub scaling_policy_json: Option<String>,
}

/// The context element Setup publishes for every downstream phase.
///
/// Published exactly once per workflow execution and owned by the workflow
/// context. Later phases read it and publish new elements of their own
/// rather than editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupContextElement {
    pub new_scale_set_name: String,
    pub old_scale_set_name: Option<String>,
    pub desired_instances: u32,
    pub min_instances: u32,
    pub max_instances: u32,
    pub old_desired_count: u32,
    pub blue_green: bool,
    pub resize_strategy: ResizeStrategy,
    /// Steady-state timeout in minutes; non-positive means "not set".
    pub steady_state_timeout_minutes: i64,
    pub pre_deployment_data: PreDeploymentData,
    /// Present only for blue/green workflows.
    pub route_detail: Option<LoadBalancerRouteDetail>,
}

impl SetupContextElement {
    /// Steady-state timeout as a duration, or `None` when the element
    /// carries a non-positive value.
    pub fn steady_state_timeout(&self) -> Option<Duration> {
        if self.steady_state_timeout_minutes <= 0 {
            return None;
        }
        Some(Duration::from_secs(self.steady_state_timeout_minutes as u64 * 60))
    }
}
