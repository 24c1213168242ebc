// ABOUTME: Phase execution statuses, per-phase result snapshots, and instance bookkeeping.
// ABOUTME: PhaseExecutionData is audit output; downstream phases read the context element instead.

use serde::{Deserialize, Serialize};

use crate::types::ActivityId;

/// Derived status of one phase as seen by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
    Skipped,
}

/// An instance element published to downstream steps after a deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceElement {
    pub instance_id: String,
    pub host_name: String,
    pub private_ip: Option<String>,
    pub new_instance: bool,
}

/// Per-instance status derived from the phase outcome, rendered by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceStatusSummary {
    pub status: ExecutionStatus,
    pub instance: InstanceElement,
}

/// Flag instance elements as newly provisioned (or not).
pub fn mark_new_instances(instances: &mut [InstanceElement], new_instance: bool) {
    for instance in instances {
        instance.new_instance = new_instance;
    }
}

/// Derive one status summary per instance, all carrying the phase status.
pub fn instance_status_summaries(
    status: ExecutionStatus,
    instances: &[InstanceElement],
) -> Vec<InstanceStatusSummary> {
    instances
        .iter()
        .map(|instance| InstanceStatusSummary {
            status,
            instance: instance.clone(),
        })
        .collect()
}

/// Per-phase result snapshot stored by the workflow engine for audit/UI.
///
/// Never fed back into another phase: downstream phases consume the setup
/// context element, not this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseExecutionData {
    pub activity_id: ActivityId,
    pub new_scale_set_name: Option<String>,
    pub old_scale_set_name: Option<String>,
    pub new_desired_count: Option<u32>,
    pub old_desired_count: Option<u32>,
    pub summary: String,
    pub instance_summaries: Vec<InstanceStatusSummary>,
}

impl PhaseExecutionData {
    /// Stub produced at dispatch time; instance summaries arrive with the
    /// async response.
    pub fn dispatched(activity_id: ActivityId, summary: impl Into<String>) -> Self {
        PhaseExecutionData {
            activity_id,
            new_scale_set_name: None,
            old_scale_set_name: None,
            new_desired_count: None,
            old_desired_count: None,
            summary: summary.into(),
            instance_summaries: Vec::new(),
        }
    }
}
