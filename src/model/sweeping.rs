// ABOUTME: Sweeping output instances: scoped key-value state passed between phases.
// ABOUTME: Writers overwrite whole values; at most one current value per (scope, name).

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::types::ExecutionId;

/// Name of the workflow-scoped marker that collapses repeated rollbacks
/// into a single effective one.
pub const ALL_PHASE_ROLLBACK_DONE: &str = "allPhaseRollbackDone";

/// Name under which Deploy persists the instances it provisioned.
pub const DEPLOYED_INSTANCES: &str = "deployedInstances";

/// Name under which SwitchRoutes persists the current traffic-shift
/// percentage for blue/green workflows.
pub const TRAFFIC_SHIFT_PERCENT: &str = "trafficShiftPercent";

/// Visibility scope of a sweeping output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Phase,
    Workflow,
    Pipeline,
}

/// A scoped blob keyed by (execution id, scope, name).
///
/// Values are always complete and self-contained so a concurrent reader
/// never observes a half-written record; recomputing a value overwrites the
/// previous instance instead of appending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepingOutputInstance {
    pub execution_id: ExecutionId,
    pub scope: Scope,
    pub name: String,
    pub value: serde_json::Value,
}

impl SweepingOutputInstance {
    /// Build an instance from any serializable value.
    pub fn typed<T: Serialize>(
        execution_id: ExecutionId,
        scope: Scope,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(SweepingOutputInstance {
            execution_id,
            scope,
            name: name.into(),
            value: serde_json::to_value(value)?,
        })
    }

    /// Decode the stored value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.value.clone())
    }
}

/// Lookup key for a sweeping output value within one workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SweepingOutputInquiry {
    pub execution_id: ExecutionId,
    pub name: String,
}

impl SweepingOutputInquiry {
    pub fn new(execution_id: ExecutionId, name: impl Into<String>) -> Self {
        SweepingOutputInquiry {
            execution_id,
            name: name.into(),
        }
    }
}

/// Marker value recording that a full rollback already ran for this
/// execution. Stored whole, never partially updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllPhaseRollbackDone {
    pub done: bool,
}
