// ABOUTME: Read-only execution context supplied by the surrounding workflow engine.
// ABOUTME: Identifiers, workflow kind, expression rendering, and published context elements.

use serde::{Deserialize, Serialize};

use crate::model::SetupContextElement;
use crate::types::{AppId, EnvId, ExecutionId, InfraMappingId, ServiceId};

/// Orchestration style of the enclosing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Basic,
    Canary,
    BlueGreen,
}

/// Application record from the workflow's standard parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: AppId,
    pub name: String,
    pub account_id: String,
}

/// Environment record from the workflow's standard parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvId,
    pub name: String,
}

/// Service record resolved from the phase element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
}

/// The artifact a phase deploys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub display_name: String,
    pub revision: Option<String>,
}

/// Read-only view of workflow-scoped data.
///
/// Optional accessors return `None` when the engine did not populate the
/// link; the assembler decides which links are fatal. Accessors are cheap
/// and side-effect free.
pub trait ExecutionContext: Send + Sync {
    fn account_id(&self) -> &str;

    fn workflow_execution_id(&self) -> &ExecutionId;

    fn workflow_kind(&self) -> WorkflowKind;

    fn app(&self) -> Option<&Application>;

    fn env(&self) -> Option<&Environment>;

    fn service(&self) -> Option<&Service>;

    fn infra_mapping_id(&self) -> Option<&InfraMappingId>;

    /// User who triggered the execution, if known. Missing identity is
    /// "no further scoping", never an error.
    fn triggered_by(&self) -> Option<&str>;

    /// Render a possibly-expression-valued string against this context.
    fn render_expression(&self, expr: &str) -> String;

    /// The setup context element published earlier in this execution.
    fn setup_element(&self) -> Option<&SetupContextElement>;

    /// Default artifact for a service, if one is configured.
    fn default_artifact(&self, service_id: &ServiceId) -> Option<Artifact>;

    fn is_blue_green(&self) -> bool {
        matches!(self.workflow_kind(), WorkflowKind::BlueGreen)
    }
}
