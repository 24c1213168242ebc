// ABOUTME: Test support utilities.
// ABOUTME: In-memory backend and execution context for phase integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;

use async_trait::async_trait;
use parking_lot::Mutex;

use cutover::backend::{
    ActivityError, ActivityOps, DispatchError, DispatchOps, InfraOps, LogCallback, LogLevel,
    LookupError, SettingsOps, SweepingError, SweepingOutputs, TaskHandle,
};
use cutover::context::{
    Application, Artifact, Environment, ExecutionContext, Service, WorkflowKind,
};
use cutover::model::{
    Activity, ActivityStatus, CloudCredentials, DelegateTask, EncryptedDataDetail,
    InfrastructureMapping, LoadBalancerRouteDetail, NewActivity, PreDeploymentData,
    ResizeStrategy, ScaleSetInfraMapping, SetupContextElement, SweepingOutputInquiry,
    SweepingOutputInstance,
};
use cutover::types::{
    ActivityId, AppId, EnvId, ExecutionId, InfraMappingId, ServiceId, SettingId,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("cutover=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Default)]
struct LogSink;

impl LogCallback for LogSink {
    fn save_execution_log(&self, line: &str, _level: LogLevel) {
        tracing::debug!(target: "cutover::test_log", "{}", line);
    }
}

/// In-memory implementation of every backend seam the phases consume.
#[derive(Default)]
pub struct InMemoryBackend {
    next_activity: Mutex<u64>,
    pub activities: Mutex<Vec<Activity>>,
    pub dispatched: Mutex<Vec<DelegateTask>>,
    sweeping: Mutex<HashMap<(ExecutionId, String), SweepingOutputInstance>>,
    infra_mappings: Mutex<HashMap<InfraMappingId, InfrastructureMapping>>,
    credentials: Mutex<HashMap<SettingId, (CloudCredentials, Vec<EncryptedDataDetail>)>>,
}

#[allow(dead_code)]
impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_infra_mapping(&self, id: InfraMappingId, mapping: InfrastructureMapping) {
        self.infra_mappings.lock().insert(id, mapping);
    }

    pub fn insert_credentials(&self, id: SettingId, credentials: CloudCredentials) {
        self.credentials.lock().insert(id, (credentials, Vec::new()));
    }

    pub fn activity_status(&self, id: &ActivityId) -> Option<ActivityStatus> {
        self.activities
            .lock()
            .iter()
            .find(|a| &a.id == id)
            .map(|a| a.status)
    }

    pub fn dispatched_count(&self) -> usize {
        self.dispatched.lock().len()
    }

    pub fn last_dispatched(&self) -> Option<DelegateTask> {
        self.dispatched.lock().last().cloned()
    }
}

#[async_trait]
impl ActivityOps for InMemoryBackend {
    async fn create_activity(&self, activity: NewActivity) -> Result<Activity, ActivityError> {
        let mut next = self.next_activity.lock();
        *next += 1;
        let id = ActivityId::new(format!("activity-{}", *next));
        drop(next);

        let persisted = Activity::persisted(activity, id);
        self.activities.lock().push(persisted.clone());
        Ok(persisted)
    }

    async fn update_activity_status(
        &self,
        id: &ActivityId,
        _app_id: &AppId,
        status: ActivityStatus,
    ) -> Result<(), ActivityError> {
        let mut activities = self.activities.lock();
        let activity = activities
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| ActivityError::NotFound(id.clone()))?;
        if activity.status == status {
            return Ok(());
        }
        activity.status = status;
        Ok(())
    }

    fn log_callback(&self, _activity: &Activity) -> Arc<dyn LogCallback> {
        Arc::new(LogSink)
    }
}

#[async_trait]
impl DispatchOps for InMemoryBackend {
    async fn submit(&self, task: DelegateTask) -> Result<TaskHandle, DispatchError> {
        let correlation_id = task.correlation_id.clone();
        self.dispatched.lock().push(task);
        Ok(TaskHandle { correlation_id })
    }
}

#[async_trait]
impl SweepingOutputs for InMemoryBackend {
    async fn save(&self, instance: SweepingOutputInstance) -> Result<(), SweepingError> {
        let key = (instance.execution_id.clone(), instance.name.clone());
        self.sweeping.lock().insert(key, instance);
        Ok(())
    }

    async fn find(
        &self,
        inquiry: &SweepingOutputInquiry,
    ) -> Result<Option<SweepingOutputInstance>, SweepingError> {
        let key = (inquiry.execution_id.clone(), inquiry.name.clone());
        Ok(self.sweeping.lock().get(&key).cloned())
    }
}

#[async_trait]
impl InfraOps for InMemoryBackend {
    async fn infrastructure_mapping(
        &self,
        id: &InfraMappingId,
        _app_id: &AppId,
    ) -> Result<Option<InfrastructureMapping>, LookupError> {
        Ok(self.infra_mappings.lock().get(id).cloned())
    }
}

#[async_trait]
impl SettingsOps for InMemoryBackend {
    async fn credentials(
        &self,
        setting_id: &SettingId,
    ) -> Result<Option<(CloudCredentials, Vec<EncryptedDataDetail>)>, LookupError> {
        Ok(self.credentials.lock().get(setting_id).cloned())
    }
}

/// An execution context whose expression renderer echoes its input, with
/// every link of the resolution chain populated.
pub struct TestContext {
    pub execution_id: ExecutionId,
    pub workflow_kind: WorkflowKind,
    pub application: Option<Application>,
    pub environment: Option<Environment>,
    pub service: Option<Service>,
    pub infra_mapping_id: Option<InfraMappingId>,
    pub setup_element: Option<SetupContextElement>,
    pub artifact: Option<Artifact>,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        TestContext {
            execution_id: ExecutionId::new("exec-1"),
            workflow_kind: WorkflowKind::BlueGreen,
            application: Some(Application {
                id: AppId::new("app-1"),
                name: "orders".to_string(),
                account_id: "account-1".to_string(),
            }),
            environment: Some(Environment {
                id: EnvId::new("env-1"),
                name: "prod".to_string(),
            }),
            service: Some(Service {
                id: ServiceId::new("svc-1"),
                name: "api".to_string(),
            }),
            infra_mapping_id: Some(InfraMappingId::new("infra-1")),
            setup_element: None,
            artifact: Some(Artifact {
                display_name: "orders-api-42".to_string(),
                revision: Some("42".to_string()),
            }),
        }
    }

    pub fn with_setup_element(mut self, element: SetupContextElement) -> Self {
        self.setup_element = Some(element);
        self
    }
}

impl ExecutionContext for TestContext {
    fn account_id(&self) -> &str {
        "account-1"
    }

    fn workflow_execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    fn workflow_kind(&self) -> WorkflowKind {
        self.workflow_kind
    }

    fn app(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    fn env(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    fn infra_mapping_id(&self) -> Option<&InfraMappingId> {
        self.infra_mapping_id.as_ref()
    }

    fn triggered_by(&self) -> Option<&str> {
        Some("deployer")
    }

    fn render_expression(&self, expr: &str) -> String {
        expr.to_string()
    }

    fn setup_element(&self) -> Option<&SetupContextElement> {
        self.setup_element.as_ref()
    }

    fn default_artifact(&self, _service_id: &ServiceId) -> Option<Artifact> {
        self.artifact.clone()
    }
}

/// Backend pre-populated with the infra mapping and credentials the
/// default [`TestContext`] resolves.
#[allow(dead_code)]
pub fn provisioned_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.insert_infra_mapping(
        InfraMappingId::new("infra-1"),
        InfrastructureMapping::ScaleSet(ScaleSetInfraMapping {
            id: InfraMappingId::new("infra-1"),
            subscription_id: "sub-1".to_string(),
            resource_group: "rg-1".to_string(),
            compute_provider_setting_id: SettingId::new("setting-1"),
        }),
    );
    backend.insert_credentials(
        SettingId::new("setting-1"),
        CloudCredentials {
            client_id: "client".to_string(),
            tenant_id: "tenant".to_string(),
            key_reference: "key-ref".to_string(),
        },
    );
    backend
}

/// A setup context element as the Setup phase would publish it after a
/// successful blue/green run.
#[allow(dead_code)]
pub fn published_setup_element() -> SetupContextElement {
    SetupContextElement {
        new_scale_set_name: "newScaleSet".to_string(),
        old_scale_set_name: Some("oldScaleSet".to_string()),
        desired_instances: 5,
        min_instances: 0,
        max_instances: 10,
        old_desired_count: 5,
        blue_green: true,
        resize_strategy: ResizeStrategy::ResizeNewFirst,
        steady_state_timeout_minutes: 20,
        pre_deployment_data: PreDeploymentData {
            old_scale_set_name: Some("oldScaleSet".to_string()),
            desired_capacity: 5,
            min_capacity: 0,
            scaling_policy_json: None,
        },
        route_detail: Some(LoadBalancerRouteDetail {
            load_balancer_id: "lb-1".to_string(),
            prod_backend_pool_id: "pool-prod".to_string(),
            stage_backend_pool_id: "pool-stage".to_string(),
        }),
    }
}
