// ABOUTME: Integration tests for the Rollback phase idempotency discipline.
// ABOUTME: A completed rollback collapses later attempts; a failed one stays retryable.

mod support;

use std::collections::HashMap;

use cutover::config::RollbackConfig;
use cutover::model::{
    ActivityStatus, ExecutionStatus, ResponseMap, TaskParams, TaskPayload, TaskResponse,
    VmInstanceData,
};
use cutover::phase::{AsyncOutcome, ExecuteOutcome, RollbackPhase};

use support::{TestContext, init_tracing, provisioned_backend, published_setup_element};

fn resize_response() -> TaskResponse {
    TaskResponse::success(TaskPayload::Resize {
        instances: vec![VmInstanceData {
            instance_id: "vm-old-0".to_string(),
            host_name: "vm-old-0.internal".to_string(),
            private_ip: None,
        }],
    })
}

#[tokio::test]
async fn rollback_restores_pre_deployment_capacity() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();
    let phase = RollbackPhase::new(RollbackConfig::default());

    phase.execute(&ctx, &backend).await.unwrap();

    let task = backend.last_dispatched().unwrap();
    assert!(task.rollback);
    let TaskParams::Resize(params) = task.params else {
        panic!("expected resize params");
    };
    assert_eq!(params.new_desired_count, 0);
    assert_eq!(params.old_desired_count, 5);
    let pre = params.pre_deployment_data.expect("snapshot forwarded");
    assert_eq!(pre.desired_capacity, 5);
}

#[tokio::test]
async fn second_rollback_after_success_is_a_no_op() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();
    let phase = RollbackPhase::new(RollbackConfig::default());

    let ExecuteOutcome::Dispatched(dispatched) = phase.execute(&ctx, &backend).await.unwrap()
    else {
        panic!("expected dispatch");
    };

    let mut responses: ResponseMap = HashMap::new();
    responses.insert(dispatched.activity_id.clone(), resize_response());
    let AsyncOutcome::Completed(completion) = phase
        .handle_async_response(&ctx, &backend, &dispatched, &responses)
        .await
        .unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(completion.status, ExecutionStatus::Success);

    let activities_before = backend.activities.lock().len();
    let dispatched_before = backend.dispatched_count();

    // Another phase triggering rollback again must collapse into the first.
    let outcome = phase.execute(&ctx, &backend).await.unwrap();
    let ExecuteOutcome::Completed { status, .. } = outcome else {
        panic!("expected immediate completion");
    };
    assert_eq!(status, ExecutionStatus::Success);
    assert_eq!(backend.dispatched_count(), dispatched_before);
    assert_eq!(backend.activities.lock().len(), activities_before);
}

#[tokio::test]
async fn failed_rollback_leaves_the_marker_unset() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();
    let phase = RollbackPhase::new(RollbackConfig::default());

    let ExecuteOutcome::Dispatched(dispatched) = phase.execute(&ctx, &backend).await.unwrap()
    else {
        panic!("expected dispatch");
    };

    let mut responses: ResponseMap = HashMap::new();
    responses.insert(
        dispatched.activity_id.clone(),
        TaskResponse::failure("provider throttled"),
    );
    let AsyncOutcome::Completed(completion) = phase
        .handle_async_response(&ctx, &backend, &dispatched, &responses)
        .await
        .unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(completion.status, ExecutionStatus::Failed);
    assert_eq!(
        backend.activity_status(&dispatched.activity_id),
        Some(ActivityStatus::Failed)
    );

    // The marker is unset, so a retry dispatches again.
    let outcome = phase.execute(&ctx, &backend).await.unwrap();
    assert!(matches!(outcome, ExecuteOutcome::Dispatched(_)));
    assert_eq!(backend.dispatched_count(), 2);
}

#[tokio::test]
async fn rollback_skips_when_nothing_was_set_up() {
    init_tracing();
    let ctx = TestContext::new();
    let backend = provisioned_backend();
    let phase = RollbackPhase::new(RollbackConfig::default());

    let outcome = phase.execute(&ctx, &backend).await.unwrap();
    let ExecuteOutcome::Skipped { message } = outcome else {
        panic!("expected skip");
    };
    assert_eq!(message, "no setup context element found, nothing to roll back");
    assert_eq!(backend.dispatched_count(), 0);
}

#[tokio::test]
async fn restored_instances_are_not_marked_new() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();
    let phase = RollbackPhase::new(RollbackConfig::default());

    let ExecuteOutcome::Dispatched(dispatched) = phase.execute(&ctx, &backend).await.unwrap()
    else {
        panic!("expected dispatch");
    };

    let mut responses: ResponseMap = HashMap::new();
    responses.insert(dispatched.activity_id.clone(), resize_response());
    let AsyncOutcome::Completed(completion) = phase
        .handle_async_response(&ctx, &backend, &dispatched, &responses)
        .await
        .unwrap()
    else {
        panic!("expected completion");
    };

    assert_eq!(completion.new_instances.len(), 1);
    assert!(completion.new_instances.iter().all(|i| !i.new_instance));
}
