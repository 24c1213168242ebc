// ABOUTME: Integration tests for the SwitchRoutes phase and its rollback counterpart.
// ABOUTME: Forward and rollback runs must build identical parameters; only the flag differs.

mod support;

use std::collections::HashMap;

use cutover::backend::find_typed;
use cutover::config::SwitchRoutesConfig;
use cutover::model::{
    ActivityStatus, ExecutionStatus, ResponseMap, SweepingOutputInquiry, TRAFFIC_SHIFT_PERCENT,
    TaskParams, TaskPayload, TaskResponse,
};
use cutover::phase::{AsyncOutcome, ExecuteOutcome, SwitchRoutesPhase};
use cutover::types::ExecutionId;

use support::{TestContext, init_tracing, provisioned_backend, published_setup_element};

fn config() -> SwitchRoutesConfig {
    SwitchRoutesConfig {
        downscale_old_scale_set: true,
        timeout: None,
    }
}

#[tokio::test]
async fn forward_and_rollback_build_identical_parameters() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());

    let forward = SwitchRoutesPhase::forward(config())
        .task_params(&ctx)
        .unwrap()
        .unwrap();
    let rollback = SwitchRoutesPhase::rollback(config())
        .task_params(&ctx)
        .unwrap()
        .unwrap();

    assert_eq!(forward, rollback);
    assert_eq!(forward.old_scale_set_name.as_deref(), Some("oldScaleSet"));
    assert_eq!(forward.new_scale_set_name, "newScaleSet");
    assert!(forward.downscale_old_scale_set);
}

#[tokio::test]
async fn only_the_rollback_flag_differs_on_the_wire() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();

    SwitchRoutesPhase::forward(config())
        .execute(&ctx, &backend)
        .await
        .unwrap();
    SwitchRoutesPhase::rollback(config())
        .execute(&ctx, &backend)
        .await
        .unwrap();

    let dispatched = backend.dispatched.lock().clone();
    assert_eq!(dispatched.len(), 2);
    assert!(!dispatched[0].rollback);
    assert!(dispatched[1].rollback);

    let TaskParams::SwitchRoutes(forward) = dispatched[0].params.clone() else {
        panic!("expected switch-routes params");
    };
    let TaskParams::SwitchRoutes(rollback) = dispatched[1].params.clone() else {
        panic!("expected switch-routes params");
    };
    assert_eq!(forward, rollback);
}

#[tokio::test]
async fn skip_without_setup_element() {
    init_tracing();
    let ctx = TestContext::new();
    let backend = provisioned_backend();

    let outcome = SwitchRoutesPhase::forward(config())
        .execute(&ctx, &backend)
        .await
        .unwrap();

    let ExecuteOutcome::Skipped { message } = outcome else {
        panic!("expected skip");
    };
    assert_eq!(message, "no setup context element found, no routes to switch");
    assert_eq!(backend.dispatched_count(), 0);
}

#[tokio::test]
async fn missing_route_detail_is_a_precondition_error() {
    init_tracing();
    let mut element = published_setup_element();
    element.route_detail = None;
    let ctx = TestContext::new().with_setup_element(element);
    let backend = provisioned_backend();

    let err = SwitchRoutesPhase::forward(config())
        .execute(&ctx, &backend)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("route detail"));
    assert_eq!(backend.dispatched_count(), 0);
}

#[tokio::test]
async fn success_records_traffic_shift_percent() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();
    let phase = SwitchRoutesPhase::forward(config());

    let ExecuteOutcome::Dispatched(dispatched) = phase.execute(&ctx, &backend).await.unwrap()
    else {
        panic!("expected dispatch");
    };

    let mut responses: ResponseMap = HashMap::new();
    responses.insert(
        dispatched.activity_id.clone(),
        TaskResponse::success(TaskPayload::SwitchRoutes),
    );

    let AsyncOutcome::Completed(completion) = phase
        .handle_async_response(&ctx, &backend, &dispatched, &responses)
        .await
        .unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(completion.status, ExecutionStatus::Success);
    assert_eq!(
        backend.activity_status(&dispatched.activity_id),
        Some(ActivityStatus::Success)
    );

    let inquiry = SweepingOutputInquiry::new(ExecutionId::new("exec-1"), TRAFFIC_SHIFT_PERCENT);
    let percent: Option<f64> = find_typed(&backend, &inquiry).await.unwrap();
    assert_eq!(percent, Some(100.0));
}

#[tokio::test]
async fn rollback_success_records_zero_traffic_on_new_set() {
    init_tracing();
    let ctx = TestContext::new().with_setup_element(published_setup_element());
    let backend = provisioned_backend();
    let phase = SwitchRoutesPhase::rollback(config());

    let ExecuteOutcome::Dispatched(dispatched) = phase.execute(&ctx, &backend).await.unwrap()
    else {
        panic!("expected dispatch");
    };

    let mut responses: ResponseMap = HashMap::new();
    responses.insert(
        dispatched.activity_id.clone(),
        TaskResponse::success(TaskPayload::SwitchRoutes),
    );

    phase
        .handle_async_response(&ctx, &backend, &dispatched, &responses)
        .await
        .unwrap();

    let inquiry = SweepingOutputInquiry::new(ExecutionId::new("exec-1"), TRAFFIC_SHIFT_PERCENT);
    let percent: Option<f64> = find_typed(&backend, &inquiry).await.unwrap();
    assert_eq!(percent, Some(0.0));
}
