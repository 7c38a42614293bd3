//! End-to-end tests over the HTTP surface with a mock ledger gateway.

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use escrow_relayer::api::routes::configure_routes;
use escrow_relayer::config::{MonitorConfig, SubmissionConfig};
use escrow_relayer::domain::{BatchSubmissionManager, ConfirmationMonitor, SubmissionQueue, SubmissionTracker};
use escrow_relayer::models::DefaultAppState;
use escrow_relayer::repositories::{
    InMemoryAuditLogRepository, InMemoryRequestRepository, InMemoryTransactionRepository,
};
use escrow_relayer::services::{HttpLedgerGateway, WebhookNotificationService};
use escrow_relayer::AppState;

fn build_state(gateway_url: &str) -> DefaultAppState {
    let gateway = Arc::new(HttpLedgerGateway::new(gateway_url, None));
    let request_repository = Arc::new(InMemoryRequestRepository::new());
    let transaction_repository = Arc::new(InMemoryTransactionRepository::new());
    let audit_log = Arc::new(InMemoryAuditLogRepository::new());
    let notifier = Arc::new(WebhookNotificationService::new(None));

    let monitor = Arc::new(ConfirmationMonitor::new(
        Arc::clone(&gateway),
        Arc::clone(&request_repository),
        Arc::clone(&transaction_repository),
        Arc::clone(&audit_log),
        Arc::clone(&notifier),
        MonitorConfig::default(),
    ));

    let mut submission_config = SubmissionConfig::default();
    submission_config.initial_backoff_ms = 1;
    submission_config.max_backoff_ms = 2;
    let default_concurrency = submission_config.default_batch_concurrency;
    let tracker = Arc::new(SubmissionTracker::new(
        Arc::clone(&gateway),
        Arc::clone(&request_repository),
        Arc::clone(&transaction_repository),
        Arc::clone(&audit_log),
        Arc::clone(&notifier),
        Arc::clone(&monitor),
        submission_config,
    ));
    let batch_manager = Arc::new(BatchSubmissionManager::new(
        Arc::clone(&tracker),
        default_concurrency,
    ));

    AppState {
        tracker,
        queue: Arc::new(SubmissionQueue::new()),
        batch_manager,
        monitor,
        request_repository,
        transaction_repository,
        audit_log,
    }
}

fn request_payload(id: &str) -> Value {
    json!({
        "id": id,
        "owner": "addr1qxowner",
        "amount": 2_000_000,
        "signed_tx": "84a400818258200000",
        "ttl_slot": 10_000,
    })
}

#[actix_web::test]
async fn test_submit_flow_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/blocks/tip")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"height":100}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/tx/submit")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"hash":"itest-hash"}"#)
        .create_async()
        .await;
    // not yet on-chain when the monitor does its first check
    server
        .mock("GET", "/txs/itest-hash")
        .with_status(404)
        .create_async()
        .await;

    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/requests")
            .set_json(request_payload("req-1"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/req-1")
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["tx_hash"], "itest-hash");
    assert_eq!(body["data"]["attempts"], 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/submit/status/req-1")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["request_status"], "SUBMITTED");
    assert_eq!(body["data"]["transaction"]["tx_hash"], "itest-hash");
    assert_eq!(body["data"]["submission"]["is_active"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/requests/req-1/audit")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let entries = body["data"].as_array().unwrap();
    assert!(entries
        .iter()
        .any(|e| e["kind"] == "submission_succeeded"));
}

#[actix_web::test]
async fn test_submit_unknown_request_is_404() {
    let server = mockito::Server::new_async().await;
    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/missing")
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_batch_over_limit_is_rejected() {
    let server = mockito::Server::new_async().await;
    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    let ids: Vec<String> = (0..11).map(|i| format!("req-{i}")).collect();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/batch")
            .set_json(json!({ "request_ids": ids }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/batch")
            .set_json(json!({ "request_ids": [] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_queue_and_stats_endpoints() {
    let server = mockito::Server::new_async().await;
    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/requests")
            .set_json(request_payload("req-1"))
            .to_request(),
    )
    .await;

    // no driver running, so the entry stays queued
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/queue/req-1")
            .set_json(json!({ "priority": "high" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 202);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["position"], 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/submit/stats")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["queue"]["queue_length"], 1);
    assert_eq!(body["data"]["queue"]["high_priority_depth"], 1);
    assert_eq!(body["data"]["tracker"]["total_submitted"], 0);

    // queueing an unknown id is rejected up front
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/queue/missing")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_cancel_reports_whether_anything_was_cancelled() {
    let server = mockito::Server::new_async().await;
    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/submit/req-1")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["cancelled"], false);
}

#[actix_web::test]
async fn test_monitor_endpoints() {
    let server = mockito::Server::new_async().await;
    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/monitor/stats")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["monitored_count"], 0);

    // nothing monitored, so a manual check is a 404
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/monitor/check/deadbeef")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri("/api/v1/monitor/config")
            .set_json(json!({ "required_confirmations": 6 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_retry_endpoint_arms_delayed_retry() {
    let server = mockito::Server::new_async().await;
    let state = build_state(&server.url());
    let app = test::init_service(
        App::new()
            .app_data(web::ThinData(state))
            .configure(configure_routes),
    )
    .await;

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/requests")
            .set_json(request_payload("req-1"))
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/submit/req-1/retry")
            .set_json(json!({ "delay_ms": 60_000 }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 202);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/submit/status/req-1")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["submission"]["has_retry_scheduled"], true);
}
