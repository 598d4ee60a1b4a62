use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

use taskserver::api::{self, models::TaskAcceptedResponse, state::AppState};
use taskserver::config::Config;
use taskserver::queue::{Coordinator, CoordinatorOptions};
use taskserver::worker::WorkerSpec;

/// Builds a router over a fresh coordinator with fast simulated work
fn build_test_app(workers: Vec<WorkerSpec>) -> (Router, Arc<Coordinator>) {
    let config = Config::default();
    let options = CoordinatorOptions::new(config.queue.capacity, workers)
        .with_execution_delay(Duration::from_millis(10));
    let coordinator = Arc::new(Coordinator::start(options));
    let state = AppState::new(config, coordinator.clone());

    (api::router(state), coordinator)
}

fn devops_app() -> (Router, Arc<Coordinator>) {
    build_test_app(vec![WorkerSpec::new("DevOps"), WorkerSpec::new("DevOps")])
}

fn post_task(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/task")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_submit_then_status_reaches_done() {
    let (app, coordinator) = devops_app();

    let response = app
        .clone()
        .oneshot(post_task(json!({
            "description": "Deploy",
            "priority": 1,
            "requiredRole": "DevOps"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let accepted: TaskAcceptedResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(accepted.task_id, 1);
    assert_eq!(accepted.message, "Task #1 accepted");

    coordinator.wait_idle().await;

    let response = app.oneshot(get("/status?id=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["status"], "done");
    assert_eq!(body["done"], true);
    assert!(body["updated_at"].is_string());
}

#[tokio::test]
async fn test_client_supplied_id_is_ignored() {
    let (app, _coordinator) = devops_app();

    let response = app
        .oneshot(post_task(json!({
            "id": 99,
            "description": "Deploy",
            "requiredRole": "DevOps",
            "done": true
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["task_id"], 1);
}

#[tokio::test]
async fn test_submit_empty_object_rejected() {
    let (app, coordinator) = devops_app();

    let response = app.oneshot(post_task(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_PAYLOAD");
    assert!(coordinator.store().is_empty());
}

#[tokio::test]
async fn test_submit_malformed_json_rejected() {
    let (app, _coordinator) = devops_app();

    let request = Request::builder()
        .method("POST")
        .uri("/task")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_wrong_content_type_rejected() {
    let (app, _coordinator) = devops_app();

    let request = Request::builder()
        .method("POST")
        .uri("/task")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"description":"Deploy","requiredRole":"DevOps"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_oversized_body_rejected() {
    let (app, coordinator) = devops_app();

    let description = "x".repeat(Config::default().server.max_body_bytes.as_usize() + 1);
    let response = app
        .oneshot(post_task(json!({
            "description": description,
            "requiredRole": "DevOps"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(coordinator.store().is_empty());
}

#[tokio::test]
async fn test_status_unknown_id_not_found() {
    let (app, _coordinator) = devops_app();

    let response = app.oneshot(get("/status?id=42")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_invalid_id_rejected() {
    let (app, _coordinator) = devops_app();

    for uri in ["/status?id=abc", "/status?id=", "/status"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_healthz() {
    let (app, _coordinator) = devops_app();

    let response = app.oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_health_reports_components() {
    let (app, coordinator) = devops_app();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["task_queue"], "healthy");
    assert_eq!(body["components"]["worker_pool"], "healthy");
    assert_eq!(body["queue_capacity"], 20);
    assert_eq!(body["unroutable"], 0);

    coordinator.drain_and_shutdown().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["components"]["task_queue"], "unhealthy");
}

#[tokio::test]
async fn test_submit_after_shutdown_unavailable() {
    let (app, coordinator) = devops_app();
    coordinator.drain_and_shutdown().await;

    let response = app
        .oneshot(post_task(json!({"description": "Deploy", "requiredRole": "DevOps"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(coordinator.store().is_empty());
}

#[tokio::test]
async fn test_metrics_count_requests_per_route() {
    let (app, coordinator) = devops_app();

    app.clone().oneshot(get("/healthz")).await.unwrap();
    app.clone().oneshot(get("/healthz")).await.unwrap();
    app.clone()
        .oneshot(post_task(json!({"description": "Deploy", "requiredRole": "DevOps"})))
        .await
        .unwrap();
    coordinator.wait_idle().await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["http_requests"]["/healthz"], 2);
    assert_eq!(body["http_requests"]["/task"], 1);
    assert_eq!(body["tasks_submitted"], 1);
    assert_eq!(body["tasks_completed"], 1);
}

#[tokio::test]
async fn test_operator_views() {
    let (app, coordinator) = build_test_app(vec![WorkerSpec::named("DevOps", "ops-1")]);

    let response = app
        .clone()
        .oneshot(post_task(json!({"description": "Run tests", "requiredRole": "QA"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    coordinator.wait_idle().await;

    let response = app.clone().oneshot(get("/operators/workers")).await.unwrap();
    let workers = body_json(response).await;
    assert_eq!(workers[0]["id"], 1);
    assert_eq!(workers[0]["name"], "ops-1");
    assert_eq!(workers[0]["role"], "DevOps");
    assert_eq!(workers[0]["state"], "idle");

    let response = app.clone().oneshot(get("/operators/unroutable")).await.unwrap();
    let letters = body_json(response).await;
    assert_eq!(letters.as_array().unwrap().len(), 1);
    assert_eq!(letters[0]["task"]["requiredRole"], "QA");
    assert_eq!(letters[0]["reason"], "no_matching_role");

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    let health = body_json(response).await;
    assert_eq!(health["unroutable"], 1);

    let response = app.oneshot(get("/status?id=1")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["done"], false);
}
