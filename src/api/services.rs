use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use http_body_util::BodyExt;
use std::collections::HashMap;

use super::{
    error::ApiError,
    models::{
        HealthResponse, LimitQuery, StatusQuery, TaskAcceptedResponse, TaskStatusResponse,
    },
    state::AppState,
};
use crate::task::NewTask;

const DEFAULT_LIST_LIMIT: usize = 100;

/// Task submission endpoint (POST /task)
///
/// ## Flow:
/// 1. Require `Content-Type: application/json`
/// 2. Read the body, enforcing `server.max_body_bytes`
/// 3. Deserialize into a [`NewTask`] (client ids are ignored)
/// 4. Hand it to the coordinator, which validates, assigns an id, records
///    `pending` and enqueues; this waits while the queue is full
/// 5. Return 202 Accepted with the assigned id
pub async fn submit_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    super::utils::parse_content_type(content_type)?;

    let max_size = state.config.server.max_body_bytes.as_usize();
    let body_bytes = read_body(body, max_size).await?;

    let new_task: NewTask = serde_json::from_slice(&body_bytes)?;
    let task_id = state.coordinator.submit(new_task).await?;

    let response = TaskAcceptedResponse {
        task_id,
        message: format!("Task #{task_id} accepted"),
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Reads the request body, rejecting anything over `max_size`
async fn read_body(body: axum::body::Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let data = body
        .collect()
        .await
        .map_err(|err| ApiError::InvalidPayload(err.to_string()))?
        .to_bytes()
        .to_vec();

    super::utils::validate_body_size(&data, max_size)?;

    Ok(data)
}

/// Task status endpoint (GET /status?id=N)
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::utils::parse_task_id(query.id.as_deref())?;

    let entry = state
        .coordinator
        .status_entry(id)
        .ok_or_else(|| ApiError::NotFound(format!("task {id}")))?;

    let response = TaskStatusResponse {
        id,
        status: entry.status,
        done: entry.status.is_done(),
        updated_at: entry.updated_at,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Liveness probe (GET /healthz)
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Component health (GET /health)
///
/// - api: always healthy if this handler runs
/// - task_queue: unhealthy once intake has been closed
/// - worker_pool: unhealthy when no workers are running
///
/// Returns 503 Service Unavailable if any component is unhealthy.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let coordinator = &state.coordinator;
    let mut components = HashMap::new();

    components.insert("api".to_string(), "healthy".to_string());
    components.insert(
        "task_queue".to_string(),
        component_status(coordinator.is_accepting()).to_string(),
    );
    components.insert(
        "worker_pool".to_string(),
        component_status(coordinator.worker_count() > 0).to_string(),
    );

    let all_healthy = components.values().all(|status| status == "healthy");
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: component_status(all_healthy).to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        in_flight: coordinator.in_flight(),
        queue_depth: coordinator.queue_depth(),
        queue_capacity: coordinator.queue_capacity(),
        unroutable: coordinator.unroutable_count(),
    };

    (status_code, Json(response))
}

fn component_status(healthy: bool) -> &'static str {
    if healthy { "healthy" } else { "unhealthy" }
}

/// Counter snapshot (GET /metrics)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics().snapshot())
}

/// Worker states (GET /operators/workers)
pub async fn list_workers(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.workers())
}

/// Tasks the dispatcher could not route (GET /operators/unroutable)
pub async fn list_unroutable(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Json(state.coordinator.unroutable(limit))
}
