use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    services::{get_status, health, healthz, list_unroutable, list_workers, metrics, submit_task},
    state::AppState,
};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the HTTP router over a running coordinator
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/task", post(submit_task))
        .route("/status", get(get_status))
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/operators/workers", get(list_workers))
        .route("/operators/unroutable", get(list_unroutable))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state)
        // Transparently decompress gzip-encoded submissions
        .layer(RequestDecompressionLayer::new())
}

/// Count the request against its route and tag the response with a request id
async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    state.metrics().request(&path);

    let request_id = Uuid::now_v7();
    debug!(%request_id, method = %request.method(), path = %path, "Handling request");

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), AnyError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    let coordinator: Arc<_> = state.coordinator.clone();
    let app = router(state);

    info!(%address, "Task server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped, draining tasks");
    coordinator.drain_and_shutdown().await;

    Ok(())
}
