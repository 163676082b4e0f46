use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::info;

use crate::{scheduled, AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/trigger", post(trigger))
        .route("/status", get(status))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "service": "piggyback-server",
        "endpoints": ["/health", "/trigger", "/status"],
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Spawn a collection run in the background and return immediately. Does not
/// serialize against the scheduler; overlap shows up in `already_running`.
async fn trigger(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let already_running = state.runs.active_runs.load(Ordering::SeqCst) > 0;
    info!(already_running, "Manual collection run triggered");
    tokio::spawn(scheduled::run_and_record(state.runs.clone()));
    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "started", "already_running": already_running })),
    )
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let running = state.runs.active_runs.load(Ordering::SeqCst) > 0;
    let last_run = state.runs.last_run.lock().unwrap().clone();
    let mut scheduler = state.scheduler.clone();
    let next_run = scheduler
        .next_tick_for_job(state.job_id)
        .await
        .ok()
        .flatten()
        .map(|t| t.to_rfc3339());
    Json(json!({
        "running": running,
        "scheduled_time": state.schedule_label,
        "next_run": next_run,
        "last_run": last_run,
    }))
}
