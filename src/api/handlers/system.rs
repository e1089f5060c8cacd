//! System endpoints: health check and store counters.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    services: usize,
    subscribers: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp, tracked service count and connected subscribers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.monitor_service.stats().await;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: stats.services,
            subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// Event counters of the monitor store.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Services currently tracked.
    pub services: usize,
    /// Events applied.
    pub applied: u64,
    /// Events accepted as no-ops.
    pub ignored: u64,
    /// Events rejected as protocol violations.
    pub rejected: u64,
}

/// `GET /stats` — Event counters.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "System",
    summary = "Store counters",
    description = "Returns how many events were applied, ignored and rejected since startup.",
    responses(
        (status = 200, description = "Store counters", body = StatsResponse),
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.monitor_service.stats().await;
    Json(StatsResponse {
        services: stats.services,
        applied: stats.applied,
        ignored: stats.ignored,
        rejected: stats.rejected,
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}
