//! Read handlers for the monitor view: snapshot, list, single service.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{MonitorSnapshotResponse, PaginationParams, ServiceDto, ServiceListResponse};
use crate::app_state::AppState;
use crate::domain::ServiceId;
use crate::error::{ErrorResponse, MonitorError};

/// `GET /monitor` — Full snapshot of the synchronized model.
#[utoipa::path(
    get,
    path = "/api/v1/monitor",
    tag = "Monitor",
    summary = "Get monitor snapshot",
    description = "Returns the ordering list and every service record with derived flags, tagged with the sequence of the last applied event.",
    responses(
        (status = 200, description = "Monitor snapshot", body = MonitorSnapshotResponse),
    )
)]
pub async fn get_monitor(State(state): State<AppState>) -> impl IntoResponse {
    let (sequence, snapshot) = state.monitor_service.sequenced_snapshot().await;
    Json(MonitorSnapshotResponse::new(sequence, &snapshot))
}

/// `GET /services` — Services in display order, paginated.
#[utoipa::path(
    get,
    path = "/api/v1/services",
    tag = "Monitor",
    summary = "List services",
    description = "Returns a paginated list of services in display order.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated service list", body = ServiceListResponse),
    )
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let snapshot = state.monitor_service.snapshot().await;
    let services: Vec<ServiceDto> = snapshot
        .iter_ordered()
        .enumerate()
        .map(|(position, record)| ServiceDto::new(record, Some(position)))
        .collect();

    let (data, pagination) = params.paginate(services);
    Json(ServiceListResponse { data, pagination })
}

/// `GET /services/:id` — One service with derived flags.
///
/// # Errors
///
/// Returns [`MonitorError::ServiceNotFound`] if the service is unknown.
#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    tag = "Monitor",
    summary = "Get service",
    description = "Returns a single service record with its derived flags and freshness.",
    params(
        ("id" = String, Path, description = "Service identifier"),
    ),
    responses(
        (status = 200, description = "Service details", body = ServiceDto),
        (status = 404, description = "Service not found", body = ErrorResponse),
    )
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MonitorError> {
    let snapshot = state.monitor_service.snapshot().await;
    let record = snapshot
        .get(&id)
        .ok_or_else(|| MonitorError::ServiceNotFound(ServiceId::from(id.as_str())))?;
    Ok(Json(ServiceDto::new(record, snapshot.position(&id))))
}

/// Monitor read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/monitor", get(get_monitor))
        .route("/services", get(list_services))
        .route("/services/{id}", get(get_service))
}
