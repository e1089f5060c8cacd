//! Event ingestion handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::IngestResponse;
use crate::app_state::AppState;
use crate::domain::WireEvent;
use crate::error::{ErrorResponse, MonitorError};

/// `POST /events` — Apply one event from the upstream transport.
///
/// An event that references a missing service, or otherwise cannot be
/// applied, is accepted as a no-op and reported in the response body.
///
/// # Errors
///
/// Returns [`MonitorError::MalformedEvent`] if the body is not an event
/// object and [`MonitorError::ProtocolViolation`] if its kind is unknown.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Ingest an event",
    description = "Applies a SERVICE, VERSION, EDIT, DELETE or RESET event to the monitor state and broadcasts it to WebSocket subscribers if it changed the state.",
    request_body = serde_json::Value,
    responses(
        (status = 202, description = "Event processed", body = IngestResponse),
        (status = 400, description = "Malformed event or protocol violation", body = ErrorResponse),
    )
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, MonitorError> {
    let wire: WireEvent = serde_json::from_slice(&body)?;
    let receipt = state.monitor_service.ingest(wire).await?;
    Ok((StatusCode::ACCEPTED, Json(IngestResponse::from(&receipt))))
}

/// Event ingestion routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(ingest_event))
}
