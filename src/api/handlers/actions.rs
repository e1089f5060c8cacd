//! Approval action handler.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ActionRequest, ActionResponse};
use crate::app_state::AppState;
use crate::domain::ServiceId;
use crate::error::{ErrorResponse, MonitorError};

/// `POST /services/:id/actions` — Request send, resend or skip.
///
/// The decision is forwarded to the upstream dispatcher; the service
/// state changes once upstream acknowledges it with a version event.
///
/// # Errors
///
/// Returns [`MonitorError::ServiceNotFound`] for an unknown service and
/// [`MonitorError::ActionNotPermitted`] if the action is not offered.
#[utoipa::path(
    post,
    path = "/api/v1/services/{id}/actions",
    tag = "Actions",
    summary = "Request an approval action",
    description = "Checks the action against the service's derived flags and forwards it to connected dispatchers.",
    params(
        ("id" = String, Path, description = "Service identifier"),
    ),
    request_body = ActionRequest,
    responses(
        (status = 202, description = "Action forwarded", body = ActionResponse),
        (status = 404, description = "Service not found", body = ErrorResponse),
        (status = 409, description = "Action not currently offered", body = ErrorResponse),
    )
)]
pub async fn request_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<impl IntoResponse, MonitorError> {
    let request = state
        .monitor_service
        .request_action(&ServiceId::from(id), req.action)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ActionResponse::from(request))))
}

/// Approval action routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/services/{id}/actions", post(request_action))
}
