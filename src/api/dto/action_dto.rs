//! DTOs for approval actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ApprovalAction, ApprovalRequest};

/// Body of `POST /api/v1/services/{id}/actions`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ActionRequest {
    /// `send`, `resend` or `skip`.
    #[schema(value_type = String, example = "send")]
    pub action: ApprovalAction,
}

/// Accepted approval request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Correlation id of the forwarded request.
    pub request_id: uuid::Uuid,
    /// Target service.
    pub service_id: String,
    /// Requested action.
    pub action: String,
    /// Latest version when the request was made.
    pub latest_version: Option<String>,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
}

impl From<ApprovalRequest> for ActionResponse {
    fn from(request: ApprovalRequest) -> Self {
        Self {
            request_id: request.request_id,
            service_id: request.service_id.into(),
            action: request.action.to_string(),
            latest_version: request.latest_version,
            requested_at: request.requested_at,
        }
    }
}
