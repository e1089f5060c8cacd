//! Gateway error types with HTTP status code mapping.
//!
//! [`MonitorError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//!
//! Only a protocol violation is an error at the synchronization layer.
//! Stale references, duplicate creations and malformed ordering payloads
//! are recovered locally by the reducer and never surface here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ApprovalAction, ServiceId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "service not found: argus",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`MonitorError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error code sent over WebSocket to a client that missed bus messages.
pub const LAGGED_CODE: u32 = 1004;

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request              |
/// | 2000–2999 | State/Not Found   | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server            | 500 Internal Server Error    |
///
/// Code 1004 ([`LAGGED_CODE`]) is reserved for the WebSocket notice sent to
/// a client that fell behind the event bus. It has no variant because it
/// never surfaces as an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport sent an event kind this gateway does not understand.
    #[error("protocol violation: unknown event {kind}/{}", .sub_kind.as_deref().unwrap_or("-"))]
    ProtocolViolation {
        /// Event `type` as received.
        kind: String,
        /// Event `sub_type` as received.
        sub_kind: Option<String>,
    },

    /// An event could not be parsed at all.
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// No service with the given id is being tracked.
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// The approval action is not currently offered for this service.
    #[error("action {action} not permitted for service {service_id}")]
    ActionNotPermitted {
        /// Target service.
        service_id: ServiceId,
        /// Rejected action.
        action: ApprovalAction,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ProtocolViolation { .. } => 1002,
            Self::MalformedEvent(_) => 1003,
            Self::ServiceNotFound(_) => 2001,
            Self::ActionNotPermitted { .. } => 2002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::ProtocolViolation { .. } | Self::MalformedEvent(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ServiceNotFound(_) => StatusCode::NOT_FOUND,
            Self::ActionNotPermitted { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for errors that indicate a transport/version mismatch.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. } | Self::MalformedEvent(_))
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn protocol_violation_message_names_kinds() {
        let err = MonitorError::ProtocolViolation {
            kind: "SERVICE".to_string(),
            sub_kind: Some("SHUFFLE".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "protocol violation: unknown event SERVICE/SHUFFLE"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_protocol_error());
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = MonitorError::ServiceNotFound(ServiceId::from("x"));
        assert_eq!(err.error_code(), 2001);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn action_not_permitted_maps_to_409() {
        let err = MonitorError::ActionNotPermitted {
            service_id: ServiceId::from("x"),
            action: ApprovalAction::Skip,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "action skip not permitted for service x");
    }

    #[test]
    fn lagged_code_is_a_distinct_validation_code() {
        let Err(malformed) = serde_json::from_str::<u32>("nope") else {
            panic!("fixture should fail to parse");
        };
        let variants = [
            MonitorError::InvalidRequest(String::new()),
            MonitorError::ProtocolViolation {
                kind: String::new(),
                sub_kind: None,
            },
            MonitorError::MalformedEvent(malformed),
            MonitorError::ServiceNotFound(ServiceId::from("x")),
            MonitorError::ActionNotPermitted {
                service_id: ServiceId::from("x"),
                action: ApprovalAction::Send,
            },
            MonitorError::Internal(String::new()),
        ];

        assert!((1000..2000).contains(&LAGGED_CODE));
        for err in &variants {
            assert_ne!(err.error_code(), LAGGED_CODE, "{err}");
        }
    }
}
