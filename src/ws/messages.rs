//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ApprovalAction, BusMessage, WireEvent};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp. Clients may omit it.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-originated message.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply to the request with `id`.
    #[must_use]
    pub fn error(id: String, code: u32, message: impl Into<String>) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        )
    }

    /// Wraps a bus message as a pushed event.
    #[must_use]
    pub fn event(message: &BusMessage) -> Self {
        let payload = match message {
            BusMessage::Applied { sequence, event } => serde_json::json!({
                "kind": "applied",
                "sequence": sequence,
                "event": event.kind_str(),
                "data": event.to_wire(),
            }),
            BusMessage::ActionRequested(request) => serde_json::json!({
                "kind": "action_requested",
                "request": request,
            }),
        };
        Self::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload)
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific services.
    Subscribe {
        /// Service IDs to subscribe to. Use `["*"]` for all services.
        service_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific services.
    Unsubscribe {
        /// Service IDs to unsubscribe from. `"*"` drops the wildcard.
        service_ids: Vec<String>,
    },
    /// Get the full monitor state.
    Snapshot,
    /// Feed one upstream event, as `POST /api/v1/events` does.
    Apply {
        /// The event in upstream wire form.
        event: WireEvent,
    },
    /// Request an approval action.
    Action {
        /// Target service.
        service_id: String,
        /// `send`, `resend` or `skip`.
        action: ApprovalAction,
    },
}
