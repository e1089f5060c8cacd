//! Broadcast channel for applied events and approval requests.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every event
//! that changes the monitor state is republished through the bus, and all
//! WebSocket connections subscribe to receive filtered messages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::{ApprovalAction, MonitorEvent, ServiceId};

/// An approval decision to hand to the upstream action dispatcher.
///
/// Upstream answers with a `VERSION`/`ACTION` event once the decision has
/// been recorded; the gateway never updates `approved_version` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    /// Correlation id.
    pub request_id: uuid::Uuid,
    /// Target service.
    pub service_id: ServiceId,
    /// Requested decision.
    pub action: ApprovalAction,
    /// Latest version at the time of the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
}

/// Message carried by the [`EventBus`].
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    /// An event was applied to the monitor state.
    Applied {
        /// Monotonic sequence number of the applied event.
        sequence: u64,
        /// The event as applied.
        event: MonitorEvent,
    },
    /// A dashboard user asked for an approval action.
    ActionRequested(ApprovalRequest),
}

impl BusMessage {
    /// The service this message concerns, if a single one.
    #[must_use]
    pub fn service_id(&self) -> Option<&ServiceId> {
        match self {
            Self::Applied { event, .. } => event.service_id(),
            Self::ActionRequested(request) => Some(&request.service_id),
        }
    }
}

/// Broadcast bus for [`BusMessage`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest messages are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a message to all subscribers.
    ///
    /// Returns the number of receivers that received the message.
    /// If there are no active receivers, the message is silently dropped.
    pub fn publish(&self, message: BusMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future messages.
    ///
    /// Each WebSocket connection should call this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
