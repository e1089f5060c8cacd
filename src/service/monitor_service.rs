//! Monitor service: serializes event ingestion and emits bus messages.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    ApprovalAction, ApprovalRequest, BusMessage, EventBus, MonitorState, MonitorStore, Receipt,
    ServiceId, ServiceRecord, StoreStats, WireEvent,
};
use crate::error::MonitorError;

/// Orchestration layer for the monitor model.
///
/// Owns the [`MonitorStore`] behind a write lock so that exactly one event
/// is applied at a time, and the [`EventBus`] for fan-out. Every mutation
/// follows the pattern: acquire lock → apply → publish → return receipt.
/// Readers take an `Arc` snapshot and never hold the lock while working.
#[derive(Debug)]
pub struct MonitorService {
    store: RwLock<MonitorStore>,
    event_bus: EventBus,
}

impl MonitorService {
    /// Creates a new `MonitorService` around an empty store.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            store: RwLock::new(MonitorStore::new()),
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Applies one event from the transport and broadcasts it if applied.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ProtocolViolation`] if the event kind is not
    /// recognised.
    pub async fn ingest(&self, wire: WireEvent) -> Result<Receipt, MonitorError> {
        let mut store = self.store.write().await;
        let receipt = store.apply_wire(wire)?;

        if receipt.outcome.is_applied()
            && let Some(event) = &receipt.event
        {
            // Published under the lock so subscribers see events in order.
            let _ = self.event_bus.publish(BusMessage::Applied {
                sequence: receipt.sequence,
                event: event.clone(),
            });
        }
        Ok(receipt)
    }

    /// Current monitor state.
    pub async fn snapshot(&self) -> Arc<MonitorState> {
        self.store.read().await.snapshot()
    }

    /// Current monitor state together with the sequence it reflects.
    ///
    /// Both are read under one lock, so a client can apply every bus
    /// message with a higher sequence on top of the returned state.
    pub async fn sequenced_snapshot(&self) -> (u64, Arc<MonitorState>) {
        let store = self.store.read().await;
        (store.stats().applied, store.snapshot())
    }

    /// Returns the record of one service.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ServiceNotFound`] if the service is unknown.
    pub async fn service(&self, id: &ServiceId) -> Result<Arc<ServiceRecord>, MonitorError> {
        self.snapshot()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MonitorError::ServiceNotFound(id.clone()))
    }

    /// Forwards an approval decision to the upstream dispatcher.
    ///
    /// The action is checked against the flags derived from the current
    /// record. The state itself only changes once upstream acknowledges
    /// the decision with a `VERSION`/`ACTION` event.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ServiceNotFound`] for an unknown service and
    /// [`MonitorError::ActionNotPermitted`] if the action is not offered.
    pub async fn request_action(
        &self,
        id: &ServiceId,
        action: ApprovalAction,
    ) -> Result<ApprovalRequest, MonitorError> {
        let record = self.service(id).await?;
        if !action.is_permitted(&record.flags()) {
            return Err(MonitorError::ActionNotPermitted {
                service_id: id.clone(),
                action,
            });
        }

        let request = ApprovalRequest {
            request_id: uuid::Uuid::new_v4(),
            service_id: id.clone(),
            action,
            latest_version: record.status.latest_version.clone(),
            requested_at: Utc::now(),
        };
        let receivers = self
            .event_bus
            .publish(BusMessage::ActionRequested(request.clone()));
        if receivers == 0 {
            tracing::warn!(
                service_id = %id,
                %action,
                "no dispatcher connected for approval request"
            );
        }

        tracing::info!(
            service_id = %id,
            %action,
            request_id = %request.request_id,
            "approval requested"
        );
        Ok(request)
    }

    /// Store counters.
    pub async fn stats(&self) -> StoreStats {
        self.store.read().await.stats()
    }
}
