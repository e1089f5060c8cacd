//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::MonitorService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Monitor service owning the synchronized model.
    pub monitor_service: Arc<MonitorService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state around a fresh service with the given bus capacity.
    #[must_use]
    pub fn new(event_bus_capacity: usize) -> Self {
        let event_bus = EventBus::new(event_bus_capacity);
        let monitor_service = Arc::new(MonitorService::new(event_bus.clone()));
        Self {
            monitor_service,
            event_bus,
        }
    }
}
