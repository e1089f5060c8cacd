//! Service layer: business logic orchestration.
//!
//! [`MonitorService`] serializes event ingestion into the
//! [`crate::domain::MonitorStore`] and emits messages through the
//! [`crate::domain::EventBus`].

pub mod monitor_service;

pub use monitor_service::MonitorService;
