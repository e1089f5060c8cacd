//! Domain layer: service records, the event applier, and the event system.
//!
//! This module contains the synchronization core: service identity and
//! records, the ordering list and record store held as one
//! [`MonitorState`], the closed [`MonitorEvent`] union and its wire form,
//! the pure [`reducer`], the [`MonitorStore`] state owner, the
//! update-availability classifier, and the event bus for broadcasting
//! state changes.

pub mod classifier;
pub mod event_bus;
pub mod monitor_event;
pub mod monitor_state;
pub mod monitor_store;
pub mod reducer;
pub mod service_id;
pub mod service_record;

pub use classifier::{ApprovalAction, UpdateFlags, classify, update_available, update_skipped};
pub use event_bus::{ApprovalRequest, BusMessage, EventBus};
pub use monitor_event::{Decoded, MonitorEvent, VersionChange, WireEvent};
pub use monitor_state::MonitorState;
pub use monitor_store::{MonitorStore, Receipt, StoreStats};
pub use reducer::{Ignored, Outcome, Transition};
pub use service_id::ServiceId;
pub use service_record::{PartialServiceRecord, QueryFreshness, ServiceRecord, ServiceStatus};
