//! State owner for the monitor model.
//!
//! [`MonitorStore`] holds the current [`MonitorState`] and feeds it through
//! the reducer one event at a time. Each applied event swaps in a new
//! `Arc<MonitorState>`, so observers holding an older snapshot keep a
//! consistent view and can detect change with [`Arc::ptr_eq`].

use std::sync::Arc;

use serde::Serialize;

use super::reducer::{self, Ignored, Outcome};
use super::{Decoded, MonitorEvent, MonitorState, WireEvent};
use crate::error::MonitorError;

/// Result of feeding one wire event to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Number of events applied so far, including this one if applied.
    pub sequence: u64,
    /// Log label of the event.
    pub kind: &'static str,
    /// Whether the event changed the state.
    pub outcome: Outcome,
    /// The decoded event, absent for tolerated unknown version events.
    pub event: Option<MonitorEvent>,
}

/// Counters describing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Services currently tracked.
    pub services: usize,
    /// Events applied.
    pub applied: u64,
    /// Events ignored as no-ops.
    pub ignored: u64,
    /// Events rejected as protocol violations.
    pub rejected: u64,
}

/// Owner of the current [`MonitorState`].
#[derive(Debug, Default)]
pub struct MonitorStore {
    state: Arc<MonitorState>,
    applied: u64,
    ignored: u64,
    rejected: u64,
}

impl MonitorStore {
    /// Creates a store with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state. Cheap; shares the store's allocation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MonitorState> {
        Arc::clone(&self.state)
    }

    /// Applies a decoded event.
    pub fn apply(&mut self, event: &MonitorEvent) -> Outcome {
        let transition = reducer::apply(&self.state, event);
        match &transition.outcome {
            Outcome::Applied => {
                self.applied = self.applied.saturating_add(1);
                self.state = Arc::new(transition.state);
                if changes_membership(event) {
                    tracing::info!(
                        event = event.kind_str(),
                        service_id = event.service_id().map(|id| id.as_str()),
                        renamed_to = event.renamed_to().map(|id| id.as_str()),
                        services = self.state.len(),
                        "service set changed"
                    );
                }
                tracing::debug!(
                    event = event.kind_str(),
                    service_id = event.service_id().map(|id| id.as_str()),
                    sequence = self.applied,
                    services = self.state.len(),
                    "event applied"
                );
            }
            Outcome::Ignored(reason) => self.note_ignored(event.kind_str(), reason),
        }
        transition.outcome
    }

    /// Decodes and applies an event as received from the transport.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ProtocolViolation`] if the event kind is not
    /// recognised. The state is left untouched.
    pub fn apply_wire(&mut self, wire: WireEvent) -> Result<Receipt, MonitorError> {
        let decoded = wire.decode().inspect_err(|err| {
            self.rejected = self.rejected.saturating_add(1);
            tracing::error!(error = %err, "rejecting event from transport");
        })?;

        match decoded {
            Decoded::Event(event) => {
                let outcome = self.apply(&event);
                Ok(Receipt {
                    sequence: self.applied,
                    kind: event.kind_str(),
                    outcome,
                    event: Some(event),
                })
            }
            Decoded::UnknownVersionChange(sub_kind) => {
                let reason = Ignored::UnknownVersionChange(sub_kind);
                self.note_ignored("version", &reason);
                Ok(Receipt {
                    sequence: self.applied,
                    kind: "version",
                    outcome: Outcome::Ignored(reason),
                    event: None,
                })
            }
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            services: self.state.len(),
            applied: self.applied,
            ignored: self.ignored,
            rejected: self.rejected,
        }
    }

    fn note_ignored(&mut self, kind: &'static str, reason: &Ignored) {
        self.ignored = self.ignored.saturating_add(1);
        tracing::warn!(event = kind, %reason, "event ignored");
    }
}

fn changes_membership(event: &MonitorEvent) -> bool {
    matches!(
        event,
        MonitorEvent::Reorder { .. }
            | MonitorEvent::Create { .. }
            | MonitorEvent::Delete { .. }
            | MonitorEvent::Reset
    ) || event.renamed_to().is_some()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ServiceId;

    fn wire(json: &str) -> WireEvent {
        let Ok(wire) = serde_json::from_str::<WireEvent>(json) else {
            panic!("bad fixture: {json}");
        };
        wire
    }

    #[test]
    fn applied_event_swaps_snapshot() {
        let mut store = MonitorStore::new();
        let before = store.snapshot();

        let outcome = store.apply(&MonitorEvent::Reorder {
            order: Some(vec![ServiceId::from("a")]),
        });

        assert!(outcome.is_applied());
        let after = store.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn ignored_event_keeps_snapshot() {
        let mut store = MonitorStore::new();
        let before = store.snapshot();

        let outcome = store.apply(&MonitorEvent::Delete {
            target: Some(ServiceId::from("missing")),
        });

        assert!(!outcome.is_applied());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.stats().ignored, 1);
    }

    #[test]
    fn wire_events_are_sequenced() {
        let mut store = MonitorStore::new();
        let Ok(first) =
            store.apply_wire(wire(r#"{"type":"SERVICE","sub_type":"ORDERING","order":["a"]}"#))
        else {
            panic!("ordering should apply");
        };
        assert_eq!(first.sequence, 1);
        assert_eq!(first.kind, "reorder");

        let Ok(second) =
            store.apply_wire(wire(r#"{"type":"EDIT","service_data":{"id":"b"}}"#))
        else {
            panic!("create should apply");
        };
        assert_eq!(second.sequence, 2);
        assert_eq!(store.snapshot().order().len(), 2);
    }

    #[test]
    fn protocol_violation_is_rejected_and_counted() {
        let mut store = MonitorStore::new();
        let result = store.apply_wire(wire(r#"{"type":"WHAT"}"#));
        assert!(matches!(result, Err(MonitorError::ProtocolViolation { .. })));
        assert_eq!(store.stats().rejected, 1);
        assert_eq!(store.stats().applied, 0);
    }

    #[test]
    fn unknown_version_change_is_ignored() {
        let mut store = MonitorStore::new();
        let Ok(receipt) = store.apply_wire(wire(r#"{"type":"VERSION","sub_type":"NEWER"}"#))
        else {
            panic!("unknown version events are tolerated");
        };
        assert_eq!(
            receipt.outcome,
            Outcome::Ignored(Ignored::UnknownVersionChange("NEWER".to_string()))
        );
        assert!(receipt.event.is_none());
        assert_eq!(store.stats().ignored, 1);
    }

    #[test]
    fn membership_changes_are_recognised() {
        let changing = [
            MonitorEvent::Reorder {
                order: Some(vec![ServiceId::from("a")]),
            },
            MonitorEvent::Create { data: None },
            MonitorEvent::Delete {
                target: Some(ServiceId::from("a")),
            },
            MonitorEvent::Reset,
        ];
        for event in &changing {
            assert!(changes_membership(event), "{}", event.kind_str());
        }

        let query = wire(r#"{"type":"VERSION","sub_type":"QUERY","service_data":{"id":"a"}}"#);
        let Ok(Decoded::Event(version)) = query.decode() else {
            panic!("version event should decode");
        };
        assert!(!changes_membership(&version));

        let edit = wire(r#"{"type":"EDIT","sub_type":"a","service_data":{"id":"a","url":"u"}}"#);
        let Ok(Decoded::Event(update)) = edit.decode() else {
            panic!("edit event should decode");
        };
        assert!(update.renamed_to().is_none());
        assert!(!changes_membership(&update));
    }
}
