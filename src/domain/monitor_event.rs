//! Inbound events: the permissive wire shape and the closed event union.
//!
//! The transport delivers [`WireEvent`]s, a loosely typed envelope whose
//! meaning depends on a `type`/`sub_type` string pair. [`WireEvent::decode`]
//! turns it into a [`MonitorEvent`], which the reducer matches
//! exhaustively. Decoding is the only place an unrecognised event kind is
//! detected, and the only place where doing so is fatal.

use serde::{Deserialize, Serialize};

use super::{PartialServiceRecord, ServiceId};
use crate::error::MonitorError;

const KIND_SERVICE: &str = "SERVICE";
const KIND_VERSION: &str = "VERSION";
const KIND_EDIT: &str = "EDIT";
const KIND_DELETE: &str = "DELETE";
const KIND_RESET: &str = "RESET";

const SUB_ORDERING: &str = "ORDERING";
const SUB_INIT: &str = "INIT";

/// Event envelope as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// Upstream UI routing hint. Not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Event family: `SERVICE`, `VERSION`, `EDIT`, `DELETE` or `RESET`.
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,

    /// Family-specific discriminator, or the target id for `EDIT`/`DELETE`.
    #[serde(
        rename = "sub_type",
        alias = "sub_kind",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_kind: Option<String>,

    /// Full ordering list, for `SERVICE`/`ORDERING` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<ServiceId>>,

    /// Service payload, for snapshot, version and edit events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_data: Option<PartialServiceRecord>,
}

/// Result of decoding a [`WireEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A recognised event, ready for the reducer.
    Event(MonitorEvent),
    /// A `VERSION` event with a sub-kind this gateway does not know.
    /// Tolerated: newer upstreams may add version notifications.
    UnknownVersionChange(String),
}

impl WireEvent {
    /// Classifies the envelope into a [`MonitorEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ProtocolViolation`] for an unknown event kind
    /// or an unknown `SERVICE` sub-kind.
    pub fn decode(self) -> Result<Decoded, MonitorError> {
        let sub_kind = self.sub_kind.filter(|s| !s.is_empty());
        let kind = self.kind;

        let event = if kind.eq_ignore_ascii_case(KIND_SERVICE) {
            if is_named(sub_kind.as_deref(), SUB_ORDERING) {
                MonitorEvent::Reorder { order: self.order }
            } else if is_named(sub_kind.as_deref(), SUB_INIT) {
                MonitorEvent::SnapshotInit {
                    data: self.service_data,
                }
            } else {
                return Err(MonitorError::ProtocolViolation { kind, sub_kind });
            }
        } else if kind.eq_ignore_ascii_case(KIND_VERSION) {
            let raw = sub_kind.unwrap_or_default();
            let Some(change) = VersionChange::from_wire(&raw) else {
                return Ok(Decoded::UnknownVersionChange(raw));
            };
            MonitorEvent::Version {
                change,
                data: self.service_data,
            }
        } else if kind.eq_ignore_ascii_case(KIND_EDIT) {
            match sub_kind {
                Some(target) => MonitorEvent::Update {
                    target: ServiceId::from(target),
                    data: self.service_data,
                },
                None => MonitorEvent::Create {
                    data: self.service_data,
                },
            }
        } else if kind.eq_ignore_ascii_case(KIND_DELETE) {
            MonitorEvent::Delete {
                target: sub_kind.map(ServiceId::from),
            }
        } else if kind.eq_ignore_ascii_case(KIND_RESET) {
            MonitorEvent::Reset
        } else {
            return Err(MonitorError::ProtocolViolation { kind, sub_kind });
        };

        Ok(Decoded::Event(event))
    }
}

fn is_named(value: Option<&str>, name: &str) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(name))
}

/// Sub-kinds of the `VERSION` event family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionChange {
    /// Upstream was queried; only `last_queried` moves.
    Query,
    /// A new latest version was discovered.
    NewCandidate,
    /// The deployed version changed.
    DeployedUpdate,
    /// First lookup: latest and deployed are the same version.
    InitSnapshot,
    /// An approval (or skip) was acknowledged.
    ActionAck,
}

impl VersionChange {
    /// Parses an upstream `sub_type` string, ignoring ASCII case.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        [
            Self::Query,
            Self::NewCandidate,
            Self::DeployedUpdate,
            Self::InitSnapshot,
            Self::ActionAck,
        ]
        .into_iter()
        .find(|change| raw.eq_ignore_ascii_case(change.as_wire()))
    }

    /// Upstream `sub_type` string.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::NewCandidate => "NEW",
            Self::DeployedUpdate => "UPDATED",
            Self::InitSnapshot => "INIT",
            Self::ActionAck => "ACTION",
        }
    }
}

/// A decoded inbound event.
///
/// Payloads stay optional where upstream may omit them; the reducer turns
/// a missing payload into an ignored event rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Replace the ordering list. Authoritative for membership.
    Reorder {
        /// New ordering list.
        order: Option<Vec<ServiceId>>,
    },
    /// Full record for one service.
    SnapshotInit {
        /// Record data, keyed by its `id`.
        data: Option<PartialServiceRecord>,
    },
    /// Version state change for one service.
    Version {
        /// Which status fields the event owns.
        change: VersionChange,
        /// Carries the target `id` and the new values.
        data: Option<PartialServiceRecord>,
    },
    /// A service was added.
    Create {
        /// The new service.
        data: Option<PartialServiceRecord>,
    },
    /// An existing service was edited, possibly renamed.
    Update {
        /// Id of the service before the edit.
        target: ServiceId,
        /// Fields to overlay.
        data: Option<PartialServiceRecord>,
    },
    /// A service was removed.
    Delete {
        /// Id to remove.
        target: Option<ServiceId>,
    },
    /// Forget every service.
    Reset,
}

impl MonitorEvent {
    /// The service this event is about, if it targets a single one.
    #[must_use]
    pub fn service_id(&self) -> Option<&ServiceId> {
        match self {
            Self::SnapshotInit { data } | Self::Version { data, .. } | Self::Create { data } => {
                data.as_ref().and_then(|d| d.id.as_ref())
            }
            Self::Update { target, .. } => Some(target),
            Self::Delete { target } => target.as_ref(),
            Self::Reorder { .. } | Self::Reset => None,
        }
    }

    /// New id of the target when this event renames a service.
    #[must_use]
    pub fn renamed_to(&self) -> Option<&ServiceId> {
        match self {
            Self::Update { target, data } => data
                .as_ref()
                .and_then(|d| d.id.as_ref())
                .filter(|id| !id.is_empty() && *id != target),
            _ => None,
        }
    }

    /// Stable label for logs and API responses.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Reorder { .. } => "reorder",
            Self::SnapshotInit { .. } => "snapshot_init",
            Self::Version { change, .. } => match change {
                VersionChange::Query => "version_query",
                VersionChange::NewCandidate => "version_new",
                VersionChange::DeployedUpdate => "version_updated",
                VersionChange::InitSnapshot => "version_init",
                VersionChange::ActionAck => "version_action",
            },
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Reset => "reset",
        }
    }

    /// Re-encodes the event in upstream wire form.
    #[must_use]
    pub fn to_wire(&self) -> WireEvent {
        let (kind, sub_kind, order, service_data) = match self {
            Self::Reorder { order } => (
                KIND_SERVICE,
                Some(SUB_ORDERING.to_string()),
                order.clone(),
                None,
            ),
            Self::SnapshotInit { data } => {
                (KIND_SERVICE, Some(SUB_INIT.to_string()), None, data.clone())
            }
            Self::Version { change, data } => (
                KIND_VERSION,
                Some(change.as_wire().to_string()),
                None,
                data.clone(),
            ),
            Self::Create { data } => (KIND_EDIT, None, None, data.clone()),
            Self::Update { target, data } => {
                (KIND_EDIT, Some(target.to_string()), None, data.clone())
            }
            Self::Delete { target } => (
                KIND_DELETE,
                target.as_ref().map(ToString::to_string),
                None,
                None,
            ),
            Self::Reset => (KIND_RESET, None, None, None),
        };
        WireEvent {
            page: None,
            kind: kind.to_string(),
            sub_kind,
            order,
            service_data,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WireEvent {
        let Ok(wire) = serde_json::from_str::<WireEvent>(json) else {
            panic!("wire event should parse: {json}");
        };
        wire
    }

    fn decode_event(json: &str) -> MonitorEvent {
        match parse(json).decode() {
            Ok(Decoded::Event(event)) => event,
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn decodes_ordering() {
        let event = decode_event(r#"{"page":"APPROVALS","type":"SERVICE","sub_type":"ORDERING","order":["a","b"]}"#);
        assert_eq!(
            event,
            MonitorEvent::Reorder {
                order: Some(vec![ServiceId::from("a"), ServiceId::from("b")])
            }
        );
    }

    #[test]
    fn decodes_alias_field_names() {
        let event = decode_event(r#"{"kind":"version","sub_kind":"query","service_data":{"id":"a"}}"#);
        assert_eq!(event.kind_str(), "version_query");
        assert_eq!(event.service_id(), Some(&ServiceId::from("a")));
    }

    #[test]
    fn edit_without_sub_type_is_create() {
        let event = decode_event(r#"{"type":"EDIT","service_data":{"id":"new"}}"#);
        assert!(matches!(event, MonitorEvent::Create { .. }));

        let event = decode_event(r#"{"type":"EDIT","sub_type":"","service_data":{"id":"new"}}"#);
        assert!(matches!(event, MonitorEvent::Create { .. }));
    }

    #[test]
    fn edit_with_sub_type_is_update_of_old_id() {
        let event = decode_event(r#"{"type":"EDIT","sub_type":"old","service_data":{"id":"new"}}"#);
        assert_eq!(event.service_id(), Some(&ServiceId::from("old")));
        assert_eq!(event.renamed_to(), Some(&ServiceId::from("new")));

        let event = decode_event(r#"{"type":"EDIT","sub_type":"same","service_data":{"id":"same"}}"#);
        assert!(event.renamed_to().is_none());
    }

    #[test]
    fn unknown_kind_is_protocol_violation() {
        let result = parse(r#"{"type":"BOGUS"}"#).decode();
        assert!(matches!(
            result,
            Err(MonitorError::ProtocolViolation { ref kind, .. }) if kind == "BOGUS"
        ));
    }

    #[test]
    fn unknown_service_sub_kind_is_protocol_violation() {
        let result = parse(r#"{"type":"SERVICE","sub_type":"SHUFFLE"}"#).decode();
        assert!(matches!(result, Err(MonitorError::ProtocolViolation { .. })));

        let result = parse(r#"{"type":"SERVICE"}"#).decode();
        assert!(matches!(result, Err(MonitorError::ProtocolViolation { .. })));
    }

    #[test]
    fn unknown_version_sub_kind_is_tolerated() {
        let result = parse(r#"{"type":"VERSION","sub_type":"ROLLBACK"}"#).decode();
        assert_eq!(
            result.ok(),
            Some(Decoded::UnknownVersionChange("ROLLBACK".to_string()))
        );
    }

    #[test]
    fn version_change_wire_names() {
        assert_eq!(VersionChange::from_wire("new"), Some(VersionChange::NewCandidate));
        assert_eq!(VersionChange::from_wire("UPDATED"), Some(VersionChange::DeployedUpdate));
        assert_eq!(VersionChange::from_wire("nope"), None);
        assert_eq!(VersionChange::ActionAck.as_wire(), "ACTION");
    }

    #[test]
    fn to_wire_decodes_back_to_same_event() {
        let events = [
            MonitorEvent::Delete {
                target: Some(ServiceId::from("a")),
            },
            MonitorEvent::Reset,
            MonitorEvent::Update {
                target: ServiceId::from("a"),
                data: None,
            },
        ];
        for event in events {
            let decoded = event.to_wire().decode();
            assert_eq!(decoded.ok(), Some(Decoded::Event(event)));
        }
    }

    #[test]
    fn wire_serialization_uses_upstream_names() {
        let wire = MonitorEvent::Reset.to_wire();
        let json = serde_json::to_value(&wire).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"type": "RESET"}));
    }
}
