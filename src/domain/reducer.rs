//! The event applier: a pure `(state, event) -> state` transition.
//!
//! [`apply`] never mutates its input. It clones the (cheap, `Arc`-backed)
//! state, edits the copy, and hands back a new top-level value; records
//! the event does not touch are shared with the input. An event that
//! cannot be applied leaves the state unchanged and reports why through
//! [`Outcome::Ignored`], so the caller decides how loudly to log it.
//!
//! All references to services that no longer exist degrade to a no-op:
//! version updates routinely race with deletions on the transport.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{
    MonitorEvent, MonitorState, PartialServiceRecord, ServiceId, ServiceRecord, VersionChange,
};

/// Why an event was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Ignored {
    /// Ordering event without an `order` list.
    MissingOrder,
    /// Event without the `service_data` (or its `id`) it needs.
    MissingServiceData,
    /// Delete event without a target id.
    MissingTarget,
    /// The event names a service that is not tracked.
    UnknownService(ServiceId),
    /// Snapshot for a service the ordering list does not contain.
    NotInOrder(ServiceId),
    /// Creation of a service that already exists.
    AlreadyExists(ServiceId),
    /// Rename onto an id another service already uses.
    RenameCollision(ServiceId),
    /// A `VERSION` sub-kind this gateway does not know.
    UnknownVersionChange(String),
}

impl Ignored {
    /// Stable snake_case name of the reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingOrder => "missing_order",
            Self::MissingServiceData => "missing_service_data",
            Self::MissingTarget => "missing_target",
            Self::UnknownService(_) => "unknown_service",
            Self::NotInOrder(_) => "not_in_order",
            Self::AlreadyExists(_) => "already_exists",
            Self::RenameCollision(_) => "rename_collision",
            Self::UnknownVersionChange(_) => "unknown_version_change",
        }
    }
}

impl fmt::Display for Ignored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOrder => f.write_str("ordering event has no order list"),
            Self::MissingServiceData => f.write_str("event has no service data"),
            Self::MissingTarget => f.write_str("event has no target service"),
            Self::UnknownService(id) => write!(f, "service {id} does not exist"),
            Self::NotInOrder(id) => write!(f, "service {id} is not in the ordering list"),
            Self::AlreadyExists(id) => write!(f, "service {id} already exists"),
            Self::RenameCollision(id) => write!(f, "cannot rename onto existing service {id}"),
            Self::UnknownVersionChange(sub) => write!(f, "unknown version event {sub:?}"),
        }
    }
}

/// Whether an event changed the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event was applied.
    Applied,
    /// The event was a no-op.
    Ignored(Ignored),
}

impl Outcome {
    /// Returns `true` if the event was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Next state plus what happened.
#[derive(Debug, Clone)]
pub struct Transition {
    /// State after the event. Equal to the input when ignored.
    pub state: MonitorState,
    /// Whether the event was applied.
    pub outcome: Outcome,
}

/// Applies one event to `state`.
#[must_use]
pub fn apply(state: &MonitorState, event: &MonitorEvent) -> Transition {
    let mut next = state.clone();
    let result = match event {
        MonitorEvent::Reorder { order } => reorder(&mut next, order.as_deref()),
        MonitorEvent::SnapshotInit { data } => snapshot_init(&mut next, data.as_ref()),
        MonitorEvent::Version { change, data } => version(&mut next, *change, data.as_ref()),
        MonitorEvent::Create { data } => create(&mut next, data.as_ref()),
        MonitorEvent::Update { target, data } => update(&mut next, target, data.as_ref()),
        MonitorEvent::Delete { target } => delete(&mut next, target.as_ref()),
        MonitorEvent::Reset => {
            next.replace(Vec::new(), HashMap::new());
            Ok(())
        }
    };

    match result {
        Ok(()) => Transition {
            state: next,
            outcome: Outcome::Applied,
        },
        Err(reason) => Transition {
            state: state.clone(),
            outcome: Outcome::Ignored(reason),
        },
    }
}

fn reorder(state: &mut MonitorState, order: Option<&[ServiceId]>) -> Result<(), Ignored> {
    let order = order.ok_or(Ignored::MissingOrder)?;

    let mut seen = HashSet::with_capacity(order.len());
    let mut ids = Vec::with_capacity(order.len());
    let mut service = HashMap::with_capacity(order.len());
    for id in order {
        if !seen.insert(id) {
            continue;
        }
        let record = state.get(id.as_str()).map_or_else(
            || Arc::new(ServiceRecord::stub(id.clone())),
            Arc::clone,
        );
        ids.push(id.clone());
        service.insert(id.clone(), record);
    }

    state.replace(ids, service);
    Ok(())
}

fn snapshot_init(
    state: &mut MonitorState,
    data: Option<&PartialServiceRecord>,
) -> Result<(), Ignored> {
    let (id, data) = target_of(data)?;
    if !state.contains(id.as_str()) {
        return Err(Ignored::NotInOrder(id));
    }
    state.put(ServiceRecord::from_partial(id, data));
    Ok(())
}

fn version(
    state: &mut MonitorState,
    change: VersionChange,
    data: Option<&PartialServiceRecord>,
) -> Result<(), Ignored> {
    let (id, data) = target_of(data)?;
    let record = state
        .record_mut(id.as_str())
        .ok_or(Ignored::UnknownService(id))?;
    let incoming = data.status_or_default();
    let status = &mut record.status;

    match change {
        VersionChange::Query => {
            status.last_queried = incoming.last_queried;
        }
        VersionChange::NewCandidate => {
            status.latest_version = incoming.latest_version;
            status.latest_version_timestamp = incoming.latest_version_timestamp;
            // The check that found the release counts as a successful query.
            status.last_queried = incoming.latest_version_timestamp;
            keep_url(record, data);
        }
        VersionChange::DeployedUpdate => {
            // Deployed implies approved.
            status.approved_version.clone_from(&incoming.deployed_version);
            status.deployed_version = incoming.deployed_version;
            status.deployed_version_timestamp = incoming.deployed_version_timestamp;
            keep_url(record, data);
        }
        VersionChange::InitSnapshot => {
            status.deployed_version.clone_from(&incoming.latest_version);
            status.latest_version = incoming.latest_version;
            status.deployed_version_timestamp = incoming.latest_version_timestamp;
            status.latest_version_timestamp = incoming.latest_version_timestamp;
            status.last_queried = incoming.latest_version_timestamp;
            keep_url(record, data);
        }
        VersionChange::ActionAck => {
            status.approved_version = incoming.approved_version;
        }
    }
    Ok(())
}

fn keep_url(record: &mut ServiceRecord, data: &PartialServiceRecord) {
    if data.url.is_some() {
        record.url.clone_from(&data.url);
    }
}

fn create(state: &mut MonitorState, data: Option<&PartialServiceRecord>) -> Result<(), Ignored> {
    let (id, data) = target_of(data)?;
    if state.contains(id.as_str()) {
        return Err(Ignored::AlreadyExists(id));
    }
    state.push(ServiceRecord::from_partial(id, data));
    Ok(())
}

fn update(
    state: &mut MonitorState,
    target: &ServiceId,
    data: Option<&PartialServiceRecord>,
) -> Result<(), Ignored> {
    let data = data.ok_or(Ignored::MissingServiceData)?;
    let current = state
        .get(target.as_str())
        .ok_or_else(|| Ignored::UnknownService(target.clone()))?;

    let mut record = ServiceRecord::clone(current);
    record.merge(data);
    if record.id.is_empty() {
        record.id = target.clone();
    }

    if record.id == *target {
        state.put(record);
        return Ok(());
    }
    if state.contains(record.id.as_str()) {
        return Err(Ignored::RenameCollision(record.id));
    }
    if state.rename(target.as_str(), record) {
        Ok(())
    } else {
        Err(Ignored::UnknownService(target.clone()))
    }
}

fn delete(state: &mut MonitorState, target: Option<&ServiceId>) -> Result<(), Ignored> {
    let target = target.ok_or(Ignored::MissingTarget)?;
    state
        .remove(target.as_str())
        .map(|_| ())
        .ok_or_else(|| Ignored::UnknownService(target.clone()))
}

/// Extracts the non-empty id an event's service data targets.
fn target_of(
    data: Option<&PartialServiceRecord>,
) -> Result<(ServiceId, &PartialServiceRecord), Ignored> {
    let data = data.ok_or(Ignored::MissingServiceData)?;
    match &data.id {
        Some(id) if !id.is_empty() => Ok((id.clone(), data)),
        _ => Err(Ignored::MissingServiceData),
    }
}
