//! The service record store and ordering list, held as one unit.
//!
//! [`MonitorState`] pairs an explicit ordering list of [`ServiceId`]s with
//! a map of [`ServiceRecord`]s keyed by the same ids. Both halves live
//! behind [`Arc`]s and every record is individually reference counted, so
//! cloning a state is cheap and a transition only copies what it touches.
//!
//! # Invariant
//!
//! Every id in the ordering list has a record and every record is in the
//! ordering list exactly once. The read API is public; mutation is
//! reserved to the reducer, which restores the invariant before returning.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use super::{ServiceId, ServiceRecord};

/// Ordering list plus service record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorState {
    order: Arc<Vec<ServiceId>>,
    service: Arc<HashMap<ServiceId, Arc<ServiceRecord>>>,
}

impl MonitorState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Display order of all services.
    #[must_use]
    pub fn order(&self) -> &[ServiceId] {
        &self.order
    }

    /// Returns the record stored under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<ServiceRecord>> {
        self.service.get(id)
    }

    /// Returns `true` if a record is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.service.contains_key(id)
    }

    /// Position of `id` in the ordering list.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|candidate| candidate.as_str() == id)
    }

    /// Number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.service.len()
    }

    /// Returns `true` if no services are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.service.is_empty()
    }

    /// Records in display order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &Arc<ServiceRecord>> {
        self.order.iter().filter_map(|id| self.service.get(id))
    }

    /// Checks the ordering list and the store describe the same services.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.order.len());
        self.order.len() == self.service.len()
            && self
                .order
                .iter()
                .all(|id| seen.insert(id) && self.service.get(id).is_some_and(|r| r.id == *id))
    }

    /// Returns `true` if both states hold the very same record for `id`.
    ///
    /// Observers use this to skip re-rendering untouched services.
    #[must_use]
    pub fn shares_record(&self, other: &Self, id: &str) -> bool {
        match (self.service.get(id), other.service.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Replaces both halves wholesale.
    pub(crate) fn replace(
        &mut self,
        order: Vec<ServiceId>,
        service: HashMap<ServiceId, Arc<ServiceRecord>>,
    ) {
        self.order = Arc::new(order);
        self.service = Arc::new(service);
    }

    /// Mutable access to one record, copying it only if it is shared.
    pub(crate) fn record_mut(&mut self, id: &str) -> Option<&mut ServiceRecord> {
        if !self.service.contains_key(id) {
            return None;
        }
        Arc::make_mut(&mut self.service)
            .get_mut(id)
            .map(Arc::make_mut)
    }

    /// Stores `record` under its id without touching the ordering list.
    pub(crate) fn put(&mut self, record: ServiceRecord) {
        Arc::make_mut(&mut self.service).insert(record.id.clone(), Arc::new(record));
    }

    /// Stores `record` and appends its id to the ordering list.
    pub(crate) fn push(&mut self, record: ServiceRecord) {
        Arc::make_mut(&mut self.order).push(record.id.clone());
        self.put(record);
    }

    /// Moves the record at `old` to `record.id`, keeping its list position.
    ///
    /// Returns `false` and leaves the state untouched when `old` is unknown.
    pub(crate) fn rename(&mut self, old: &str, record: ServiceRecord) -> bool {
        let Some(index) = self.position(old) else {
            return false;
        };
        let new_id = record.id.clone();
        let service = Arc::make_mut(&mut self.service);
        service.remove(old);
        service.insert(new_id.clone(), Arc::new(record));
        if let Some(slot) = Arc::make_mut(&mut self.order).get_mut(index) {
            *slot = new_id;
        }
        true
    }

    /// Removes `id` from both the ordering list and the store.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Arc<ServiceRecord>> {
        let index = self.position(id)?;
        Arc::make_mut(&mut self.order).remove(index);
        Arc::make_mut(&mut self.service).remove(id)
    }
}
