//! Per-connection subscription manager.
//!
//! Tracks which service IDs a WebSocket client is subscribed to and
//! provides server-side event filtering. Messages that concern no single
//! service (reorders, resets) reach every connection.

use std::collections::HashSet;

use crate::domain::{BusMessage, ServiceId};

/// Manages the set of service subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed service IDs. If `subscribe_all` is true, this set is ignored.
    service_ids: HashSet<ServiceId>,
    /// Whether the client subscribes to all services (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds service IDs to the subscription set. `"*"` enables the wildcard.
    pub fn subscribe(&mut self, ids: &[ServiceId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.service_ids.extend(ids.iter().cloned());
    }

    /// Removes service IDs from the subscription set. `"*"` clears the
    /// wildcard.
    pub fn unsubscribe(&mut self, ids: &[ServiceId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.service_ids.remove(id);
        }
    }

    /// Returns `true` if the given service matches the subscription filter.
    #[must_use]
    pub fn matches(&self, service_id: &ServiceId) -> bool {
        self.subscribe_all || self.service_ids.contains(service_id)
    }

    /// Decides whether `message` goes to this client.
    ///
    /// A rename of a subscribed service moves the subscription to the new id.
    pub fn admit(&mut self, message: &BusMessage) -> bool {
        let Some(id) = message.service_id() else {
            return true;
        };
        if !self.matches(id) {
            return false;
        }
        if let BusMessage::Applied { event, .. } = message
            && let Some(new_id) = event.renamed_to()
            && self.service_ids.remove(id)
        {
            self.service_ids.insert(new_id.clone());
        }
        true
    }

    /// Returns the number of explicitly subscribed service IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.service_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
