//! Type-safe service identifier.
//!
//! [`ServiceId`] is a newtype wrapper around the upstream service name so
//! that identifiers cannot be confused with versions, URLs or other
//! free-form strings carried by the same events.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a monitored service.
///
/// Chosen by the operator in the upstream configuration. Used as the key
/// of the service record store, as the element type of the ordering list,
/// and as the WebSocket subscription target. Unlike most keys it is not
/// immutable: an edit event may rename a service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a `ServiceId` from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty identifier, which upstream never assigns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_name() {
        let id = ServiceId::from("release-argus/Argus");
        assert_eq!(format!("{id}"), "release-argus/Argus");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ServiceId::from("nginx");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"nginx\"");

        let Ok(back) = serde_json::from_str::<ServiceId>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, id);
    }

    #[test]
    fn lookup_by_str_in_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ServiceId::from("a"), 1);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), None);
    }

    #[test]
    fn empty_detection() {
        assert!(ServiceId::from("").is_empty());
        assert!(!ServiceId::new("x").is_empty());
    }
}
