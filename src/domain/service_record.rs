//! Service records: the canonical per-service state held by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ServiceId;

/// Version tracking state of a single service.
///
/// Every field is independently nullable. Events update individual fields
/// and must never reset the ones they do not carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Version cleared for deployment/notification. Equals `SKIP_<latest>`
    /// when the latest release was explicitly skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_version: Option<String>,

    /// Version currently live for this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_version: Option<String>,

    /// When `deployed_version` was first seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_version_timestamp: Option<DateTime<Utc>>,

    /// Newest version discovered upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,

    /// When `latest_version` was first seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version_timestamp: Option<DateTime<Utc>>,

    /// Time of the last successful upstream query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_queried: Option<DateTime<Utc>>,
}

impl ServiceStatus {
    /// Overlays every field `other` defines onto `self`.
    pub fn merge(&mut self, other: &Self) {
        merge_field(&mut self.approved_version, &other.approved_version);
        merge_field(&mut self.deployed_version, &other.deployed_version);
        merge_field(
            &mut self.deployed_version_timestamp,
            &other.deployed_version_timestamp,
        );
        merge_field(&mut self.latest_version, &other.latest_version);
        merge_field(
            &mut self.latest_version_timestamp,
            &other.latest_version_timestamp,
        );
        merge_field(&mut self.last_queried, &other.last_queried);
    }
}

/// Canonical state of one monitored service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Store key; kept equal to the key the record is stored under.
    pub id: ServiceId,

    /// Whether upstream is actively polling this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Lookup type (`"github"`, `"url"`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,

    /// Link to the release source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Icon URL or name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Target of a click on the icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link_to: Option<String>,

    /// Whether a deployed-version lookup is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_deployed_version: Option<bool>,

    /// Commands run on approval. Opaque to the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<serde_json::Value>>,

    /// WebHooks sent on approval. Opaque to the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Vec<serde_json::Value>>,

    /// Version tracking state.
    #[serde(default)]
    pub status: ServiceStatus,

    /// `true` between stub creation and the first data for this service.
    #[serde(default)]
    pub loading: bool,
}

impl ServiceRecord {
    /// Placeholder for an id announced by an ordering event before its data.
    #[must_use]
    pub fn stub(id: ServiceId) -> Self {
        Self {
            id,
            active: None,
            service_type: None,
            url: None,
            icon: None,
            icon_link_to: None,
            has_deployed_version: None,
            command: None,
            webhook: None,
            status: ServiceStatus::default(),
            loading: true,
        }
    }

    /// Builds a fully loaded record from event data, keyed by `id`.
    ///
    /// `partial.id` is ignored in favour of `id` so the record id always
    /// matches its store key.
    #[must_use]
    pub fn from_partial(id: ServiceId, partial: &PartialServiceRecord) -> Self {
        Self {
            id,
            active: partial.active,
            service_type: partial.service_type.clone(),
            url: partial.url.clone(),
            icon: partial.icon.clone(),
            icon_link_to: partial.icon_link_to.clone(),
            has_deployed_version: partial.has_deployed_version,
            command: partial.command.clone(),
            webhook: partial.webhook.clone(),
            status: partial.status.clone().unwrap_or_default(),
            loading: false,
        }
    }

    /// Field-by-field merge of an edit onto this record.
    ///
    /// A field is only replaced when `partial` defines it. `icon` and
    /// `icon_link_to` also treat the empty string as "unchanged". The id is
    /// merged too; callers detect a rename by comparing ids afterwards.
    pub fn merge(&mut self, partial: &PartialServiceRecord) {
        if let Some(id) = &partial.id {
            self.id = id.clone();
        }
        merge_field(&mut self.active, &partial.active);
        merge_field(&mut self.service_type, &partial.service_type);
        merge_field(&mut self.url, &partial.url);
        merge_non_empty(&mut self.icon, &partial.icon);
        merge_non_empty(&mut self.icon_link_to, &partial.icon_link_to);
        merge_field(&mut self.has_deployed_version, &partial.has_deployed_version);
        merge_field(&mut self.command, &partial.command);
        merge_field(&mut self.webhook, &partial.webhook);
        if let Some(status) = &partial.status {
            self.status.merge(status);
        }
        self.loading = false;
    }

    /// Returns `true` if approving this service would send WebHooks.
    #[must_use]
    pub fn has_webhooks(&self) -> bool {
        self.webhook.as_ref().is_some_and(|hooks| !hooks.is_empty())
    }

    /// Whether the "deployed version" display is backed by a real lookup.
    #[must_use]
    pub fn shows_deployed_version(&self) -> bool {
        self.has_deployed_version.unwrap_or(false)
    }

    /// Freshness of the version data, for the "last queried" footer.
    #[must_use]
    pub fn freshness(&self) -> QueryFreshness {
        match (self.status.last_queried, self.loading) {
            (Some(at), _) => QueryFreshness::Queried { at },
            (None, true) => QueryFreshness::Loading,
            (None, false) => QueryFreshness::NeverQueried,
        }
    }
}

/// How recent the version data of a service is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueryFreshness {
    /// Upstream was last queried successfully at `at`.
    Queried {
        /// Time of the last successful query.
        at: DateTime<Utc>,
    },
    /// No data has arrived yet for this service.
    Loading,
    /// Data arrived but upstream has never been queried successfully.
    NeverQueried,
}

/// Service data as carried by an inbound event.
///
/// Every field is optional; which ones are meaningful depends on the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialServiceRecord {
    /// Service identifier (new identifier for a rename).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServiceId>,
    /// See [`ServiceRecord::active`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// See [`ServiceRecord::service_type`].
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// See [`ServiceRecord::url`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// See [`ServiceRecord::icon`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// See [`ServiceRecord::icon_link_to`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link_to: Option<String>,
    /// See [`ServiceRecord::has_deployed_version`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_deployed_version: Option<bool>,
    /// See [`ServiceRecord::command`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<serde_json::Value>>,
    /// See [`ServiceRecord::webhook`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Vec<serde_json::Value>>,
    /// Status fields carried by the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
}

impl PartialServiceRecord {
    /// Status carried by the event, or an all-empty one.
    #[must_use]
    pub fn status_or_default(&self) -> ServiceStatus {
        self.status.clone().unwrap_or_default()
    }
}

impl From<&ServiceRecord> for PartialServiceRecord {
    fn from(record: &ServiceRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            active: record.active,
            service_type: record.service_type.clone(),
            url: record.url.clone(),
            icon: record.icon.clone(),
            icon_link_to: record.icon_link_to.clone(),
            has_deployed_version: record.has_deployed_version,
            command: record.command.clone(),
            webhook: record.webhook.clone(),
            status: Some(record.status.clone()),
        }
    }
}

fn merge_field<T: Clone>(target: &mut Option<T>, incoming: &Option<T>) {
    if incoming.is_some() {
        target.clone_from(incoming);
    }
}

fn merge_non_empty(target: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming
        && !value.is_empty()
    {
        *target = Some(value.clone());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }

    fn loaded(id: &str) -> ServiceRecord {
        let partial = PartialServiceRecord {
            url: Some("https://example.com".to_string()),
            icon: Some("icon.png".to_string()),
            status: Some(ServiceStatus {
                deployed_version: Some("1.0".to_string()),
                latest_version: Some("1.1".to_string()),
                ..ServiceStatus::default()
            }),
            ..PartialServiceRecord::default()
        };
        ServiceRecord::from_partial(ServiceId::from(id), &partial)
    }

    #[test]
    fn stub_is_loading_with_empty_status() {
        let stub = ServiceRecord::stub(ServiceId::from("a"));
        assert!(stub.loading);
        assert_eq!(stub.status, ServiceStatus::default());
        assert_eq!(stub.freshness(), QueryFreshness::Loading);
    }

    #[test]
    fn from_partial_uses_store_key_and_clears_loading() {
        let partial = PartialServiceRecord {
            id: Some(ServiceId::from("other")),
            ..PartialServiceRecord::default()
        };
        let record = ServiceRecord::from_partial(ServiceId::from("a"), &partial);
        assert_eq!(record.id.as_str(), "a");
        assert!(!record.loading);
        assert_eq!(record.freshness(), QueryFreshness::NeverQueried);
    }

    #[test]
    fn merge_keeps_undefined_fields() {
        let mut record = loaded("a");
        record.merge(&PartialServiceRecord {
            active: Some(false),
            status: Some(ServiceStatus {
                approved_version: Some("1.1".to_string()),
                ..ServiceStatus::default()
            }),
            ..PartialServiceRecord::default()
        });
        assert_eq!(record.active, Some(false));
        assert_eq!(record.url.as_deref(), Some("https://example.com"));
        assert_eq!(record.status.deployed_version.as_deref(), Some("1.0"));
        assert_eq!(record.status.latest_version.as_deref(), Some("1.1"));
        assert_eq!(record.status.approved_version.as_deref(), Some("1.1"));
    }

    #[test]
    fn merge_ignores_empty_icon() {
        let mut record = loaded("a");
        record.merge(&PartialServiceRecord {
            icon: Some(String::new()),
            icon_link_to: Some("https://link".to_string()),
            ..PartialServiceRecord::default()
        });
        assert_eq!(record.icon.as_deref(), Some("icon.png"));
        assert_eq!(record.icon_link_to.as_deref(), Some("https://link"));
    }

    #[test]
    fn webhooks_require_non_empty_list() {
        let mut record = loaded("a");
        assert!(!record.has_webhooks());
        record.webhook = Some(vec![]);
        assert!(!record.has_webhooks());
        record.webhook = Some(vec![serde_json::json!({"id": "wh"})]);
        assert!(record.has_webhooks());
    }

    #[test]
    fn freshness_prefers_last_queried() {
        let mut record = ServiceRecord::stub(ServiceId::from("a"));
        record.status.last_queried = Some(ts(1_700_000_000));
        assert_eq!(
            record.freshness(),
            QueryFreshness::Queried {
                at: ts(1_700_000_000)
            }
        );
    }

    #[test]
    fn deserializes_wire_record() {
        let json = r#"{
            "id": "argus",
            "type": "github",
            "url": "release-argus/Argus",
            "webhook": [{"id": "w1"}],
            "status": {
                "deployed_version": "0.11.0",
                "last_queried": "2023-01-02T03:04:05Z"
            }
        }"#;
        let Ok(partial) = serde_json::from_str::<PartialServiceRecord>(json) else {
            panic!("wire record should parse");
        };
        assert_eq!(partial.service_type.as_deref(), Some("github"));
        let status = partial.status_or_default();
        assert_eq!(status.deployed_version.as_deref(), Some("0.11.0"));
        assert!(status.last_queried.is_some());
        assert!(status.latest_version.is_none());
    }
}
