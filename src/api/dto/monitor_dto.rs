//! DTOs for the monitor view: services, status, flags and snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::{MonitorState, QueryFreshness, ServiceRecord, ServiceStatus, UpdateFlags};

/// Version tracking fields of a service.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusDto {
    /// Approved version, or `SKIP_<latest>` when skipped.
    pub approved_version: Option<String>,
    /// Version currently deployed.
    pub deployed_version: Option<String>,
    /// When the deployed version was first seen.
    pub deployed_version_timestamp: Option<DateTime<Utc>>,
    /// Newest version discovered upstream.
    pub latest_version: Option<String>,
    /// When the latest version was first seen.
    pub latest_version_timestamp: Option<DateTime<Utc>>,
    /// Last successful upstream query.
    pub last_queried: Option<DateTime<Utc>>,
}

impl From<&ServiceStatus> for StatusDto {
    fn from(status: &ServiceStatus) -> Self {
        Self {
            approved_version: status.approved_version.clone(),
            deployed_version: status.deployed_version.clone(),
            deployed_version_timestamp: status.deployed_version_timestamp,
            latest_version: status.latest_version.clone(),
            latest_version_timestamp: status.latest_version_timestamp,
            last_queried: status.last_queried,
        }
    }
}

/// Display and action flags, derived when the service is read.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct FlagsDto {
    /// Deployed version missing or update pending.
    pub warning: bool,
    /// Latest differs from deployed.
    pub update_available: bool,
    /// Latest release was skipped.
    pub update_skipped: bool,
    /// Latest release is approved.
    pub update_approved: bool,
    /// "Send" is offered.
    pub send_enabled: bool,
    /// "Resend" is offered.
    pub resend_enabled: bool,
    /// "Skip" is offered.
    pub skip_enabled: bool,
}

impl From<UpdateFlags> for FlagsDto {
    fn from(flags: UpdateFlags) -> Self {
        Self {
            warning: flags.warning,
            update_available: flags.update_available,
            update_skipped: flags.update_skipped,
            update_approved: flags.update_approved,
            send_enabled: flags.send_enabled,
            resend_enabled: flags.resend_enabled,
            skip_enabled: flags.skip_enabled,
        }
    }
}

/// How recent the version data is.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FreshnessDto {
    /// `queried`, `loading` or `never_queried`.
    pub state: String,
    /// Time of the last query when `state` is `queried`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

impl From<QueryFreshness> for FreshnessDto {
    fn from(freshness: QueryFreshness) -> Self {
        let (state, at) = match freshness {
            QueryFreshness::Queried { at } => ("queried", Some(at)),
            QueryFreshness::Loading => ("loading", None),
            QueryFreshness::NeverQueried => ("never_queried", None),
        };
        Self {
            state: state.to_string(),
            at,
        }
    }
}

/// One service as shown on the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceDto {
    /// Service identifier.
    pub id: String,
    /// Position in the display order, if listed.
    pub position: Option<usize>,
    /// Whether upstream polls this service.
    pub active: Option<bool>,
    /// Lookup type.
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    /// Link to the release source.
    pub url: Option<String>,
    /// Icon URL or name.
    pub icon: Option<String>,
    /// Icon click target.
    pub icon_link_to: Option<String>,
    /// Whether the deployed version is shown.
    pub shows_deployed_version: bool,
    /// Commands run on approval.
    #[schema(value_type = Option<Vec<Object>>)]
    pub command: Option<Vec<serde_json::Value>>,
    /// WebHooks sent on approval.
    #[schema(value_type = Option<Vec<Object>>)]
    pub webhook: Option<Vec<serde_json::Value>>,
    /// Version tracking fields.
    pub status: StatusDto,
    /// Waiting for the first data.
    pub loading: bool,
    /// Derived flags.
    pub flags: FlagsDto,
    /// Freshness of the version data.
    pub freshness: FreshnessDto,
}

impl ServiceDto {
    /// Builds the view of `record` at `position`.
    #[must_use]
    pub fn new(record: &ServiceRecord, position: Option<usize>) -> Self {
        Self {
            id: record.id.to_string(),
            position,
            active: record.active,
            service_type: record.service_type.clone(),
            url: record.url.clone(),
            icon: record.icon.clone(),
            icon_link_to: record.icon_link_to.clone(),
            shows_deployed_version: record.shows_deployed_version(),
            command: record.command.clone(),
            webhook: record.webhook.clone(),
            status: StatusDto::from(&record.status),
            loading: record.loading,
            flags: FlagsDto::from(record.flags()),
            freshness: FreshnessDto::from(record.freshness()),
        }
    }
}

/// Full monitor snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonitorSnapshotResponse {
    /// Sequence of the last event reflected in this snapshot.
    pub sequence: u64,
    /// Display order of the services.
    pub order: Vec<String>,
    /// Services keyed by id.
    pub service: HashMap<String, ServiceDto>,
}

impl MonitorSnapshotResponse {
    /// Renders `state` as of `sequence`.
    #[must_use]
    pub fn new(sequence: u64, state: &MonitorState) -> Self {
        let order = state.order().iter().map(ToString::to_string).collect();
        let service = state
            .order()
            .iter()
            .enumerate()
            .filter_map(|(position, id)| {
                state
                    .get(id.as_str())
                    .map(|record| (id.to_string(), ServiceDto::new(record, Some(position))))
            })
            .collect();
        Self {
            sequence,
            order,
            service,
        }
    }
}

/// Paginated list of services in display order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceListResponse {
    /// Services on this page.
    pub data: Vec<ServiceDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
