//! Update-availability classification of a single service.
//!
//! Everything here is derived from a [`ServiceRecord`] on demand. Nothing
//! is cached: callers recompute on every observation so the flags can
//! never drift from the status fields they come from.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ServiceRecord, ServiceStatus};

/// Prefix upstream writes into `approved_version` for a skipped release.
pub const SKIP_PREFIX: &str = "SKIP_";

/// Returns `true` when latest and deployed are both known and differ.
#[must_use]
pub fn update_available(status: &ServiceStatus) -> bool {
    match (&status.latest_version, &status.deployed_version) {
        (Some(latest), Some(deployed)) => latest != deployed,
        _ => false,
    }
}

/// Returns `true` when the latest release was explicitly skipped.
#[must_use]
pub fn update_skipped(status: &ServiceStatus) -> bool {
    match (&status.latest_version, &status.approved_version) {
        (Some(latest), Some(approved)) => approved
            .strip_prefix(SKIP_PREFIX)
            .is_some_and(|skipped| skipped == latest),
        _ => false,
    }
}

/// Derived display and action flags for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UpdateFlags {
    /// No usable baseline, or an update awaits a decision.
    pub warning: bool,
    /// Input: latest differs from deployed.
    pub update_available: bool,
    /// Input: the latest release was skipped.
    pub update_skipped: bool,
    /// Latest is known and equals the approved version.
    pub update_approved: bool,
    /// "Send" (approve) is offered.
    pub send_enabled: bool,
    /// "Resend" replaces "send" once approved.
    pub resend_enabled: bool,
    /// "Skip" is offered.
    pub skip_enabled: bool,
}

/// Classifies `record` given the availability inputs.
#[must_use]
pub fn classify(
    record: &ServiceRecord,
    update_available: bool,
    update_skipped: bool,
) -> UpdateFlags {
    let status = &record.status;
    let pending = update_available && !update_skipped;

    let warning = status.deployed_version.as_deref().is_none_or(str::is_empty) || pending;
    let update_approved = status
        .latest_version
        .as_ref()
        .is_some_and(|latest| status.approved_version.as_ref() == Some(latest));

    let actionable = record.has_webhooks() && !record.loading;

    UpdateFlags {
        warning,
        update_available,
        update_skipped,
        update_approved,
        send_enabled: actionable && !update_approved,
        resend_enabled: actionable && update_approved,
        skip_enabled: actionable && pending && !update_approved,
    }
}

impl ServiceRecord {
    /// Classifies this record from its own status fields.
    #[must_use]
    pub fn flags(&self) -> UpdateFlags {
        classify(
            self,
            update_available(&self.status),
            update_skipped(&self.status),
        )
    }
}

/// Approval decisions a dashboard user can take on a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Approve the latest release and run its actions.
    Send,
    /// Run the actions of an already approved release again.
    Resend,
    /// Mark the latest release as intentionally not approved.
    Skip,
}

impl ApprovalAction {
    /// Returns `true` if `flags` currently offers this action.
    #[must_use]
    pub const fn is_permitted(self, flags: &UpdateFlags) -> bool {
        match self {
            Self::Send => flags.send_enabled,
            Self::Resend => flags.resend_enabled,
            Self::Skip => flags.skip_enabled,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Resend => "resend",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ServiceId;

    fn record(
        latest: Option<&str>,
        deployed: Option<&str>,
        approved: Option<&str>,
    ) -> ServiceRecord {
        let mut record = ServiceRecord::stub(ServiceId::from("svc"));
        record.loading = false;
        record.webhook = Some(vec![serde_json::json!({"id": "hook"})]);
        record.status = ServiceStatus {
            latest_version: latest.map(str::to_string),
            deployed_version: deployed.map(str::to_string),
            approved_version: approved.map(str::to_string),
            ..ServiceStatus::default()
        };
        record
    }

    #[test]
    fn availability_needs_both_versions() {
        assert!(update_available(&record(Some("2"), Some("1"), None).status));
        assert!(!update_available(&record(Some("2"), Some("2"), None).status));
        assert!(!update_available(&record(Some("2"), None, None).status));
        assert!(!update_available(&record(None, Some("1"), None).status));
    }

    #[test]
    fn skipped_matches_skip_prefix_of_latest() {
        assert!(update_skipped(&record(Some("2"), Some("1"), Some("SKIP_2")).status));
        assert!(!update_skipped(&record(Some("3"), Some("1"), Some("SKIP_2")).status));
        assert!(!update_skipped(&record(Some("2"), Some("1"), Some("2")).status));
    }

    #[test]
    fn missing_or_empty_deployed_is_warning() {
        assert!(record(Some("2"), None, None).flags().warning);
        assert!(record(Some("2"), Some(""), None).flags().warning);
        assert!(!record(Some("2"), Some("2"), None).flags().warning);
    }

    #[test]
    fn pending_update_is_warning_unless_skipped() {
        assert!(record(Some("2"), Some("1"), None).flags().warning);
        assert!(!record(Some("2"), Some("1"), Some("SKIP_2")).flags().warning);
    }

    #[test]
    fn pending_update_offers_send_and_skip() {
        let flags = record(Some("2"), Some("1"), None).flags();
        assert!(flags.update_available);
        assert!(!flags.update_approved);
        assert!(flags.send_enabled);
        assert!(flags.skip_enabled);
        assert!(!flags.resend_enabled);
    }

    #[test]
    fn approved_update_offers_resend_only() {
        let flags = record(Some("2"), Some("1"), Some("2")).flags();
        assert!(flags.update_approved);
        assert!(flags.resend_enabled);
        assert!(!flags.send_enabled);
        assert!(!flags.skip_enabled);
    }

    #[test]
    fn skipped_update_can_still_be_sent() {
        let flags = record(Some("2"), Some("1"), Some("SKIP_2")).flags();
        assert!(flags.update_skipped);
        assert!(flags.send_enabled);
        assert!(!flags.skip_enabled);
    }

    #[test]
    fn loading_disables_every_action() {
        let mut r = record(Some("2"), Some("1"), None);
        r.loading = true;
        let flags = r.flags();
        assert!(!flags.send_enabled && !flags.resend_enabled && !flags.skip_enabled);
    }

    #[test]
    fn no_webhooks_disables_every_action() {
        let mut r = record(Some("2"), Some("1"), Some("2"));
        r.webhook = None;
        let flags = r.flags();
        assert!(flags.update_approved);
        assert!(!flags.send_enabled && !flags.resend_enabled && !flags.skip_enabled);
    }

    #[test]
    fn unknown_latest_is_never_approved() {
        let flags = record(None, Some("1"), None).flags();
        assert!(!flags.update_approved);
    }

    #[test]
    fn action_permission_follows_flags() {
        let flags = record(Some("2"), Some("1"), None).flags();
        assert!(ApprovalAction::Send.is_permitted(&flags));
        assert!(ApprovalAction::Skip.is_permitted(&flags));
        assert!(!ApprovalAction::Resend.is_permitted(&flags));
    }

    #[test]
    fn action_serde_names() {
        let json = serde_json::to_string(&ApprovalAction::Resend).unwrap_or_default();
        assert_eq!(json, "\"resend\"");
        let Ok(action) = serde_json::from_str::<ApprovalAction>("\"skip\"") else {
            panic!("skip should parse");
        };
        assert_eq!(action, ApprovalAction::Skip);
    }
}
