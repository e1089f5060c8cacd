//! DTOs for event ingestion.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Outcome, Receipt};

/// Why an ingested event left the state unchanged.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IgnoredDto {
    /// Machine-readable reason, e.g. `unknown_service`.
    pub reason: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Response to `POST /api/v1/events`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestResponse {
    /// Number of events applied so far.
    pub sequence: u64,
    /// Event label, e.g. `version_new`.
    pub event: String,
    /// Whether the state changed.
    pub applied: bool,
    /// Present when the event was a no-op.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<IgnoredDto>,
}

impl From<&Receipt> for IngestResponse {
    fn from(receipt: &Receipt) -> Self {
        let ignored = match &receipt.outcome {
            Outcome::Applied => None,
            Outcome::Ignored(reason) => Some(IgnoredDto {
                reason: reason.code().to_string(),
                message: reason.to_string(),
            }),
        };
        Self {
            sequence: receipt.sequence,
            event: receipt.kind.to_string(),
            applied: receipt.outcome.is_applied(),
            ignored,
        }
    }
}
