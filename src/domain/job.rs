//! Job entity: a unit of requested service work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoPoint;
use super::ids::JobId;
use crate::error::DispatchError;

/// Lifecycle status of a [`Job`].
///
/// Terminal states are `Completed` → `Paid` or `Cancelled`; jobs are
/// never deleted, only status-transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created by intake, no active assignment yet.
    Pending,
    /// At least one open offer is out.
    Offered,
    /// A pro accepted; work is scheduled or in progress.
    Accepted,
    /// Work is done; payout has been (or is being) settled.
    Completed,
    /// Payout has been paid out to the pro(s).
    Paid,
    /// Administratively cancelled.
    Cancelled,
}

impl JobStatus {
    /// Stable string form used in the store and API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Offered => "offered",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the stable string form back into a status.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] for unrecognized values,
    /// which indicates store corruption rather than caller error.
    pub fn parse(s: &str) -> Result<Self, DispatchError> {
        match s {
            "pending" => Ok(Self::Pending),
            "offered" => Ok(Self::Offered),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DispatchError::Internal(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

/// Free-form job metadata captured at intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Precomputed payout estimate, used when a job has no line items.
    #[serde(default)]
    pub estimated_payout: Option<f64>,
    /// Reference to the originating order in the source system.
    #[serde(default)]
    pub source_order_ref: Option<String>,
    /// Anything else the intake process attached.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// A unit of requested service work with a location and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Service variant code (e.g. `"BASE"`, `"BYO"`, `"H2S"`).
    pub variant_code: String,
    /// Customer contact name.
    pub customer_name: String,
    /// Service address as entered by the customer.
    pub address: String,
    /// Geocoded coordinates; `None` until geocoding succeeds.
    pub location: Option<GeoPoint>,
    /// Intake timestamp.
    pub created_at: DateTime<Utc>,
    /// Free-form intake metadata.
    pub metadata: JobMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Offered,
            JobStatus::Accepted,
            JobStatus::Completed,
            JobStatus::Paid,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()).ok(), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_internal_error() {
        assert!(JobStatus::parse("archived").is_err());
    }
}
