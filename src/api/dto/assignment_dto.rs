//! Assignment and ledger DTOs shared by the offer and assignment endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Assignment, LedgerEntry};

/// Wire form of an [`Assignment`].
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentDto {
    /// Assignment identifier.
    pub id: uuid::Uuid,
    /// Job being worked.
    pub job_id: uuid::Uuid,
    /// Pro holding the assignment.
    pub pro_id: uuid::Uuid,
    /// Current state as a snake_case string.
    pub state: String,
    /// Distance at offer time, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    /// Offer timestamp.
    pub offered_at: DateTime<Utc>,
    /// Acceptance timestamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    /// Decline/closure timestamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declined_at: Option<DateTime<Utc>>,
    /// Completion timestamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Assignment> for AssignmentDto {
    fn from(a: Assignment) -> Self {
        Self {
            id: *a.id.as_uuid(),
            job_id: *a.job_id.as_uuid(),
            pro_id: *a.pro_id.as_uuid(),
            state: a.state.as_str().to_string(),
            distance_miles: a.distance_miles,
            offered_at: a.offered_at,
            accepted_at: a.accepted_at,
            declined_at: a.declined_at,
            completed_at: a.completed_at,
        }
    }
}

/// Wire form of a [`LedgerEntry`].
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerEntryDto {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Pro receiving the amount.
    pub pro_id: uuid::Uuid,
    /// Job the payout settles.
    pub job_id: uuid::Uuid,
    /// Payout amount in dollars.
    pub amount: f64,
    /// Settlement state as a snake_case string.
    pub state: String,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
    /// Human-readable note.
    pub note: String,
}

impl From<LedgerEntry> for LedgerEntryDto {
    fn from(e: LedgerEntry) -> Self {
        Self {
            id: *e.id.as_uuid(),
            pro_id: *e.pro_id.as_uuid(),
            job_id: *e.job_id.as_uuid(),
            amount: e.amount,
            state: e.state.as_str().to_string(),
            created_at: e.created_at,
            note: e.note,
        }
    }
}

/// Request body for `POST /assignments/{id}/respond`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// Either `"accept"` or `"decline"`.
    pub action: String,
}

/// Response body for `POST /assignments/{id}/complete`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletionResponse {
    /// The completed assignment.
    pub assignment: AssignmentDto,
    /// Ledger entries settled against the job.
    pub ledger_entries: Vec<LedgerEntryDto>,
}
