//! Ledger entries: immutable payout records.
//!
//! For a given (job, pro) pair at most one job-payout entry should
//! exist. The store does not enforce this natively everywhere — the
//! existence check in the reconciler and the settlement path is the
//! guard (the PostgreSQL schema adds a unique index on top).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, LedgerEntryId, ProId};
use crate::error::DispatchError;

/// Settlement state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerState {
    /// Recorded, awaiting approval.
    Pending,
    /// Approved for payout.
    Approved,
    /// Paid out.
    Paid,
}

impl LedgerState {
    /// Stable string form used in the store and API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    /// Parses the stable string form back into a state.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] for unrecognized values.
    pub fn parse(s: &str) -> Result<Self, DispatchError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            other => Err(DispatchError::Internal(format!(
                "unknown ledger state: {other}"
            ))),
        }
    }
}

/// An immutable monetary record for one (job, pro) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: LedgerEntryId,
    /// Pro receiving the amount.
    pub pro_id: ProId,
    /// Job the payout settles.
    pub job_id: JobId,
    /// Payout amount in dollars, rounded to cents.
    pub amount: f64,
    /// Settlement state.
    pub state: LedgerState,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// Human-readable note (e.g. settlement vs. reconciler backfill).
    pub note: String,
}

impl LedgerEntry {
    /// Creates an `approved` job-payout entry.
    #[must_use]
    pub fn approved(pro_id: ProId, job_id: JobId, amount: f64, note: &str) -> Self {
        Self {
            id: LedgerEntryId::new(),
            pro_id,
            job_id,
            amount,
            state: LedgerState::Approved,
            created_at: Utc::now(),
            note: note.to_string(),
        }
    }
}
