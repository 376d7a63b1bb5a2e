//! Reconciliation sweep DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::ReconcileReport;

/// Request body for `POST /reconcile`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconcileRequest {
    /// `"all"` (default) or a pro UUID to limit the sweep.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Response body for `POST /reconcile`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    /// Completed assignments examined.
    pub scanned: u64,
    /// Ledger entries written by this sweep.
    pub created: u64,
    /// Shares skipped (already settled or not positive).
    pub skipped: u64,
    /// Per-row failures the sweep continued past.
    pub errors: u64,
}

impl From<ReconcileReport> for ReconcileResponse {
    fn from(r: ReconcileReport) -> Self {
        Self {
            scanned: r.scanned,
            created: r.created,
            skipped: r.skipped,
            errors: r.errors,
        }
    }
}
