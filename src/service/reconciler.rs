//! Ledger reconciler: backfills payout entries the settlement path missed.
//!
//! Settlement runs inline when an assignment completes, but a crash or
//! store outage between the state write and the ledger write can leave a
//! completed assignment with no payout. The reconciler sweeps completed
//! assignments and writes the missing entries using the exact same
//! payout calculation, so a backfilled amount never differs from what
//! inline settlement would have produced.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::payout::{PayoutConfig, calculate_payout};
use crate::domain::{Assignment, DispatchEvent, EventBus, JobId, LedgerEntry, ProId};
use crate::error::DispatchError;
use crate::persistence::Store;

/// Which completed assignments a sweep covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileScope {
    /// Every completed assignment.
    All,
    /// Completed assignments held by one pro.
    Pro(ProId),
}

/// Outcome counts for one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Completed assignments examined.
    pub scanned: u64,
    /// Ledger entries written by this sweep.
    pub created: u64,
    /// Shares skipped: entry already present or amount not positive.
    ///
    /// Counted per share, not per assignment: a team-split assignment
    /// contributes up to two skips, so `scanned` does not necessarily
    /// equal `created + skipped`.
    pub skipped: u64,
    /// Per-row failures; the sweep continues past them.
    pub errors: u64,
}

/// Idempotent payout backfill over completed assignments.
///
/// Safe to re-run at any time: the per-(job, pro) existence check is the
/// idempotency guard, and a second sweep over a settled backlog creates
/// nothing. Concurrent sweeps can race the check-then-insert; the store
/// resolves that by rejecting the duplicate, which the sweep counts as a
/// skip.
#[derive(Debug, Clone)]
pub struct LedgerReconciler {
    store: Arc<dyn Store>,
    event_bus: EventBus,
    payout: PayoutConfig,
}

impl LedgerReconciler {
    /// Creates a new `LedgerReconciler`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, event_bus: EventBus, payout: PayoutConfig) -> Self {
        Self {
            store,
            event_bus,
            payout,
        }
    }

    /// Sweeps completed assignments in scope and backfills missing
    /// payout entries.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] only when the initial assignment
    /// listing fails; per-assignment failures are logged and counted in
    /// [`ReconcileReport::errors`] instead of aborting the sweep.
    pub async fn reconcile(&self, scope: ReconcileScope) -> Result<ReconcileReport, DispatchError> {
        let pro_filter = match scope {
            ReconcileScope::All => None,
            ReconcileScope::Pro(id) => Some(id),
        };
        let assignments = self.store.list_completed_assignments(pro_filter).await?;

        let mut report = ReconcileReport::default();
        for assignment in assignments {
            report.scanned += 1;
            if let Err(err) = self.reconcile_one(&assignment, pro_filter, &mut report).await {
                report.errors += 1;
                tracing::error!(
                    assignment_id = %assignment.id,
                    job_id = %assignment.job_id,
                    error = %err,
                    "reconcile failed for assignment; continuing"
                );
            }
        }

        tracing::info!(
            scanned = report.scanned,
            created = report.created,
            skipped = report.skipped,
            errors = report.errors,
            "reconcile sweep finished"
        );
        Ok(report)
    }

    /// Backfills the shares owed against one completed assignment.
    async fn reconcile_one(
        &self,
        assignment: &Assignment,
        pro_filter: Option<ProId>,
        report: &mut ReconcileReport,
    ) -> Result<(), DispatchError> {
        let job = self.store.get_job(assignment.job_id).await?;
        let lines = self.store.list_job_lines(assignment.job_id).await?;
        let split = self.store.get_team_split(assignment.job_id).await?;
        let breakdown = calculate_payout(&job, &lines, split.as_ref(), &self.payout);

        for (pro_id, amount) in breakdown.shares_for(assignment.pro_id, split.as_ref()) {
            if pro_filter.is_some_and(|filter| filter != pro_id) {
                continue;
            }
            self.backfill(assignment.job_id, pro_id, amount, report)
                .await?;
        }
        Ok(())
    }

    /// Writes one missing ledger entry, counting the outcome.
    async fn backfill(
        &self,
        job_id: JobId,
        pro_id: ProId,
        amount: f64,
        report: &mut ReconcileReport,
    ) -> Result<(), DispatchError> {
        if self.store.find_job_payout(job_id, pro_id).await?.is_some() {
            report.skipped += 1;
            return Ok(());
        }
        if amount <= 0.0 {
            tracing::info!(%job_id, %pro_id, "zero payout share; nothing to backfill");
            report.skipped += 1;
            return Ok(());
        }

        let entry = LedgerEntry::approved(pro_id, job_id, amount, "job payout (backfilled by reconciler)");
        match self.store.insert_ledger_entry(&entry).await {
            Ok(()) => {
                report.created += 1;
                let _ = self.event_bus.publish(DispatchEvent::PayoutRecorded {
                    job_id,
                    pro_id,
                    amount,
                    backfilled: true,
                    timestamp: Utc::now(),
                });
                tracing::info!(%job_id, %pro_id, amount, "payout backfilled");
                Ok(())
            }
            // Lost a check-then-insert race; the other writer's entry stands.
            Err(DispatchError::LedgerEntryExists { .. }) => {
                report.skipped += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
