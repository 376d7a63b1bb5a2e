//! Persistence layer: the shared store behind the dispatch engine.
//!
//! [`Store`] is the read/write contract for jobs, pros, assignments,
//! job lines, team splits, and ledger entries. Two implementations are
//! provided: [`memory::MemoryStore`] (tests and store-less runs) and
//! [`postgres::PostgresStore`] (`sqlx::PgPool`).
//!
//! The store offers no cross-request ordering guarantees. In
//! particular, two concurrent completion calls or reconciler sweeps can
//! both pass the ledger existence check before either write commits —
//! the PostgreSQL schema closes this with a unique index, while the
//! in-memory store's per-table lock makes the check-then-insert atomic
//! within one process only.

pub mod memory;
pub mod postgres;
pub mod retry;

use async_trait::async_trait;

use crate::domain::{
    Assignment, AssignmentId, GeoPoint, Job, JobId, JobLine, JobStatus, LedgerEntry, Pro, ProId,
    TeamSplit,
};
use crate::error::DispatchError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use retry::{RetryConfig, RetryPolicy};

/// Read/write contract for the shared dispatch store.
///
/// All methods are keyed by opaque identifiers; last write wins on
/// assignment updates (no optimistic locking).
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Inserts a new job.
    async fn insert_job(&self, job: &Job) -> Result<(), DispatchError>;

    /// Fetches a job by id.
    async fn get_job(&self, id: JobId) -> Result<Job, DispatchError>;

    /// Updates a job's lifecycle status.
    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<(), DispatchError>;

    /// Records geocoded coordinates on a job.
    async fn update_job_location(&self, id: JobId, location: GeoPoint)
    -> Result<(), DispatchError>;

    /// Inserts a new pro profile.
    async fn insert_pro(&self, pro: &Pro) -> Result<(), DispatchError>;

    /// Fetches a pro by id.
    async fn get_pro(&self, id: ProId) -> Result<Pro, DispatchError>;

    /// Lists all pros currently accepting work.
    async fn list_active_pros(&self) -> Result<Vec<Pro>, DispatchError>;

    /// Inserts a new assignment.
    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), DispatchError>;

    /// Fetches an assignment by id.
    async fn get_assignment(&self, id: AssignmentId) -> Result<Assignment, DispatchError>;

    /// Overwrites an assignment (last write wins).
    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), DispatchError>;

    /// Lists every assignment for a job, in offer order.
    async fn list_assignments_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Assignment>, DispatchError>;

    /// Lists completed assignments, optionally scoped to one pro.
    async fn list_completed_assignments(
        &self,
        pro_id: Option<ProId>,
    ) -> Result<Vec<Assignment>, DispatchError>;

    /// Inserts a job line.
    async fn insert_job_line(&self, line: &JobLine) -> Result<(), DispatchError>;

    /// Lists the line items for a job.
    async fn list_job_lines(&self, job_id: JobId) -> Result<Vec<JobLine>, DispatchError>;

    /// Creates or replaces the team split for a job.
    async fn upsert_team_split(&self, split: &TeamSplit) -> Result<(), DispatchError>;

    /// Fetches the team split for a job, if one exists.
    async fn get_team_split(&self, job_id: JobId) -> Result<Option<TeamSplit>, DispatchError>;

    /// Inserts a job-payout ledger entry.
    ///
    /// Implementations must reject a duplicate (job, pro) job-payout
    /// with [`DispatchError::LedgerEntryExists`] where they can detect
    /// it.
    async fn insert_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), DispatchError>;

    /// Finds the job-payout ledger entry for a (job, pro) pair, if any.
    async fn find_job_payout(
        &self,
        job_id: JobId,
        pro_id: ProId,
    ) -> Result<Option<LedgerEntry>, DispatchError>;

    /// Lists all ledger entries written against a job.
    async fn list_ledger_entries_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<LedgerEntry>, DispatchError>;
}
