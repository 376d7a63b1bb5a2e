//! In-memory store for tests and store-less runs.
//!
//! Each table is a `HashMap` behind its own [`tokio::sync::RwLock`], so
//! reads on one table do not block writes on another. The ledger
//! check-then-insert happens under a single write lock, which makes it
//! atomic within one process; cross-replica races remain the Postgres
//! store's problem.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::domain::{
    Assignment, AssignmentId, AssignmentState, GeoPoint, Job, JobId, JobLine, JobStatus,
    LedgerEntry, LedgerEntryId, Pro, ProId, TeamSplit,
};
use crate::error::DispatchError;

/// Store implementation backed by in-process hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    pros: RwLock<HashMap<ProId, Pro>>,
    assignments: RwLock<HashMap<AssignmentId, Assignment>>,
    lines: RwLock<HashMap<uuid::Uuid, JobLine>>,
    splits: RwLock<HashMap<JobId, TeamSplit>>,
    ledger: RwLock<HashMap<LedgerEntryId, LedgerEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<(), DispatchError> {
        let mut map = self.jobs.write().await;
        if map.contains_key(&job.id) {
            return Err(DispatchError::InvalidRequest(format!(
                "job {} already exists",
                job.id
            )));
        }
        map.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Job, DispatchError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DispatchError::JobNotFound(*id.as_uuid()))
    }

    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<(), DispatchError> {
        let mut map = self.jobs.write().await;
        let job = map
            .get_mut(&id)
            .ok_or(DispatchError::JobNotFound(*id.as_uuid()))?;
        job.status = status;
        Ok(())
    }

    async fn update_job_location(
        &self,
        id: JobId,
        location: GeoPoint,
    ) -> Result<(), DispatchError> {
        let mut map = self.jobs.write().await;
        let job = map
            .get_mut(&id)
            .ok_or(DispatchError::JobNotFound(*id.as_uuid()))?;
        job.location = Some(location);
        Ok(())
    }

    async fn insert_pro(&self, pro: &Pro) -> Result<(), DispatchError> {
        self.pros.write().await.insert(pro.id, pro.clone());
        Ok(())
    }

    async fn get_pro(&self, id: ProId) -> Result<Pro, DispatchError> {
        self.pros
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DispatchError::ProNotFound(*id.as_uuid()))
    }

    async fn list_active_pros(&self) -> Result<Vec<Pro>, DispatchError> {
        Ok(self
            .pros
            .read()
            .await
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        self.assignments
            .write()
            .await
            .insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn get_assignment(&self, id: AssignmentId) -> Result<Assignment, DispatchError> {
        self.assignments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DispatchError::AssignmentNotFound(*id.as_uuid()))
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        let mut map = self.assignments.write().await;
        if !map.contains_key(&assignment.id) {
            return Err(DispatchError::AssignmentNotFound(*assignment.id.as_uuid()));
        }
        map.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn list_assignments_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Assignment>, DispatchError> {
        let mut result: Vec<Assignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.offered_at);
        Ok(result)
    }

    async fn list_completed_assignments(
        &self,
        pro_id: Option<ProId>,
    ) -> Result<Vec<Assignment>, DispatchError> {
        let mut result: Vec<Assignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|a| a.state == AssignmentState::Completed)
            .filter(|a| pro_id.is_none_or(|p| a.pro_id == p))
            .cloned()
            .collect();
        result.sort_by_key(|a| a.offered_at);
        Ok(result)
    }

    async fn insert_job_line(&self, line: &JobLine) -> Result<(), DispatchError> {
        self.lines.write().await.insert(line.id, line.clone());
        Ok(())
    }

    async fn list_job_lines(&self, job_id: JobId) -> Result<Vec<JobLine>, DispatchError> {
        Ok(self
            .lines
            .read()
            .await
            .values()
            .filter(|l| l.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn upsert_team_split(&self, split: &TeamSplit) -> Result<(), DispatchError> {
        self.splits.write().await.insert(split.job_id, split.clone());
        Ok(())
    }

    async fn get_team_split(&self, job_id: JobId) -> Result<Option<TeamSplit>, DispatchError> {
        Ok(self.splits.read().await.get(&job_id).cloned())
    }

    async fn insert_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), DispatchError> {
        let mut map = self.ledger.write().await;
        // Check-then-insert is atomic under this write lock.
        if map
            .values()
            .any(|e| e.job_id == entry.job_id && e.pro_id == entry.pro_id)
        {
            return Err(DispatchError::LedgerEntryExists {
                job_id: *entry.job_id.as_uuid(),
                pro_id: *entry.pro_id.as_uuid(),
            });
        }
        map.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn find_job_payout(
        &self,
        job_id: JobId,
        pro_id: ProId,
    ) -> Result<Option<LedgerEntry>, DispatchError> {
        Ok(self
            .ledger
            .read()
            .await
            .values()
            .find(|e| e.job_id == job_id && e.pro_id == pro_id)
            .cloned())
    }

    async fn list_ledger_entries_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<LedgerEntry>, DispatchError> {
        let mut result: Vec<LedgerEntry> = self
            .ledger
            .read()
            .await
            .values()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }
}
