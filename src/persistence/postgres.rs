//! PostgreSQL implementation of the store.
//!
//! Every round-trip runs under the shared [`RetryPolicy`]; SQL failures
//! map to [`DispatchError::StoreError`] (the retryable class) except
//! unique violations on the ledger, which become
//! [`DispatchError::LedgerEntryExists`]. The schema lives in
//! `migrations/` and includes the unique index on
//! `ledger_entries (job_id, pro_id)` that closes the duplicate-payout
//! race at the store level.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::retry::RetryPolicy;
use super::Store;
use crate::domain::{
    Assignment, AssignmentId, AssignmentState, GeoPoint, Job, JobId, JobLine, JobMetadata,
    JobStatus, LedgerEntry, LedgerEntryId, LedgerState, Pro, ProId, SplitMode, TeamSplit,
};
use crate::error::DispatchError;

use async_trait::async_trait;

type JobRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Option<f64>,
    Option<f64>,
    DateTime<Utc>,
    serde_json::Value,
);

type AssignmentRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    Option<f64>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

type ProRow = (
    Uuid,
    bool,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    i32,
    f64,
    i32,
);

type LedgerRow = (Uuid, Uuid, Uuid, f64, String, DateTime<Utc>, String);

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool and retry
    /// policy.
    #[must_use]
    pub const fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

fn store_err(e: sqlx::Error) -> DispatchError {
    DispatchError::StoreError(e.to_string())
}

fn point(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    }
}

fn job_from_row(row: JobRow) -> Result<Job, DispatchError> {
    let (id, status, variant_code, customer_name, address, lat, lng, created_at, metadata) = row;
    let metadata: JobMetadata = serde_json::from_value(metadata)
        .map_err(|e| DispatchError::Internal(format!("corrupt job metadata: {e}")))?;
    Ok(Job {
        id: JobId::from_uuid(id),
        status: JobStatus::parse(&status)?,
        variant_code,
        customer_name,
        address,
        location: point(lat, lng),
        created_at,
        metadata,
    })
}

fn assignment_from_row(row: AssignmentRow) -> Result<Assignment, DispatchError> {
    let (id, job_id, pro_id, state, distance_miles, offered_at, accepted_at, declined_at, completed_at) =
        row;
    Ok(Assignment {
        id: AssignmentId::from_uuid(id),
        job_id: JobId::from_uuid(job_id),
        pro_id: ProId::from_uuid(pro_id),
        state: AssignmentState::parse(&state)?,
        distance_miles,
        offered_at,
        accepted_at,
        declined_at,
        completed_at,
    })
}

fn pro_from_row(row: ProRow) -> Pro {
    let (id, active, lat, lng, service_radius_miles, daily_capacity, rating, open_jobs) = row;
    Pro {
        id: ProId::from_uuid(id),
        active,
        location: point(lat, lng),
        service_radius_miles,
        daily_capacity: u32::try_from(daily_capacity).unwrap_or(0),
        rating,
        open_jobs: u32::try_from(open_jobs).unwrap_or(0),
    }
}

fn ledger_from_row(row: LedgerRow) -> Result<LedgerEntry, DispatchError> {
    let (id, pro_id, job_id, amount, state, created_at, note) = row;
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(id),
        pro_id: ProId::from_uuid(pro_id),
        job_id: JobId::from_uuid(job_id),
        amount,
        state: LedgerState::parse(&state)?,
        created_at,
        note,
    })
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_job(&self, job: &Job) -> Result<(), DispatchError> {
        let metadata = serde_json::to_value(&job.metadata)
            .map_err(|e| DispatchError::Internal(format!("job metadata: {e}")))?;
        let metadata = &metadata;
        self.retry
            .run("insert_job", || async move {
                sqlx::query(
                    "INSERT INTO jobs (id, status, variant_code, customer_name, address, lat, lng, created_at, metadata) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(job.id.as_uuid())
                .bind(job.status.as_str())
                .bind(&job.variant_code)
                .bind(&job.customer_name)
                .bind(&job.address)
                .bind(job.location.map(|p| p.lat))
                .bind(job.location.map(|p| p.lng))
                .bind(job.created_at)
                .bind(metadata)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
                Ok(())
            })
            .await
    }

    async fn get_job(&self, id: JobId) -> Result<Job, DispatchError> {
        let row = self
            .retry
            .run("get_job", || async move {
                sqlx::query_as::<_, JobRow>(
                    "SELECT id, status, variant_code, customer_name, address, lat, lng, created_at, metadata \
                     FROM jobs WHERE id = $1",
                )
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        row.map(job_from_row)
            .transpose()?
            .ok_or(DispatchError::JobNotFound(*id.as_uuid()))
    }

    async fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<(), DispatchError> {
        let result = self
            .retry
            .run("update_job_status", || async move {
                sqlx::query("UPDATE jobs SET status = $1 WHERE id = $2")
                    .bind(status.as_str())
                    .bind(id.as_uuid())
                    .execute(&self.pool)
                    .await
                    .map_err(store_err)
            })
            .await?;
        if result.rows_affected() == 0 {
            return Err(DispatchError::JobNotFound(*id.as_uuid()));
        }
        Ok(())
    }

    async fn update_job_location(
        &self,
        id: JobId,
        location: GeoPoint,
    ) -> Result<(), DispatchError> {
        let result = self
            .retry
            .run("update_job_location", || async move {
                sqlx::query("UPDATE jobs SET lat = $1, lng = $2 WHERE id = $3")
                    .bind(location.lat)
                    .bind(location.lng)
                    .bind(id.as_uuid())
                    .execute(&self.pool)
                    .await
                    .map_err(store_err)
            })
            .await?;
        if result.rows_affected() == 0 {
            return Err(DispatchError::JobNotFound(*id.as_uuid()));
        }
        Ok(())
    }

    async fn insert_pro(&self, pro: &Pro) -> Result<(), DispatchError> {
        self.retry
            .run("insert_pro", || async move {
                sqlx::query(
                    "INSERT INTO pros (id, active, lat, lng, service_radius_miles, daily_capacity, rating, open_jobs) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(pro.id.as_uuid())
                .bind(pro.active)
                .bind(pro.location.map(|p| p.lat))
                .bind(pro.location.map(|p| p.lng))
                .bind(pro.service_radius_miles)
                .bind(i32::try_from(pro.daily_capacity).unwrap_or(i32::MAX))
                .bind(pro.rating)
                .bind(i32::try_from(pro.open_jobs).unwrap_or(i32::MAX))
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
                Ok(())
            })
            .await
    }

    async fn get_pro(&self, id: ProId) -> Result<Pro, DispatchError> {
        let row = self
            .retry
            .run("get_pro", || async move {
                sqlx::query_as::<_, ProRow>(
                    "SELECT id, active, lat, lng, service_radius_miles, daily_capacity, rating, open_jobs \
                     FROM pros WHERE id = $1",
                )
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        row.map(pro_from_row)
            .ok_or(DispatchError::ProNotFound(*id.as_uuid()))
    }

    async fn list_active_pros(&self) -> Result<Vec<Pro>, DispatchError> {
        let rows = self
            .retry
            .run("list_active_pros", || async move {
                sqlx::query_as::<_, ProRow>(
                    "SELECT id, active, lat, lng, service_radius_miles, daily_capacity, rating, open_jobs \
                     FROM pros WHERE active = TRUE",
                )
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        Ok(rows.into_iter().map(pro_from_row).collect())
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        self.retry
            .run("insert_assignment", || async move {
                sqlx::query(
                    "INSERT INTO assignments (id, job_id, pro_id, state, distance_miles, offered_at, accepted_at, declined_at, completed_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(assignment.id.as_uuid())
                .bind(assignment.job_id.as_uuid())
                .bind(assignment.pro_id.as_uuid())
                .bind(assignment.state.as_str())
                .bind(assignment.distance_miles)
                .bind(assignment.offered_at)
                .bind(assignment.accepted_at)
                .bind(assignment.declined_at)
                .bind(assignment.completed_at)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
                Ok(())
            })
            .await
    }

    async fn get_assignment(&self, id: AssignmentId) -> Result<Assignment, DispatchError> {
        let row = self
            .retry
            .run("get_assignment", || async move {
                sqlx::query_as::<_, AssignmentRow>(
                    "SELECT id, job_id, pro_id, state, distance_miles, offered_at, accepted_at, declined_at, completed_at \
                     FROM assignments WHERE id = $1",
                )
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        row.map(assignment_from_row)
            .transpose()?
            .ok_or(DispatchError::AssignmentNotFound(*id.as_uuid()))
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        let result = self
            .retry
            .run("update_assignment", || async move {
                sqlx::query(
                    "UPDATE assignments SET state = $1, accepted_at = $2, declined_at = $3, completed_at = $4 \
                     WHERE id = $5",
                )
                .bind(assignment.state.as_str())
                .bind(assignment.accepted_at)
                .bind(assignment.declined_at)
                .bind(assignment.completed_at)
                .bind(assignment.id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        if result.rows_affected() == 0 {
            return Err(DispatchError::AssignmentNotFound(*assignment.id.as_uuid()));
        }
        Ok(())
    }

    async fn list_assignments_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Assignment>, DispatchError> {
        let rows = self
            .retry
            .run("list_assignments_for_job", || async move {
                sqlx::query_as::<_, AssignmentRow>(
                    "SELECT id, job_id, pro_id, state, distance_miles, offered_at, accepted_at, declined_at, completed_at \
                     FROM assignments WHERE job_id = $1 ORDER BY offered_at ASC",
                )
                .bind(job_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        rows.into_iter().map(assignment_from_row).collect()
    }

    async fn list_completed_assignments(
        &self,
        pro_id: Option<ProId>,
    ) -> Result<Vec<Assignment>, DispatchError> {
        let rows = self
            .retry
            .run("list_completed_assignments", || async move {
                if let Some(pro) = pro_id {
                    sqlx::query_as::<_, AssignmentRow>(
                        "SELECT id, job_id, pro_id, state, distance_miles, offered_at, accepted_at, declined_at, completed_at \
                         FROM assignments WHERE state = 'completed' AND pro_id = $1 ORDER BY offered_at ASC",
                    )
                    .bind(pro.as_uuid())
                    .fetch_all(&self.pool)
                    .await
                } else {
                    sqlx::query_as::<_, AssignmentRow>(
                        "SELECT id, job_id, pro_id, state, distance_miles, offered_at, accepted_at, declined_at, completed_at \
                         FROM assignments WHERE state = 'completed' ORDER BY offered_at ASC",
                    )
                    .fetch_all(&self.pool)
                    .await
                }
                .map_err(store_err)
            })
            .await?;
        rows.into_iter().map(assignment_from_row).collect()
    }

    async fn insert_job_line(&self, line: &JobLine) -> Result<(), DispatchError> {
        self.retry
            .run("insert_job_line", || async move {
                sqlx::query(
                    "INSERT INTO job_lines (id, job_id, variant_code, quantity, customer_price, payout) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(line.id)
                .bind(line.job_id.as_uuid())
                .bind(&line.variant_code)
                .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
                .bind(line.customer_price)
                .bind(line.payout)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
                Ok(())
            })
            .await
    }

    async fn list_job_lines(&self, job_id: JobId) -> Result<Vec<JobLine>, DispatchError> {
        let rows = self
            .retry
            .run("list_job_lines", || async move {
                sqlx::query_as::<_, (Uuid, Uuid, String, i32, f64, Option<f64>)>(
                    "SELECT id, job_id, variant_code, quantity, customer_price, payout \
                     FROM job_lines WHERE job_id = $1",
                )
                .bind(job_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, job_id, variant_code, quantity, customer_price, payout)| JobLine {
                id,
                job_id: JobId::from_uuid(job_id),
                variant_code,
                quantity: u32::try_from(quantity).unwrap_or(0),
                customer_price,
                payout,
            })
            .collect())
    }

    async fn upsert_team_split(&self, split: &TeamSplit) -> Result<(), DispatchError> {
        let (mode, primary_percent, primary_amount, secondary_amount) = match split.mode {
            SplitMode::Percentage { primary_percent } => {
                ("percentage", Some(primary_percent), None, None)
            }
            SplitMode::Flat {
                primary_amount,
                secondary_amount,
            } => ("flat", None, Some(primary_amount), Some(secondary_amount)),
        };
        self.retry
            .run("upsert_team_split", || async move {
                sqlx::query(
                    "INSERT INTO team_splits (job_id, secondary_pro_id, mode, primary_percent, primary_amount, secondary_amount) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT (job_id) DO UPDATE SET secondary_pro_id = $2, mode = $3, primary_percent = $4, primary_amount = $5, secondary_amount = $6",
                )
                .bind(split.job_id.as_uuid())
                .bind(split.secondary_pro_id.as_uuid())
                .bind(mode)
                .bind(primary_percent)
                .bind(primary_amount)
                .bind(secondary_amount)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
                Ok(())
            })
            .await
    }

    async fn get_team_split(&self, job_id: JobId) -> Result<Option<TeamSplit>, DispatchError> {
        let row = self
            .retry
            .run("get_team_split", || async move {
                sqlx::query_as::<_, (Uuid, Uuid, String, Option<f64>, Option<f64>, Option<f64>)>(
                    "SELECT job_id, secondary_pro_id, mode, primary_percent, primary_amount, secondary_amount \
                     FROM team_splits WHERE job_id = $1",
                )
                .bind(job_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        let Some((job_id, secondary_pro_id, mode, primary_percent, primary_amount, secondary_amount)) =
            row
        else {
            return Ok(None);
        };
        let mode = match mode.as_str() {
            "percentage" => SplitMode::Percentage {
                primary_percent: primary_percent.unwrap_or(0.0),
            },
            "flat" => SplitMode::Flat {
                primary_amount: primary_amount.unwrap_or(0.0),
                secondary_amount: secondary_amount.unwrap_or(0.0),
            },
            other => {
                return Err(DispatchError::Internal(format!(
                    "unknown split mode: {other}"
                )));
            }
        };
        Ok(Some(TeamSplit {
            job_id: JobId::from_uuid(job_id),
            secondary_pro_id: ProId::from_uuid(secondary_pro_id),
            mode,
        }))
    }

    async fn insert_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), DispatchError> {
        self.retry
            .run("insert_ledger_entry", || async move {
                sqlx::query(
                    "INSERT INTO ledger_entries (id, pro_id, job_id, amount, state, created_at, note) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(entry.id.as_uuid())
                .bind(entry.pro_id.as_uuid())
                .bind(entry.job_id.as_uuid())
                .bind(entry.amount)
                .bind(entry.state.as_str())
                .bind(entry.created_at)
                .bind(&entry.note)
                .execute(&self.pool)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db) if db.is_unique_violation() => {
                        DispatchError::LedgerEntryExists {
                            job_id: *entry.job_id.as_uuid(),
                            pro_id: *entry.pro_id.as_uuid(),
                        }
                    }
                    _ => store_err(e),
                })?;
                Ok(())
            })
            .await
    }

    async fn find_job_payout(
        &self,
        job_id: JobId,
        pro_id: ProId,
    ) -> Result<Option<LedgerEntry>, DispatchError> {
        let row = self
            .retry
            .run("find_job_payout", || async move {
                sqlx::query_as::<_, LedgerRow>(
                    "SELECT id, pro_id, job_id, amount, state, created_at, note \
                     FROM ledger_entries WHERE job_id = $1 AND pro_id = $2",
                )
                .bind(job_id.as_uuid())
                .bind(pro_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        row.map(ledger_from_row).transpose()
    }

    async fn list_ledger_entries_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<LedgerEntry>, DispatchError> {
        let rows = self
            .retry
            .run("list_ledger_entries_for_job", || async move {
                sqlx::query_as::<_, LedgerRow>(
                    "SELECT id, pro_id, job_id, amount, state, created_at, note \
                     FROM ledger_entries WHERE job_id = $1 ORDER BY created_at ASC",
                )
                .bind(job_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)
            })
            .await?;
        rows.into_iter().map(ledger_from_row).collect()
    }
}
