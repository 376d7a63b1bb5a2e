//! Dispatch service: offers, assignment transitions, and settlement.

use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::domain::payout::{PayoutConfig, calculate_payout};
use crate::domain::ranking::{RankedCandidate, RankingConfig, rank_candidates};
use crate::domain::{
    Assignment, AssignmentId, AssignmentState, DispatchEvent, EventBus, Job, JobId, JobStatus,
    LedgerEntry, ProId, SplitMode, TeamSplit, geo,
};
use crate::error::DispatchError;
use crate::persistence::Store;
use crate::service::collaborators::{CompletionGate, Geocoder};

/// A pro's response to an open offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAction {
    /// Take the job; first acceptance wins.
    Accept,
    /// Pass; the job is freed for the next candidate.
    Decline,
}

/// Result of completing an assignment.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// The (now completed) assignment.
    pub assignment: Assignment,
    /// Ledger entries settled against the job, one per participating
    /// pro with a positive share.
    pub ledger_entries: Vec<LedgerEntry>,
}

/// Orchestration layer for the dispatch lifecycle.
///
/// Stateless coordinator: owns a store handle, the external
/// collaborators, and the event bus. Every mutation method follows the
/// pattern: load → guard → mutate → persist → emit events → return.
#[derive(Debug, Clone)]
pub struct DispatchService {
    store: Arc<dyn Store>,
    geocoder: Arc<dyn Geocoder>,
    gate: Arc<dyn CompletionGate>,
    event_bus: EventBus,
    ranking: RankingConfig,
    payout: PayoutConfig,
}

impl DispatchService {
    /// Creates a new `DispatchService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        geocoder: Arc<dyn Geocoder>,
        gate: Arc<dyn CompletionGate>,
        event_bus: EventBus,
        ranking: RankingConfig,
        payout: PayoutConfig,
    ) -> Self {
        Self {
            store,
            geocoder,
            gate,
            event_bus,
            ranking,
            payout,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the shared store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Ranks active pros for a job.
    ///
    /// A job without coordinates is geocoded first; if that fails too,
    /// an empty list is returned rather than an error so the dispatch
    /// path never trips on a geocoding outage.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the job does not exist or the
    /// store fails.
    pub async fn find_candidates(
        &self,
        job_id: JobId,
    ) -> Result<Vec<RankedCandidate>, DispatchError> {
        let job = self.store.get_job(job_id).await?;

        let location = match job.location {
            Some(location) => Some(location),
            None => {
                let resolved = self.geocoder.geocode(&job.address).await;
                if let Some(point) = resolved
                    && let Err(err) = self.store.update_job_location(job_id, point).await
                {
                    tracing::warn!(%job_id, error = %err, "failed to persist geocoded location");
                }
                resolved
            }
        };

        let Some(location) = location else {
            tracing::warn!(%job_id, "job has no coordinates; returning no candidates");
            return Ok(Vec::new());
        };

        let pros = self.store.list_active_pros().await?;
        let mut rng = match self.ranking.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Ok(rank_candidates(location, &pros, &self.ranking, &mut rng))
    }

    /// Creates an offer for the top candidate, optionally inviting a
    /// teammate with a second offer and recording a team split.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the job is closed to offers,
    /// the pro already holds an active assignment on the job, the pro
    /// is inactive, or a supplied split is invalid.
    pub async fn create_offer(
        &self,
        job_id: JobId,
        pro_id: ProId,
        teammate_id: Option<ProId>,
        split_mode: Option<SplitMode>,
    ) -> Result<Vec<Assignment>, DispatchError> {
        if split_mode.is_some() && teammate_id.is_none() {
            return Err(DispatchError::InvalidRequest(
                "team split requires a teammate".to_string(),
            ));
        }
        if teammate_id == Some(pro_id) {
            return Err(DispatchError::InvalidRequest(
                "teammate must differ from the primary pro".to_string(),
            ));
        }

        let job = self.store.get_job(job_id).await?;
        if !matches!(job.status, JobStatus::Pending | JobStatus::Offered) {
            return Err(DispatchError::InvalidAction(format!(
                "job {job_id} is not open for offers (status: {})",
                job.status.as_str()
            )));
        }

        let existing = self.store.list_assignments_for_job(job_id).await?;
        let mut created = Vec::with_capacity(2);
        created.push(self.offer_to(&job, pro_id, &existing).await?);

        if let Some(teammate) = teammate_id {
            created.push(self.offer_to(&job, teammate, &existing).await?);
            if let Some(mode) = split_mode {
                let split = TeamSplit {
                    job_id,
                    secondary_pro_id: teammate,
                    mode,
                };
                split.validate()?;
                self.store.upsert_team_split(&split).await?;
            }
        }

        self.store
            .update_job_status(job_id, JobStatus::Offered)
            .await?;

        for assignment in &created {
            let _ = self.event_bus.publish(DispatchEvent::OfferCreated {
                assignment_id: assignment.id,
                job_id,
                pro_id: assignment.pro_id,
                distance_miles: assignment.distance_miles,
                timestamp: Utc::now(),
            });
            tracing::info!(%job_id, pro_id = %assignment.pro_id, "offer created");
        }

        Ok(created)
    }

    /// Creates and persists one offer after the per-pro guards.
    async fn offer_to(
        &self,
        job: &Job,
        pro_id: ProId,
        existing: &[Assignment],
    ) -> Result<Assignment, DispatchError> {
        if existing
            .iter()
            .any(|a| a.pro_id == pro_id && a.state.is_active())
        {
            return Err(DispatchError::InvalidAction(format!(
                "pro {pro_id} already holds an active assignment on job {}",
                job.id
            )));
        }

        let pro = self.store.get_pro(pro_id).await?;
        if !pro.active {
            return Err(DispatchError::InvalidAction(format!(
                "pro {pro_id} is inactive"
            )));
        }

        let distance = match (job.location, pro.location) {
            (Some(job_loc), Some(pro_loc)) => {
                let d = geo::distance_miles(job_loc, pro_loc);
                if d.is_nan() { None } else { Some(d) }
            }
            _ => None,
        };

        let assignment = Assignment::new_offer(job.id, pro_id, distance);
        self.store.insert_assignment(&assignment).await?;
        Ok(assignment)
    }

    /// Applies a pro's accept/decline response to an open offer.
    ///
    /// On acceptance all sibling open offers for the job are closed —
    /// first acceptance wins. `acting_pro` is the authenticated pro
    /// making the call; it must hold the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::OfferNoLongerAvailable`] when the offer
    /// was already taken or closed, and validation errors when the
    /// acting pro does not hold the assignment.
    pub async fn respond_to_offer(
        &self,
        assignment_id: AssignmentId,
        action: OfferAction,
        acting_pro: Option<ProId>,
    ) -> Result<Assignment, DispatchError> {
        let mut assignment = self.store.get_assignment(assignment_id).await?;
        verify_acting_pro(&assignment, acting_pro)?;

        match action {
            OfferAction::Accept => {
                let siblings = self.store.list_assignments_for_job(assignment.job_id).await?;
                if siblings
                    .iter()
                    .any(|a| a.id != assignment.id && a.state == AssignmentState::Accepted)
                {
                    return Err(DispatchError::OfferNoLongerAvailable(
                        *assignment_id.as_uuid(),
                    ));
                }

                assignment.accept()?;
                self.store.update_assignment(&assignment).await?;

                // Close sibling open offers; the job is taken.
                for mut sibling in siblings {
                    if sibling.id != assignment.id && sibling.state == AssignmentState::Offered {
                        sibling.decline()?;
                        self.store.update_assignment(&sibling).await?;
                        tracing::info!(
                            assignment_id = %sibling.id,
                            job_id = %sibling.job_id,
                            "sibling offer closed after acceptance"
                        );
                    }
                }

                self.store
                    .update_job_status(assignment.job_id, JobStatus::Accepted)
                    .await?;

                let _ = self.event_bus.publish(DispatchEvent::OfferAccepted {
                    assignment_id,
                    job_id: assignment.job_id,
                    pro_id: assignment.pro_id,
                    timestamp: Utc::now(),
                });
                tracing::info!(%assignment_id, job_id = %assignment.job_id, "offer accepted");
            }
            OfferAction::Decline => {
                assignment.decline()?;
                self.store.update_assignment(&assignment).await?;

                let siblings = self.store.list_assignments_for_job(assignment.job_id).await?;
                if !siblings.iter().any(|a| a.state.is_active()) {
                    self.store
                        .update_job_status(assignment.job_id, JobStatus::Pending)
                        .await?;
                }

                let _ = self.event_bus.publish(DispatchEvent::OfferDeclined {
                    assignment_id,
                    job_id: assignment.job_id,
                    pro_id: assignment.pro_id,
                    timestamp: Utc::now(),
                });
                tracing::info!(%assignment_id, job_id = %assignment.job_id, "offer declined");
            }
        }

        Ok(assignment)
    }

    /// Completes an accepted assignment and settles the payout.
    ///
    /// Completing an already-completed assignment is an idempotent
    /// no-op success returning the previously written ledger entries
    /// (completion is retried after timeouts and webhook replays).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PrerequisitesNotMet`] when the external
    /// completion gate reports unmet prerequisites, and
    /// [`DispatchError::IllegalTransition`] from any state other than
    /// `accepted` or `completed`.
    pub async fn complete_assignment(
        &self,
        assignment_id: AssignmentId,
        acting_pro: Option<ProId>,
    ) -> Result<CompletionOutcome, DispatchError> {
        let mut assignment = self.store.get_assignment(assignment_id).await?;
        verify_acting_pro(&assignment, acting_pro)?;

        if assignment.state == AssignmentState::Completed {
            let ledger_entries = self
                .store
                .list_ledger_entries_for_job(assignment.job_id)
                .await?;
            return Ok(CompletionOutcome {
                assignment,
                ledger_entries,
            });
        }

        let job = self.store.get_job(assignment.job_id).await?;
        if assignment.state == AssignmentState::Accepted
            && !self.gate.prerequisites_met(&assignment, &job).await
        {
            return Err(DispatchError::PrerequisitesNotMet(*assignment_id.as_uuid()));
        }

        assignment.complete()?;
        self.store.update_assignment(&assignment).await?;
        self.store
            .update_job_status(assignment.job_id, JobStatus::Completed)
            .await?;

        let lines = self.store.list_job_lines(assignment.job_id).await?;
        let split = self.store.get_team_split(assignment.job_id).await?;
        let breakdown = calculate_payout(&job, &lines, split.as_ref(), &self.payout);

        let mut ledger_entries = Vec::with_capacity(2);
        for (pro_id, amount) in breakdown.shares_for(assignment.pro_id, split.as_ref()) {
            if let Some(entry) = self
                .settle(assignment.job_id, pro_id, amount, false)
                .await?
            {
                ledger_entries.push(entry);
            }
        }

        let _ = self.event_bus.publish(DispatchEvent::AssignmentCompleted {
            assignment_id,
            job_id: assignment.job_id,
            pro_id: assignment.pro_id,
            timestamp: Utc::now(),
        });
        tracing::info!(
            %assignment_id,
            job_id = %assignment.job_id,
            total = breakdown.total,
            "assignment completed"
        );

        Ok(CompletionOutcome {
            assignment,
            ledger_entries,
        })
    }

    /// Administratively cancels an offered or accepted assignment.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::IllegalTransition`] from any terminal
    /// state.
    pub async fn cancel_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, DispatchError> {
        let mut assignment = self.store.get_assignment(assignment_id).await?;
        assignment.cancel()?;
        self.store.update_assignment(&assignment).await?;

        let siblings = self.store.list_assignments_for_job(assignment.job_id).await?;
        if !siblings.iter().any(|a| a.state.is_active()) {
            self.store
                .update_job_status(assignment.job_id, JobStatus::Pending)
                .await?;
        }

        let _ = self.event_bus.publish(DispatchEvent::AssignmentCanceled {
            assignment_id,
            job_id: assignment.job_id,
            pro_id: assignment.pro_id,
            timestamp: Utc::now(),
        });
        tracing::info!(%assignment_id, "assignment canceled");
        Ok(assignment)
    }

    /// Writes one job-payout ledger entry, skipping zero amounts and
    /// tolerating a lost duplicate-insert race by returning the entry
    /// that won.
    async fn settle(
        &self,
        job_id: JobId,
        pro_id: ProId,
        amount: f64,
        backfilled: bool,
    ) -> Result<Option<LedgerEntry>, DispatchError> {
        if amount <= 0.0 {
            tracing::info!(%job_id, %pro_id, "zero payout; not ledgered");
            return Ok(None);
        }
        let note = if backfilled {
            "job payout (backfilled by reconciler)"
        } else {
            "job payout"
        };
        let entry = LedgerEntry::approved(pro_id, job_id, amount, note);
        match self.store.insert_ledger_entry(&entry).await {
            Ok(()) => {
                let _ = self.event_bus.publish(DispatchEvent::PayoutRecorded {
                    job_id,
                    pro_id,
                    amount,
                    backfilled,
                    timestamp: Utc::now(),
                });
                Ok(Some(entry))
            }
            Err(DispatchError::LedgerEntryExists { .. }) => {
                tracing::warn!(%job_id, %pro_id, "payout already ledgered; keeping existing entry");
                self.store.find_job_payout(job_id, pro_id).await
            }
            Err(err) => Err(err),
        }
    }
}

/// Rejects pro-initiated transitions on assignments the acting pro does
/// not hold. `None` means the caller is trusted (admin path).
fn verify_acting_pro(
    assignment: &Assignment,
    acting_pro: Option<ProId>,
) -> Result<(), DispatchError> {
    if let Some(acting) = acting_pro
        && acting != assignment.pro_id
    {
        return Err(DispatchError::InvalidRequest(format!(
            "pro {acting} does not hold assignment {}",
            assignment.id
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::{GeoPoint, JobMetadata, JobLine, Pro};
    use crate::persistence::MemoryStore;
    use crate::service::collaborators::{AlwaysReady, NoopGeocoder};
    use async_trait::async_trait;

    const JOB_LOC: GeoPoint = GeoPoint::new(33.4484, -112.0740);

    #[derive(Debug)]
    struct ClosedGate;

    #[async_trait]
    impl CompletionGate for ClosedGate {
        async fn prerequisites_met(&self, _assignment: &Assignment, _job: &Job) -> bool {
            false
        }
    }

    fn make_service(store: Arc<MemoryStore>) -> DispatchService {
        DispatchService::new(
            store,
            Arc::new(NoopGeocoder),
            Arc::new(AlwaysReady),
            EventBus::new(100),
            RankingConfig {
                rng_seed: Some(11),
                ..RankingConfig::default()
            },
            PayoutConfig::default(),
        )
    }

    fn gated_service(store: Arc<MemoryStore>) -> DispatchService {
        DispatchService::new(
            store,
            Arc::new(NoopGeocoder),
            Arc::new(ClosedGate),
            EventBus::new(100),
            RankingConfig::default(),
            PayoutConfig::default(),
        )
    }

    async fn seed_job(store: &MemoryStore, location: Option<GeoPoint>) -> Job {
        let job = Job {
            id: JobId::new(),
            status: JobStatus::Pending,
            variant_code: "BASE".to_string(),
            customer_name: "Customer".to_string(),
            address: "1 Elm St".to_string(),
            location,
            created_at: Utc::now(),
            metadata: JobMetadata::default(),
        };
        let Ok(()) = store.insert_job(&job).await else {
            panic!("seed job failed");
        };
        job
    }

    async fn seed_pro(store: &MemoryStore, miles_away: f64) -> Pro {
        let pro = Pro {
            id: ProId::new(),
            active: true,
            location: Some(GeoPoint::new(JOB_LOC.lat + miles_away / 69.0, JOB_LOC.lng)),
            service_radius_miles: Some(35.0),
            daily_capacity: 4,
            rating: 4.5,
            open_jobs: 0,
        };
        let Ok(()) = store.insert_pro(&pro).await else {
            panic!("seed pro failed");
        };
        pro
    }

    async fn seed_line(store: &MemoryStore, job_id: JobId, variant: &str, price: f64) {
        let line = JobLine {
            id: uuid::Uuid::new_v4(),
            job_id,
            variant_code: variant.to_string(),
            quantity: 1,
            customer_price: price,
            payout: None,
        };
        let Ok(()) = store.insert_job_line(&line).await else {
            panic!("seed line failed");
        };
    }

    #[tokio::test]
    async fn find_candidates_ranks_nearest_first() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let near = seed_pro(&store, 2.0).await;
        let _far = seed_pro(&store, 20.0).await;

        let candidates = service.find_candidates(job.id).await;
        let Ok(candidates) = candidates else {
            panic!("find_candidates failed");
        };
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].pro_id, near.id);
        assert!(candidates[0].in_radius);
    }

    #[tokio::test]
    async fn find_candidates_without_coordinates_is_empty_not_error() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, None).await;
        let _pro = seed_pro(&store, 2.0).await;

        let candidates = service.find_candidates(job.id).await;
        assert_eq!(candidates.ok().map(|c| c.len()), Some(0));
    }

    #[tokio::test]
    async fn create_offer_moves_job_to_offered() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 3.0).await;

        let created = service.create_offer(job.id, pro.id, None, None).await;
        let Ok(created) = created else {
            panic!("create_offer failed");
        };
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].state, AssignmentState::Offered);
        assert!(created[0].distance_miles.is_some());

        let job = store.get_job(job.id).await;
        assert_eq!(job.ok().map(|j| j.status), Some(JobStatus::Offered));
    }

    #[tokio::test]
    async fn duplicate_active_offer_for_same_pro_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 3.0).await;

        assert!(service.create_offer(job.id, pro.id, None, None).await.is_ok());
        let second = service.create_offer(job.id, pro.id, None, None).await;
        assert!(matches!(second, Err(DispatchError::InvalidAction(_))));
    }

    #[tokio::test]
    async fn split_without_teammate_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 3.0).await;

        let result = service
            .create_offer(
                job.id,
                pro.id,
                None,
                Some(SplitMode::Percentage {
                    primary_percent: 60.0,
                }),
            )
            .await;
        assert!(matches!(result, Err(DispatchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn accept_closes_sibling_offers_and_takes_job() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let winner = seed_pro(&store, 2.0).await;
        let loser = seed_pro(&store, 4.0).await;

        let Ok(first) = service.create_offer(job.id, winner.id, None, None).await else {
            panic!("offer failed");
        };
        let Ok(second) = service.create_offer(job.id, loser.id, None, None).await else {
            panic!("offer failed");
        };

        let accepted = service
            .respond_to_offer(first[0].id, OfferAction::Accept, Some(winner.id))
            .await;
        assert!(accepted.is_ok());

        // The sibling offer is closed; accepting it now fails clearly.
        let late = service
            .respond_to_offer(second[0].id, OfferAction::Accept, Some(loser.id))
            .await;
        assert!(matches!(late, Err(DispatchError::OfferNoLongerAvailable(_))));

        let job = store.get_job(job.id).await;
        assert_eq!(job.ok().map(|j| j.status), Some(JobStatus::Accepted));
    }

    #[tokio::test]
    async fn decline_frees_the_job() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 2.0).await;

        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };
        let declined = service
            .respond_to_offer(offers[0].id, OfferAction::Decline, Some(pro.id))
            .await;
        assert_eq!(
            declined.ok().map(|a| a.state),
            Some(AssignmentState::Declined)
        );

        let job = store.get_job(job.id).await;
        assert_eq!(job.ok().map(|j| j.status), Some(JobStatus::Pending));
    }

    #[tokio::test]
    async fn acting_pro_mismatch_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 2.0).await;
        let intruder = seed_pro(&store, 3.0).await;

        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };
        let result = service
            .respond_to_offer(offers[0].id, OfferAction::Accept, Some(intruder.id))
            .await;
        assert!(matches!(result, Err(DispatchError::InvalidRequest(_))));
    }

    async fn accepted_assignment(
        store: &Arc<MemoryStore>,
        service: &DispatchService,
        variant: &str,
        price: f64,
    ) -> (Job, Pro, Assignment) {
        let job = seed_job(store, Some(JOB_LOC)).await;
        seed_line(store, job.id, variant, price).await;
        let pro = seed_pro(store, 2.0).await;
        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };
        let Ok(assignment) = service
            .respond_to_offer(offers[0].id, OfferAction::Accept, Some(pro.id))
            .await
        else {
            panic!("accept failed");
        };
        (job, pro, assignment)
    }

    #[tokio::test]
    async fn complete_settles_payout_and_updates_job() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let (job, pro, assignment) =
            accepted_assignment(&store, &service, "BASE", 200.0).await;

        let outcome = service.complete_assignment(assignment.id, Some(pro.id)).await;
        let Ok(outcome) = outcome else {
            panic!("complete failed");
        };
        assert_eq!(outcome.assignment.state, AssignmentState::Completed);
        assert_eq!(outcome.ledger_entries.len(), 1);
        assert!((outcome.ledger_entries[0].amount - 79.20).abs() < 0.005);

        let job = store.get_job(job.id).await;
        assert_eq!(job.ok().map(|j| j.status), Some(JobStatus::Completed));
    }

    #[tokio::test]
    async fn complete_twice_is_noop_and_does_not_duplicate_entries() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let (job, pro, assignment) =
            accepted_assignment(&store, &service, "BYO", 100.0).await;

        let first = service.complete_assignment(assignment.id, Some(pro.id)).await;
        assert!(first.is_ok());

        let second = service.complete_assignment(assignment.id, Some(pro.id)).await;
        let Ok(second) = second else {
            panic!("idempotent complete failed");
        };
        assert_eq!(second.ledger_entries.len(), 1);

        let entries = store.list_ledger_entries_for_job(job.id).await;
        assert_eq!(entries.ok().map(|e| e.len()), Some(1));
    }

    #[tokio::test]
    async fn complete_is_refused_when_prerequisites_unmet() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let (_, pro, assignment) = accepted_assignment(&store, &service, "BASE", 200.0).await;

        let gated = gated_service(Arc::clone(&store));
        let result = gated.complete_assignment(assignment.id, Some(pro.id)).await;
        assert!(matches!(result, Err(DispatchError::PrerequisitesNotMet(_))));
    }

    #[tokio::test]
    async fn complete_from_offered_is_illegal() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 2.0).await;
        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };

        let result = service.complete_assignment(offers[0].id, Some(pro.id)).await;
        assert!(matches!(
            result,
            Err(DispatchError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn team_split_settles_two_entries_summing_to_total() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        seed_line(&store, job.id, "BASE", 200.0).await;
        let primary = seed_pro(&store, 2.0).await;
        let secondary = seed_pro(&store, 5.0).await;

        let Ok(offers) = service
            .create_offer(
                job.id,
                primary.id,
                Some(secondary.id),
                Some(SplitMode::Percentage {
                    primary_percent: 60.0,
                }),
            )
            .await
        else {
            panic!("offer failed");
        };
        assert_eq!(offers.len(), 2);

        let Ok(_) = service
            .respond_to_offer(offers[0].id, OfferAction::Accept, Some(primary.id))
            .await
        else {
            panic!("accept failed");
        };
        let outcome = service
            .complete_assignment(offers[0].id, Some(primary.id))
            .await;
        let Ok(outcome) = outcome else {
            panic!("complete failed");
        };

        assert_eq!(outcome.ledger_entries.len(), 2);
        let sum: f64 = outcome.ledger_entries.iter().map(|e| e.amount).sum();
        assert!((sum - 79.20).abs() < 0.005, "split must sum to total, got {sum}");
    }

    #[tokio::test]
    async fn teammate_acceptor_is_paid_the_secondary_share() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        seed_line(&store, job.id, "BASE", 200.0).await;
        let primary = seed_pro(&store, 2.0).await;
        let teammate = seed_pro(&store, 5.0).await;

        let Ok(offers) = service
            .create_offer(
                job.id,
                primary.id,
                Some(teammate.id),
                Some(SplitMode::Percentage {
                    primary_percent: 60.0,
                }),
            )
            .await
        else {
            panic!("offer failed");
        };

        // The teammate wins the race, not the primary.
        let Ok(_) = service
            .respond_to_offer(offers[1].id, OfferAction::Accept, Some(teammate.id))
            .await
        else {
            panic!("accept failed");
        };
        let outcome = service
            .complete_assignment(offers[1].id, Some(teammate.id))
            .await;
        let Ok(outcome) = outcome else {
            panic!("complete failed");
        };

        // Only the teammate's 40% share is owed: 79.20 * 0.40 = 31.68.
        assert_eq!(outcome.ledger_entries.len(), 1);
        assert_eq!(outcome.ledger_entries[0].pro_id, teammate.id);
        assert!((outcome.ledger_entries[0].amount - 31.68).abs() < 0.005);

        let entries = store.list_ledger_entries_for_job(job.id).await;
        assert_eq!(entries.ok().map(|e| e.len()), Some(1));

        // A backfill sweep over the same state agrees: nothing to add.
        let reconciler = crate::service::reconciler::LedgerReconciler::new(
            Arc::clone(&store) as Arc<dyn crate::persistence::Store>,
            EventBus::new(100),
            PayoutConfig::default(),
        );
        let report = reconciler
            .reconcile(crate::service::reconciler::ReconcileScope::All)
            .await;
        let Ok(report) = report else {
            panic!("reconcile failed");
        };
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn zero_payout_is_not_ledgered() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        // No lines and no estimated payout → total 0.
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 2.0).await;
        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };
        let Ok(_) = service
            .respond_to_offer(offers[0].id, OfferAction::Accept, Some(pro.id))
            .await
        else {
            panic!("accept failed");
        };

        let outcome = service.complete_assignment(offers[0].id, Some(pro.id)).await;
        let Ok(outcome) = outcome else {
            panic!("complete failed");
        };
        assert!(outcome.ledger_entries.is_empty());
    }

    #[tokio::test]
    async fn each_mutation_publishes_its_event() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let mut rx = service.event_bus().subscribe();

        let job = seed_job(&store, Some(JOB_LOC)).await;
        seed_line(&store, job.id, "BASE", 200.0).await;
        let pro = seed_pro(&store, 2.0).await;

        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };
        let Ok(_) = service
            .respond_to_offer(offers[0].id, OfferAction::Accept, Some(pro.id))
            .await
        else {
            panic!("accept failed");
        };
        let Ok(_) = service.complete_assignment(offers[0].id, Some(pro.id)).await else {
            panic!("complete failed");
        };

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.event_type_str());
        }
        assert_eq!(
            seen,
            vec![
                "offer_created",
                "offer_accepted",
                "payout_recorded",
                "assignment_completed",
            ]
        );
    }

    #[tokio::test]
    async fn cancel_frees_the_job() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let job = seed_job(&store, Some(JOB_LOC)).await;
        let pro = seed_pro(&store, 2.0).await;
        let Ok(offers) = service.create_offer(job.id, pro.id, None, None).await else {
            panic!("offer failed");
        };

        let canceled = service.cancel_assignment(offers[0].id).await;
        assert_eq!(
            canceled.ok().map(|a| a.state),
            Some(AssignmentState::Canceled)
        );
        let job = store.get_job(job.id).await;
        assert_eq!(job.ok().map(|j| j.status), Some(JobStatus::Pending));
    }

    #[tokio::test]
    async fn cancel_after_acceptance_reopens_the_job() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let (job, _pro, assignment) =
            accepted_assignment(&store, &service, "BASE", 200.0).await;

        let canceled = service.cancel_assignment(assignment.id).await;
        assert_eq!(
            canceled.ok().map(|a| a.state),
            Some(AssignmentState::Canceled)
        );

        // No payout was settled and the job is dispatchable again.
        let entries = store.list_ledger_entries_for_job(job.id).await;
        assert_eq!(entries.ok().map(|e| e.len()), Some(0));
        let job = store.get_job(job.id).await;
        assert_eq!(job.ok().map(|j| j.status), Some(JobStatus::Pending));
    }
}
