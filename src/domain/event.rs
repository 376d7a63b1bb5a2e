//! Domain events reflecting assignment lifecycle mutations, and the
//! bus that carries them.
//!
//! Every state change emits a [`DispatchEvent`] through the
//! [`EventBus`]. The notification bridge consumes them to send offers,
//! reminders, and payout notices; delivery is fire-and-forget from the
//! dispatch path's perspective.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::ids::{AssignmentId, JobId, ProId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// An offer was created for a pro.
    OfferCreated {
        /// Assignment holding the offer.
        assignment_id: AssignmentId,
        /// Job being offered.
        job_id: JobId,
        /// Pro receiving the offer.
        pro_id: ProId,
        /// Distance at offer time, when known.
        distance_miles: Option<f64>,
        /// Offer timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pro accepted an offer; sibling offers are closed.
    OfferAccepted {
        /// Accepted assignment.
        assignment_id: AssignmentId,
        /// Job that is now taken.
        job_id: JobId,
        /// Winning pro.
        pro_id: ProId,
        /// Acceptance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pro declined an offer; the job is free for re-offering.
    OfferDeclined {
        /// Declined assignment.
        assignment_id: AssignmentId,
        /// Job freed for the next candidate.
        job_id: JobId,
        /// Declining pro.
        pro_id: ProId,
        /// Decline timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An assignment was completed.
    AssignmentCompleted {
        /// Completed assignment.
        assignment_id: AssignmentId,
        /// Completed job.
        job_id: JobId,
        /// Pro who did the work.
        pro_id: ProId,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An assignment was administratively canceled.
    AssignmentCanceled {
        /// Canceled assignment.
        assignment_id: AssignmentId,
        /// Affected job.
        job_id: JobId,
        /// Affected pro.
        pro_id: ProId,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A payout ledger entry was written for a pro.
    PayoutRecorded {
        /// Settled job.
        job_id: JobId,
        /// Pro receiving the payout.
        pro_id: ProId,
        /// Payout amount in dollars.
        amount: f64,
        /// Whether the reconciler backfilled this entry.
        backfilled: bool,
        /// Write timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DispatchEvent {
    /// Snake-case discriminant string, for logging and filtering.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::OfferCreated { .. } => "offer_created",
            Self::OfferAccepted { .. } => "offer_accepted",
            Self::OfferDeclined { .. } => "offer_declined",
            Self::AssignmentCompleted { .. } => "assignment_completed",
            Self::AssignmentCanceled { .. } => "assignment_canceled",
            Self::PayoutRecorded { .. } => "payout_recorded",
        }
    }

    /// The job the event concerns.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        match self {
            Self::OfferCreated { job_id, .. }
            | Self::OfferAccepted { job_id, .. }
            | Self::OfferDeclined { job_id, .. }
            | Self::AssignmentCompleted { job_id, .. }
            | Self::AssignmentCanceled { job_id, .. }
            | Self::PayoutRecorded { job_id, .. } => *job_id,
        }
    }

    /// The pro the event concerns.
    #[must_use]
    pub const fn pro_id(&self) -> ProId {
        match self {
            Self::OfferCreated { pro_id, .. }
            | Self::OfferAccepted { pro_id, .. }
            | Self::OfferDeclined { pro_id, .. }
            | Self::AssignmentCompleted { pro_id, .. }
            | Self::AssignmentCanceled { pro_id, .. }
            | Self::PayoutRecorded { pro_id, .. } => *pro_id,
        }
    }
}

/// Fan-out channel carrying [`DispatchEvent`]s from the mutation paths
/// to whoever is listening.
///
/// Cloning is cheap; every clone publishes into the same underlying
/// broadcast channel. Publishing never blocks the dispatch path: a
/// subscriber that falls more than `capacity` events behind loses the
/// oldest ones and learns how many it missed on its next receive.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Delivers `event` to every live subscriber, returning how many
    /// there were. With no subscribers the event is dropped; mutations
    /// never depend on anyone listening.
    pub fn publish(&self, event: DispatchEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Opens a subscription starting from the next published event.
    /// Events published before this call are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
