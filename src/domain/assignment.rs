//! Assignment entity and its state machine.
//!
//! An [`Assignment`] tracks one pro's relationship to one job. The
//! legal transitions are:
//!
//! ```text
//! offered ──→ accepted ──→ completed
//!    │    └─→ declined
//!    └──────→ canceled   (also legal from accepted)
//! ```
//!
//! Transition guards fail closed: an illegal transition is rejected
//! with a typed error, never coerced into a different state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AssignmentId, JobId, ProId};
use crate::error::DispatchError;

/// State of one pro's relationship to one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    /// Offer is out, awaiting the pro's response.
    Offered,
    /// Pro accepted; work is theirs.
    Accepted,
    /// Pro declined; the job is free for re-offering.
    Declined,
    /// Work is done; payout settles against this state.
    Completed,
    /// Administratively cancelled.
    Canceled,
}

impl AssignmentState {
    /// Stable string form used in the store and API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offered => "offered",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Parses the stable string form back into a state.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] for unrecognized values.
    pub fn parse(s: &str) -> Result<Self, DispatchError> {
        match s {
            "offered" => Ok(Self::Offered),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(DispatchError::Internal(format!(
                "unknown assignment state: {other}"
            ))),
        }
    }

    /// Whether the assignment still occupies the (job, pro) pair.
    /// At most one active assignment may exist per pair.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Offered | Self::Accepted)
    }

    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Completed | Self::Canceled)
    }
}

/// The relationship between one job and one pro attempting the work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique assignment identifier.
    pub id: AssignmentId,
    /// Job being worked.
    pub job_id: JobId,
    /// Pro holding the assignment.
    pub pro_id: ProId,
    /// Current state.
    pub state: AssignmentState,
    /// Great-circle distance at offer time, when both sides had
    /// coordinates.
    pub distance_miles: Option<f64>,
    /// When the offer was created.
    pub offered_at: DateTime<Utc>,
    /// When the pro accepted, if they did.
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the offer was declined or closed, if it was.
    pub declined_at: Option<DateTime<Utc>>,
    /// When the work completed, if it did.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Creates a fresh offer for the given (job, pro) pair.
    #[must_use]
    pub fn new_offer(job_id: JobId, pro_id: ProId, distance_miles: Option<f64>) -> Self {
        Self {
            id: AssignmentId::new(),
            job_id,
            pro_id,
            state: AssignmentState::Offered,
            distance_miles,
            offered_at: Utc::now(),
            accepted_at: None,
            declined_at: None,
            completed_at: None,
        }
    }

    /// Transitions `offered` → `accepted`, recording `accepted_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::OfferNoLongerAvailable`] when the
    /// assignment is not in `offered` state — the caller should surface
    /// this to the pro as "no longer available", not a server error.
    pub fn accept(&mut self) -> Result<(), DispatchError> {
        if self.state != AssignmentState::Offered {
            return Err(DispatchError::OfferNoLongerAvailable(*self.id.as_uuid()));
        }
        self.state = AssignmentState::Accepted;
        self.accepted_at = Some(Utc::now());
        Ok(())
    }

    /// Transitions `offered` → `declined`, freeing the job for
    /// re-offering.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::IllegalTransition`] when the assignment
    /// is not in `offered` state.
    pub fn decline(&mut self) -> Result<(), DispatchError> {
        if self.state != AssignmentState::Offered {
            return Err(self.illegal("decline"));
        }
        self.state = AssignmentState::Declined;
        self.declined_at = Some(Utc::now());
        Ok(())
    }

    /// Transitions `accepted` → `completed`, recording `completed_at`.
    ///
    /// Completing an already-`completed` assignment is an idempotent
    /// no-op success (completion is retried after timeouts and webhook
    /// replays); the return value tells the caller whether anything
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::IllegalTransition`] when the assignment
    /// is in any state other than `accepted` or `completed`.
    pub fn complete(&mut self) -> Result<bool, DispatchError> {
        match self.state {
            AssignmentState::Completed => Ok(false),
            AssignmentState::Accepted => {
                self.state = AssignmentState::Completed;
                self.completed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Err(self.illegal("complete")),
        }
    }

    /// Transitions `offered` or `accepted` → `canceled` (admin override).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::IllegalTransition`] from any terminal
    /// state.
    pub fn cancel(&mut self) -> Result<(), DispatchError> {
        if !self.state.is_active() {
            return Err(self.illegal("cancel"));
        }
        self.state = AssignmentState::Canceled;
        Ok(())
    }

    fn illegal(&self, action: &str) -> DispatchError {
        DispatchError::IllegalTransition {
            from: self.state.as_str().to_string(),
            action: action.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn offer() -> Assignment {
        Assignment::new_offer(JobId::new(), ProId::new(), Some(3.2))
    }

    #[test]
    fn accept_from_offered_records_timestamp() {
        let mut a = offer();
        assert!(a.accept().is_ok());
        assert_eq!(a.state, AssignmentState::Accepted);
        assert!(a.accepted_at.is_some());
    }

    #[test]
    fn accept_from_declined_is_no_longer_available() {
        let mut a = offer();
        assert!(a.decline().is_ok());
        let err = a.accept();
        assert!(matches!(err, Err(DispatchError::OfferNoLongerAvailable(_))));
    }

    #[test]
    fn decline_from_accepted_is_illegal() {
        let mut a = offer();
        assert!(a.accept().is_ok());
        assert!(matches!(
            a.decline(),
            Err(DispatchError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn complete_requires_accepted() {
        let mut a = offer();
        assert!(matches!(
            a.complete(),
            Err(DispatchError::IllegalTransition { .. })
        ));
        assert!(a.accept().is_ok());
        assert_eq!(a.complete().ok(), Some(true));
        assert!(a.completed_at.is_some());
    }

    #[test]
    fn complete_twice_is_idempotent_noop() {
        let mut a = offer();
        assert!(a.accept().is_ok());
        assert_eq!(a.complete().ok(), Some(true));
        // Second completion succeeds but reports no change.
        assert_eq!(a.complete().ok(), Some(false));
        assert_eq!(a.state, AssignmentState::Completed);
    }

    #[test]
    fn cancel_legal_from_offered_and_accepted_only() {
        let mut a = offer();
        assert!(a.cancel().is_ok());
        assert_eq!(a.state, AssignmentState::Canceled);

        let mut b = offer();
        assert!(b.accept().is_ok());
        assert!(b.cancel().is_ok());

        let mut c = offer();
        assert!(c.decline().is_ok());
        assert!(c.cancel().is_err());
    }

    #[test]
    fn active_and_terminal_flags() {
        assert!(AssignmentState::Offered.is_active());
        assert!(AssignmentState::Accepted.is_active());
        assert!(!AssignmentState::Completed.is_active());
        assert!(AssignmentState::Declined.is_terminal());
        assert!(!AssignmentState::Offered.is_terminal());
    }

    #[test]
    fn state_string_round_trip() {
        for state in [
            AssignmentState::Offered,
            AssignmentState::Accepted,
            AssignmentState::Declined,
            AssignmentState::Completed,
            AssignmentState::Canceled,
        ] {
            assert_eq!(AssignmentState::parse(state.as_str()).ok(), Some(state));
        }
    }
}
