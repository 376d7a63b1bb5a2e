//! Candidate-ranking DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ranking::RankedCandidate;

/// One ranked candidate for a job.
#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateDto {
    /// Pro identifier.
    pub pro_id: uuid::Uuid,
    /// Great-circle distance from the job, in miles.
    pub distance_miles: f64,
    /// Whether the pro is inside their service radius.
    pub in_radius: bool,
    /// Miles beyond the radius, for the nearest-fallback candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub over_radius_miles: Option<f64>,
    /// Pro rating used as the final ranking key.
    pub rating: f64,
    /// Active assignment count used as the load ranking key.
    pub open_jobs: u32,
}

impl From<RankedCandidate> for CandidateDto {
    fn from(c: RankedCandidate) -> Self {
        Self {
            pro_id: *c.pro_id.as_uuid(),
            distance_miles: c.distance_miles,
            in_radius: c.in_radius,
            over_radius_miles: c.over_radius_miles,
            rating: c.rating,
            open_jobs: c.open_jobs,
        }
    }
}

/// Response body for `GET /jobs/{id}/candidates`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateListResponse {
    /// Job the candidates were ranked for.
    pub job_id: uuid::Uuid,
    /// Candidates in dispatch order.
    pub data: Vec<CandidateDto>,
}
