//! Candidate-ranking handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CandidateDto, CandidateListResponse};
use crate::app_state::AppState;
use crate::domain::JobId;
use crate::error::{DispatchError, ErrorResponse};

/// `GET /jobs/:id/candidates` — Rank active pros for a job.
///
/// # Errors
///
/// Returns [`DispatchError::JobNotFound`] if the job does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}/candidates",
    tag = "Candidates",
    summary = "Rank candidates for a job",
    description = "Returns active pros ranked by distance, load, and rating. Near-ties in distance are shuffled so the same few pros do not always rank first. A job with no usable coordinates yields an empty list.",
    params(
        ("id" = uuid::Uuid, Path, description = "Job UUID"),
    ),
    responses(
        (status = 200, description = "Candidates in dispatch order", body = CandidateListResponse),
        (status = 404, description = "Job not found", body = ErrorResponse),
    )
)]
pub async fn list_candidates(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, DispatchError> {
    let job_id = JobId::from_uuid(id);
    let candidates = state.dispatch.find_candidates(job_id).await?;

    Ok(Json(CandidateListResponse {
        job_id: id,
        data: candidates.into_iter().map(CandidateDto::from).collect(),
    }))
}

/// Candidate routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/jobs/{id}/candidates", get(list_candidates))
}
