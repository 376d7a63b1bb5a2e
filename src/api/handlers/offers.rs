//! Offer-creation handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AssignmentDto, CreateOfferRequest, CreateOfferResponse};
use crate::app_state::AppState;
use crate::domain::{JobId, ProId};
use crate::error::{DispatchError, ErrorResponse};

/// `POST /offers` — Offer a job to a pro, optionally with a teammate.
///
/// # Errors
///
/// Returns [`DispatchError`] when the job is closed to offers, the pro
/// is inactive or already holds an active assignment, or the split is
/// invalid.
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    tag = "Offers",
    summary = "Create an offer",
    description = "Creates an offer assignment for the given pro, and a second one for an optional teammate. A team_split requires a teammate and is recorded for settlement.",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer(s) created", body = CreateOfferResponse),
        (status = 400, description = "Invalid request or job not open for offers", body = ErrorResponse),
        (status = 404, description = "Job or pro not found", body = ErrorResponse),
    )
)]
pub async fn create_offer(
    State(state): State<AppState>,
    Json(req): Json<CreateOfferRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let created = state
        .dispatch
        .create_offer(
            JobId::from_uuid(req.job_id),
            ProId::from_uuid(req.pro_id),
            req.teammate_id.map(ProId::from_uuid),
            req.team_split.map(Into::into),
        )
        .await?;

    let response = CreateOfferResponse {
        data: created.into_iter().map(AssignmentDto::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Offer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/offers", post(create_offer))
}
