//! Assignment lifecycle handlers: respond, complete, cancel.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::acting_pro;
use crate::api::dto::{AssignmentDto, CompletionResponse, LedgerEntryDto, RespondRequest};
use crate::app_state::AppState;
use crate::domain::AssignmentId;
use crate::error::{DispatchError, ErrorResponse};
use crate::service::OfferAction;

/// `POST /assignments/:id/respond` — Accept or decline an open offer.
///
/// # Errors
///
/// Returns [`DispatchError::OfferNoLongerAvailable`] when the offer was
/// already taken or closed.
#[utoipa::path(
    post,
    path = "/api/v1/assignments/{id}/respond",
    tag = "Assignments",
    summary = "Respond to an offer",
    description = "Applies the pro's accept/decline response. First acceptance wins; sibling open offers are closed. The x-pro-id header, when present, must match the assignment holder.",
    params(
        ("id" = uuid::Uuid, Path, description = "Assignment UUID"),
        ("x-pro-id" = Option<uuid::Uuid>, Header, description = "Authenticated pro id"),
    ),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Updated assignment", body = AssignmentDto),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Offer no longer available", body = ErrorResponse),
    )
)]
pub async fn respond(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<RespondRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let action = match req.action.as_str() {
        "accept" => OfferAction::Accept,
        "decline" => OfferAction::Decline,
        other => {
            return Err(DispatchError::InvalidRequest(format!(
                "unknown action: {other} (expected accept or decline)"
            )));
        }
    };

    let assignment = state
        .dispatch
        .respond_to_offer(AssignmentId::from_uuid(id), action, acting_pro(&headers)?)
        .await?;
    Ok(Json(AssignmentDto::from(assignment)))
}

/// `POST /assignments/:id/complete` — Complete work and settle payout.
///
/// # Errors
///
/// Returns [`DispatchError::PrerequisitesNotMet`] when required
/// completion artifacts are missing, and
/// [`DispatchError::IllegalTransition`] from non-accepted states.
#[utoipa::path(
    post,
    path = "/api/v1/assignments/{id}/complete",
    tag = "Assignments",
    summary = "Complete an assignment",
    description = "Marks the assignment completed and settles the payout ledger entries. Completing an already-completed assignment is an idempotent no-op returning the previously settled entries.",
    params(
        ("id" = uuid::Uuid, Path, description = "Assignment UUID"),
        ("x-pro-id" = Option<uuid::Uuid>, Header, description = "Authenticated pro id"),
    ),
    responses(
        (status = 200, description = "Completed assignment and its ledger entries", body = CompletionResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Illegal transition", body = ErrorResponse),
        (status = 422, description = "Completion prerequisites not met", body = ErrorResponse),
    )
)]
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, DispatchError> {
    let outcome = state
        .dispatch
        .complete_assignment(AssignmentId::from_uuid(id), acting_pro(&headers)?)
        .await?;

    Ok(Json(CompletionResponse {
        assignment: AssignmentDto::from(outcome.assignment),
        ledger_entries: outcome
            .ledger_entries
            .into_iter()
            .map(LedgerEntryDto::from)
            .collect(),
    }))
}

/// `POST /assignments/:id/cancel` — Administratively cancel an assignment.
///
/// # Errors
///
/// Returns [`DispatchError::IllegalTransition`] from terminal states.
#[utoipa::path(
    post,
    path = "/api/v1/assignments/{id}/cancel",
    tag = "Assignments",
    summary = "Cancel an assignment",
    description = "Cancels an offered or accepted assignment and frees the job when no active assignment remains.",
    params(
        ("id" = uuid::Uuid, Path, description = "Assignment UUID"),
    ),
    responses(
        (status = 200, description = "Canceled assignment", body = AssignmentDto),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Illegal transition", body = ErrorResponse),
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, DispatchError> {
    let assignment = state
        .dispatch
        .cancel_assignment(AssignmentId::from_uuid(id))
        .await?;
    Ok(Json(AssignmentDto::from(assignment)))
}

/// Assignment lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assignments/{id}/respond", post(respond))
        .route("/assignments/{id}/complete", post(complete))
        .route("/assignments/{id}/cancel", post(cancel))
}
