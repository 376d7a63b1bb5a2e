//! Ledger reconciliation handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ReconcileRequest, ReconcileResponse};
use crate::app_state::AppState;
use crate::domain::ProId;
use crate::error::{DispatchError, ErrorResponse};
use crate::service::ReconcileScope;

/// `POST /reconcile` — Backfill missing payout ledger entries.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidRequest`] for an unparseable scope.
#[utoipa::path(
    post,
    path = "/api/v1/reconcile",
    tag = "Reconcile",
    summary = "Run a payout reconciliation sweep",
    description = "Sweeps completed assignments and writes any missing payout ledger entries. Idempotent: a second sweep over a settled backlog creates nothing. Scope is \"all\" (default) or a pro UUID.",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Sweep outcome counts", body = ReconcileResponse),
        (status = 400, description = "Invalid scope", body = ErrorResponse),
    )
)]
pub async fn reconcile(
    State(state): State<AppState>,
    Json(req): Json<ReconcileRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let scope = match req.scope.as_deref() {
        None | Some("all") => ReconcileScope::All,
        Some(text) => {
            let id = text.parse::<uuid::Uuid>().map_err(|_| {
                DispatchError::InvalidRequest(format!(
                    "scope must be \"all\" or a pro UUID, got: {text}"
                ))
            })?;
            ReconcileScope::Pro(ProId::from_uuid(id))
        }
    };

    let report = state.reconciler.reconcile(scope).await?;
    Ok(Json(ReconcileResponse::from(report)))
}

/// Reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reconcile", post(reconcile))
}
