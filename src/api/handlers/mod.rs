//! REST endpoint handlers organized by resource.

pub mod assignments;
pub mod candidates;
pub mod offers;
pub mod reconcile;
pub mod system;

use axum::Router;
use axum::http::HeaderMap;

use crate::app_state::AppState;
use crate::domain::ProId;
use crate::error::DispatchError;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(candidates::routes())
        .merge(offers::routes())
        .merge(assignments::routes())
        .merge(reconcile::routes())
}

/// Header carrying the authenticated pro's id on pro-initiated calls.
pub const PRO_ID_HEADER: &str = "x-pro-id";

/// Extracts the acting pro from the `x-pro-id` header.
///
/// A missing header means the caller is trusted (admin/internal path);
/// a present but malformed header is a client error.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidRequest`] when the header value is
/// not a valid UUID.
pub fn acting_pro(headers: &HeaderMap) -> Result<Option<ProId>, DispatchError> {
    let Some(value) = headers.get(PRO_ID_HEADER) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|_| {
        DispatchError::InvalidRequest(format!("{PRO_ID_HEADER} header is not valid text"))
    })?;
    let id = text.parse::<uuid::Uuid>().map_err(|_| {
        DispatchError::InvalidRequest(format!("{PRO_ID_HEADER} header is not a valid UUID"))
    })?;
    Ok(Some(ProId::from_uuid(id)))
}
