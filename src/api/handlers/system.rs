//! System endpoints: health check and payout tier catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::VariantTier;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Payout tier info for one service variant.
#[derive(Debug, Serialize, ToSchema)]
struct PayoutTierInfo {
    variant_code: &'static str,
    description: &'static str,
    materials_pct: f64,
    pro_pct: f64,
}

/// `GET /config/payout-tiers` — List payout tiers by service variant.
#[utoipa::path(
    get,
    path = "/config/payout-tiers",
    tag = "System",
    summary = "List payout tiers",
    description = "Returns the materials and pro percentage for every service variant tier. Unrecognized variant codes settle on the standard tier.",
    responses(
        (status = 200, description = "Payout tier catalog", body = Vec<PayoutTierInfo>),
    )
)]
pub async fn payout_tiers_handler() -> impl IntoResponse {
    let tiers = vec![
        PayoutTierInfo {
            variant_code: "BYO",
            description: "Customer supplies materials; labor-only payout",
            materials_pct: VariantTier::Byo.materials_pct(),
            pro_pct: VariantTier::Byo.pro_pct(),
        },
        PayoutTierInfo {
            variant_code: "BASE",
            description: "Standard service with supplied materials",
            materials_pct: VariantTier::Base.materials_pct(),
            pro_pct: VariantTier::Base.pro_pct(),
        },
        PayoutTierInfo {
            variant_code: "H2S",
            description: "Premium bundle with high-end materials",
            materials_pct: VariantTier::H2s.materials_pct(),
            pro_pct: VariantTier::H2s.pro_pct(),
        },
    ];
    (StatusCode::OK, Json(tiers))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/payout-tiers", get(payout_tiers_handler))
}
