//! Offer-creation DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::assignment_dto::AssignmentDto;
use crate::domain::SplitMode;

/// Team split payload on offer creation.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TeamSplitDto {
    /// Primary takes a percentage of the payout; the teammate gets the
    /// exact remainder.
    Percentage {
        /// Primary pro's share in percent (0–100).
        primary_percent: f64,
    },
    /// Explicit dollar amounts for both pros, passed through unnormalized.
    Flat {
        /// Primary pro's amount in dollars.
        primary_amount: f64,
        /// Teammate's amount in dollars.
        secondary_amount: f64,
    },
}

impl From<TeamSplitDto> for SplitMode {
    fn from(dto: TeamSplitDto) -> Self {
        match dto {
            TeamSplitDto::Percentage { primary_percent } => {
                Self::Percentage { primary_percent }
            }
            TeamSplitDto::Flat {
                primary_amount,
                secondary_amount,
            } => Self::Flat {
                primary_amount,
                secondary_amount,
            },
        }
    }
}

/// Request body for `POST /offers`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOfferRequest {
    /// Job to offer.
    pub job_id: uuid::Uuid,
    /// Pro receiving the primary offer.
    pub pro_id: uuid::Uuid,
    /// Optional teammate receiving a second offer.
    #[serde(default)]
    pub teammate_id: Option<uuid::Uuid>,
    /// Optional payout split; requires `teammate_id`.
    #[serde(default)]
    pub team_split: Option<TeamSplitDto>,
}

/// Response body for `POST /offers` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOfferResponse {
    /// Created assignment(s): primary first, teammate second.
    pub data: Vec<AssignmentDto>,
}
