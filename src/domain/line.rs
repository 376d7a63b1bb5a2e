//! Job line items and the variant tier table.

use serde::{Deserialize, Serialize};

use super::ids::JobId;

/// Pricing tier of a job line, derived from its variant code.
///
/// The tier drives the payout percentages: lower-touch tiers pay a
/// higher share of labor to the pro, and tiers with bundled materials
/// carve a larger materials share out of the customer price first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTier {
    /// Customer supplies materials ("bring your own").
    Byo,
    /// Standard service.
    Base,
    /// Premium bundle with high-end materials.
    H2s,
}

impl VariantTier {
    /// Maps a variant code to its tier. Unrecognized codes fall back to
    /// [`VariantTier::Base`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "BYO" => Self::Byo,
            "H2S" => Self::H2s,
            _ => Self::Base,
        }
    }

    /// Estimated materials share of the customer price for this tier.
    #[must_use]
    pub const fn materials_pct(&self) -> f64 {
        match self {
            Self::Byo => 0.0,
            Self::Base => 0.28,
            Self::H2s => 0.38,
        }
    }

    /// Pro's share of the labor base for this tier.
    #[must_use]
    pub const fn pro_pct(&self) -> f64 {
        match self {
            Self::Byo => 0.65,
            Self::Base => 0.55,
            Self::H2s => 0.50,
        }
    }
}

/// A billable line item within a job.
///
/// Immutable once a payout has been settled against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLine {
    /// Unique line identifier.
    pub id: uuid::Uuid,
    /// Parent job.
    pub job_id: JobId,
    /// Service variant code (`"BYO"`, `"BASE"`, `"H2S"`, ...).
    pub variant_code: String,
    /// Quantity, informational; `customer_price` is the line total.
    pub quantity: u32,
    /// Total customer price for this line.
    pub customer_price: f64,
    /// Precomputed pro-payout contribution, when the source order
    /// carried one. `None` means the calculator derives it.
    pub payout: Option<f64>,
}
