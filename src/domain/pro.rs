//! Pro entity: an independent contractor eligible to be offered jobs.

use serde::{Deserialize, Serialize};

use super::GeoPoint;
use super::ids::ProId;

/// A contractor profile, read-only from the dispatch core's perspective.
///
/// Created at signup and mutated by profile updates elsewhere; the
/// dispatch path only reads pros by active status and location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pro {
    /// Unique pro identifier.
    pub id: ProId,
    /// Whether the pro is currently accepting work.
    pub active: bool,
    /// Home-base coordinates; `None` when the profile was never geocoded.
    pub location: Option<GeoPoint>,
    /// Pro-specific service radius in miles. `None` falls back to the
    /// configured default radius when ranking.
    pub service_radius_miles: Option<f64>,
    /// Maximum jobs per day the pro will take.
    pub daily_capacity: u32,
    /// Average customer rating, 0.0–5.0.
    pub rating: f64,
    /// Derived count of currently open (offered or accepted) jobs.
    pub open_jobs: u32,
}
