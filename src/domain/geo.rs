//! Great-circle distance between geographic points.
//!
//! [`distance_miles`] is the single distance function used for candidate
//! ranking. It never panics: `NaN` coordinates propagate as a `NaN`
//! distance, which ranking treats as "unrankable".

use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles, as used by the dispatch radius checks.
const EARTH_RADIUS_MILES: f64 = 3_958.8;

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in decimal degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when either coordinate is `NaN`.
    #[must_use]
    pub fn is_unrankable(&self) -> bool {
        self.lat.is_nan() || self.lng.is_nan()
    }
}

/// Haversine great-circle distance between two points, in miles.
///
/// `NaN` inputs yield a `NaN` result rather than an error or panic.
#[must_use]
pub fn distance_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = GeoPoint::new(33.4484, -112.0740);
        assert!(distance_miles(p, p).abs() < 1e-9);
    }

    #[test]
    fn phoenix_to_tucson_is_about_108_miles() {
        let phoenix = GeoPoint::new(33.4484, -112.0740);
        let tucson = GeoPoint::new(32.2226, -110.9747);
        let d = distance_miles(phoenix, tucson);
        assert!((d - 108.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(34.0522, -118.2437);
        let d1 = distance_miles(a, b);
        let d2 = distance_miles(b, a);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn nan_input_propagates_as_nan() {
        let a = GeoPoint::new(f64::NAN, -74.0);
        let b = GeoPoint::new(34.0, -118.0);
        assert!(distance_miles(a, b).is_nan());
        assert!(a.is_unrankable());
        assert!(!b.is_unrankable());
    }
}
