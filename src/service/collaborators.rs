//! External collaborator contracts consumed by the dispatch path.
//!
//! Geocoding and completion-prerequisite checks live outside this core;
//! only their trigger contracts are defined here, with inert defaults
//! for tests and store-less runs.

use async_trait::async_trait;

use crate::domain::{Assignment, GeoPoint, Job};

/// Address → coordinates lookup.
///
/// Failures return `None`, never an error — geocoding problems must not
/// throw into the dispatch path.
#[async_trait]
pub trait Geocoder: Send + Sync + std::fmt::Debug {
    /// Resolves a street address to coordinates, or `None` on failure.
    async fn geocode(&self, address: &str) -> Option<GeoPoint>;
}

/// Geocoder that never resolves anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, _address: &str) -> Option<GeoPoint> {
        None
    }
}

/// Completion-prerequisite check (e.g. required proof-of-work
/// artifacts). The state machine refuses the `complete` transition
/// while this reports unmet prerequisites.
#[async_trait]
pub trait CompletionGate: Send + Sync + std::fmt::Debug {
    /// Whether the assignment may be completed.
    async fn prerequisites_met(&self, assignment: &Assignment, job: &Job) -> bool;
}

/// Gate that always passes, for environments without an artifact check.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReady;

#[async_trait]
impl CompletionGate for AlwaysReady {
    async fn prerequisites_met(&self, _assignment: &Assignment, _job: &Job) -> bool {
        true
    }
}
