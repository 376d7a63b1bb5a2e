//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers cross the wire as plain UUIDs and states as their stable
//! snake_case strings, so payloads stay stable across internal refactors.

pub mod assignment_dto;
pub mod candidate_dto;
pub mod offer_dto;
pub mod reconcile_dto;

pub use assignment_dto::*;
pub use candidate_dto::*;
pub use offer_dto::*;
pub use reconcile_dto::*;
