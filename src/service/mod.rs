//! Service layer: business logic orchestration.
//!
//! [`DispatchService`] coordinates offers, assignment transitions, and
//! settlement; [`LedgerReconciler`] backfills missing payout entries.
//! Both delegate all payout math to [`crate::domain::payout`] so the
//! two call sites agree bit-for-bit.

pub mod collaborators;
pub mod dispatch_service;
pub mod reconciler;

pub use collaborators::{AlwaysReady, CompletionGate, Geocoder, NoopGeocoder};
pub use dispatch_service::{CompletionOutcome, DispatchService, OfferAction};
pub use reconciler::{LedgerReconciler, ReconcileReport, ReconcileScope};
