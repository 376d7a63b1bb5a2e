//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::{DispatchService, LedgerReconciler};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dispatch service for offers, responses, and settlement.
    pub dispatch: Arc<DispatchService>,
    /// Ledger reconciler for payout backfill sweeps.
    pub reconciler: Arc<LedgerReconciler>,
    /// Event bus feeding the notification bridge.
    pub event_bus: EventBus,
}
