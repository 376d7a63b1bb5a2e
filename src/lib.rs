//! # dispatch-gateway
//!
//! REST gateway for dispatching home-service jobs to independent
//! contractors ("pros"), tracking each job's assignment lifecycle, and
//! settling pro payouts once work completes.
//!
//! The gateway is a coordination layer: candidate ranking and payout
//! math live in pure functions under `domain/`, orchestration lives in
//! `service/`, and the shared store is reached through the `persistence/`
//! trait so request handlers stay stateless.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── DispatchService (service/)
//!     ├── LedgerReconciler (service/)
//!     ├── EventBus → NotificationBridge (notify/)
//!     │
//!     ├── Ranking + Payout calculators (domain/)
//!     │
//!     └── Store: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
