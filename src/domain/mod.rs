//! Domain layer: entities, pure calculators, and the event system.
//!
//! This module contains the dispatch domain model — jobs, pros,
//! assignments, job lines, team splits, and ledger entries — plus the
//! two pure calculators (great-circle ranking and payout math) and the
//! broadcast event bus that feeds the notification bridge.

pub mod assignment;
pub mod event;
pub mod geo;
pub mod ids;
pub mod job;
pub mod ledger;
pub mod line;
pub mod payout;
pub mod pro;
pub mod ranking;
pub mod team_split;

pub use assignment::{Assignment, AssignmentState};
pub use event::{DispatchEvent, EventBus};
pub use geo::GeoPoint;
pub use ids::{AssignmentId, JobId, LedgerEntryId, ProId};
pub use job::{Job, JobMetadata, JobStatus};
pub use ledger::{LedgerEntry, LedgerState};
pub use line::{JobLine, VariantTier};
pub use pro::Pro;
pub use team_split::{SplitMode, TeamSplit};
