//! Team splits: dividing one job's payout between two pros.

use serde::{Deserialize, Serialize};

use super::ids::{JobId, ProId};
use crate::error::DispatchError;

/// How a job's payout is divided between primary and secondary pro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitMode {
    /// Primary takes `primary_percent` of the total; the secondary gets
    /// the exact remainder, so the two shares always sum to the total.
    Percentage {
        /// Primary pro's share, 0–100.
        primary_percent: f64,
    },
    /// Two independently specified flat amounts. The system does not
    /// enforce that they sum to the job total; operations may
    /// deliberately under- or over-allocate.
    Flat {
        /// Primary pro's flat amount.
        primary_amount: f64,
        /// Secondary pro's flat amount.
        secondary_amount: f64,
    },
}

/// Declares a secondary pro on a job and how to divide the payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSplit {
    /// Job the split applies to.
    pub job_id: JobId,
    /// The teammate receiving the secondary share.
    pub secondary_pro_id: ProId,
    /// Division mode.
    pub mode: SplitMode,
}

impl TeamSplit {
    /// Validates the split's construction-time invariants.
    ///
    /// Percentage mode requires `primary_percent` in `[0, 100]`; flat
    /// mode requires non-negative amounts but deliberately does not
    /// check that they sum to anything.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidRequest`] when a bound is violated.
    pub fn validate(&self) -> Result<(), DispatchError> {
        match self.mode {
            SplitMode::Percentage { primary_percent } => {
                if !(0.0..=100.0).contains(&primary_percent) {
                    return Err(DispatchError::InvalidRequest(format!(
                        "primary_percent must be within 0-100, got {primary_percent}"
                    )));
                }
            }
            SplitMode::Flat {
                primary_amount,
                secondary_amount,
            } => {
                if primary_amount < 0.0 || secondary_amount < 0.0 {
                    return Err(DispatchError::InvalidRequest(
                        "flat split amounts must be non-negative".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(mode: SplitMode) -> TeamSplit {
        TeamSplit {
            job_id: JobId::new(),
            secondary_pro_id: ProId::new(),
            mode,
        }
    }

    #[test]
    fn percentage_within_bounds_is_valid() {
        let s = split(SplitMode::Percentage {
            primary_percent: 60.0,
        });
        assert!(s.validate().is_ok());
    }

    #[test]
    fn percentage_out_of_bounds_is_rejected() {
        let s = split(SplitMode::Percentage {
            primary_percent: 120.0,
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn flat_amounts_need_not_sum_to_anything() {
        // The permissive flat-mode behavior is intentional.
        let s = split(SplitMode::Flat {
            primary_amount: 10.0,
            secondary_amount: 500.0,
        });
        assert!(s.validate().is_ok());
    }

    #[test]
    fn negative_flat_amount_is_rejected() {
        let s = split(SplitMode::Flat {
            primary_amount: -1.0,
            secondary_amount: 5.0,
        });
        assert!(s.validate().is_err());
    }
}
