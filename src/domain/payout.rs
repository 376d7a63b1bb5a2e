//! Payout calculation: job + line items + optional team split → amounts.
//!
//! [`calculate_payout`] is pure and deterministic for identical inputs.
//! It is the single source of payout math for both first-time
//! settlement and reconciliation backfill, so the two call sites agree
//! bit-for-bit.

use serde::Serialize;

use super::ids::ProId;
use super::job::Job;
use super::line::{JobLine, VariantTier};
use super::team_split::{SplitMode, TeamSplit};

/// Monetary guardrails applied to every derived line payout.
#[derive(Debug, Clone, Copy)]
pub struct PayoutConfig {
    /// Minimum payout per line, so a dispatch is always worth the trip.
    pub floor: f64,
    /// Maximum payout as a fraction of the line's customer price.
    pub cap_pct: f64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            floor: 35.0,
            cap_pct: 0.80,
        }
    }
}

/// How the total was divided between two pros.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitOutcome {
    /// Percentage-mode division; shares sum exactly to the total.
    Percentage {
        /// Primary share, 0–100.
        primary_percent: f64,
    },
    /// Flat-mode division; shares are passed through unnormalized.
    Flat,
}

/// Result of a payout calculation.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutBreakdown {
    /// Job payout total across all lines.
    pub total: f64,
    /// Amount attributable to the primary (assigned) pro.
    pub primary_amount: f64,
    /// Amount attributable to the secondary pro, zero without a split.
    pub secondary_amount: f64,
    /// Split details when a team split was applied.
    pub split: Option<SplitOutcome>,
}

impl PayoutBreakdown {
    /// Attributes the breakdown to concrete pros for the assignment
    /// held by `holder`.
    ///
    /// The holder takes the primary share unless the split names them
    /// as the secondary, in which case only the secondary share is owed
    /// against this assignment. Settlement and reconciliation both go
    /// through here so the two paths cannot disagree on attribution.
    #[must_use]
    pub fn shares_for(&self, holder: ProId, split: Option<&TeamSplit>) -> Vec<(ProId, f64)> {
        match split {
            Some(team) if team.secondary_pro_id == holder => {
                vec![(holder, self.secondary_amount)]
            }
            Some(team) => vec![
                (holder, self.primary_amount),
                (team.secondary_pro_id, self.secondary_amount),
            ],
            None => vec![(holder, self.primary_amount)],
        }
    }
}

/// Rounds to 2 decimal places (cents).
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Payout for a single line.
///
/// A precomputed payout on the line wins; otherwise the amount is
/// derived from the tier table and clamped to
/// `max(floor, min(price * cap_pct, raw))`.
fn line_payout(line: &JobLine, cfg: &PayoutConfig) -> f64 {
    if let Some(precomputed) = line.payout {
        return round2(precomputed);
    }
    let tier = VariantTier::from_code(&line.variant_code);
    let price = line.customer_price;
    let labor_base = price - price * tier.materials_pct();
    let raw = labor_base * tier.pro_pct();
    round2(raw.min(price * cfg.cap_pct).max(cfg.floor))
}

/// Computes the payout breakdown for a job.
///
/// Job total is the sum of per-line payouts; with no lines it falls
/// back to the job's `estimated_payout` metadata (or zero). A team
/// split, when present, divides the total either by percentage
/// (primary percent, exact remainder to the secondary) or by two
/// independently specified flat amounts.
#[must_use]
pub fn calculate_payout(
    job: &Job,
    lines: &[JobLine],
    split: Option<&TeamSplit>,
    cfg: &PayoutConfig,
) -> PayoutBreakdown {
    let total = if lines.is_empty() {
        round2(job.metadata.estimated_payout.unwrap_or(0.0))
    } else {
        round2(lines.iter().map(|l| line_payout(l, cfg)).sum())
    };

    match split.map(|s| s.mode) {
        Some(SplitMode::Percentage { primary_percent }) => {
            let primary = round2(total * primary_percent / 100.0);
            // Exact remainder keeps primary + secondary == total.
            let secondary = round2(total - primary);
            PayoutBreakdown {
                total,
                primary_amount: primary,
                secondary_amount: secondary,
                split: Some(SplitOutcome::Percentage { primary_percent }),
            }
        }
        Some(SplitMode::Flat {
            primary_amount,
            secondary_amount,
        }) => {
            let primary = round2(primary_amount);
            let secondary = round2(secondary_amount);
            if (primary + secondary - total).abs() > 0.01 {
                tracing::warn!(
                    job_id = %job.id,
                    total,
                    primary,
                    secondary,
                    "flat team split does not sum to the computed job total"
                );
            }
            PayoutBreakdown {
                total,
                primary_amount: primary,
                secondary_amount: secondary,
                split: Some(SplitOutcome::Flat),
            }
        }
        None => PayoutBreakdown {
            total,
            primary_amount: total,
            secondary_amount: 0.0,
            split: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{JobId, ProId};
    use crate::domain::job::{JobMetadata, JobStatus};
    use chrono::Utc;

    fn job_with(estimated_payout: Option<f64>) -> Job {
        Job {
            id: JobId::new(),
            status: JobStatus::Accepted,
            variant_code: "BASE".to_string(),
            customer_name: "Test Customer".to_string(),
            address: "100 Main St".to_string(),
            location: None,
            created_at: Utc::now(),
            metadata: JobMetadata {
                estimated_payout,
                source_order_ref: None,
                extra: serde_json::Value::Null,
            },
        }
    }

    fn line(variant: &str, price: f64) -> JobLine {
        JobLine {
            id: uuid::Uuid::new_v4(),
            job_id: JobId::new(),
            variant_code: variant.to_string(),
            quantity: 1,
            customer_price: price,
            payout: None,
        }
    }

    fn assert_cents(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.005,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn base_200_pays_79_20() {
        let cfg = PayoutConfig::default();
        let breakdown = calculate_payout(&job_with(None), &[line("BASE", 200.0)], None, &cfg);
        // max(35, min(200*0.8, (200 - 200*0.28) * 0.55)) = 79.20
        assert_cents(breakdown.total, 79.20);
        assert_cents(breakdown.primary_amount, 79.20);
        assert_cents(breakdown.secondary_amount, 0.0);
    }

    #[test]
    fn byo_100_pays_65_00() {
        let cfg = PayoutConfig::default();
        let breakdown = calculate_payout(&job_with(None), &[line("BYO", 100.0)], None, &cfg);
        assert_cents(breakdown.total, 65.00);
    }

    #[test]
    fn h2s_50_is_floored_to_35_00() {
        let cfg = PayoutConfig::default();
        // labor base 31.0, raw 15.50, floored to the minimum dispatch.
        let breakdown = calculate_payout(&job_with(None), &[line("H2S", 50.0)], None, &cfg);
        assert_cents(breakdown.total, 35.00);
    }

    #[test]
    fn cap_binds_on_high_share_lines() {
        let cfg = PayoutConfig {
            floor: 35.0,
            cap_pct: 0.50,
        };
        // BYO pays 65% of labor base; a 50% cap must bind.
        let breakdown = calculate_payout(&job_with(None), &[line("BYO", 200.0)], None, &cfg);
        assert_cents(breakdown.total, 100.0);
    }

    #[test]
    fn floor_and_cap_bound_every_tier() {
        let cfg = PayoutConfig::default();
        for variant in ["BYO", "BASE", "H2S", "UNKNOWN"] {
            for price in [40.0, 75.0, 120.0, 500.0, 1234.56] {
                let breakdown =
                    calculate_payout(&job_with(None), &[line(variant, price)], None, &cfg);
                let cap = price * cfg.cap_pct;
                let lower = cfg.floor.min(cap);
                assert!(
                    breakdown.total + 0.005 >= lower,
                    "{variant} @ {price}: {} below floor",
                    breakdown.total
                );
                assert!(
                    breakdown.total <= cfg.floor.max(cap) + 0.005,
                    "{variant} @ {price}: {} above cap",
                    breakdown.total
                );
            }
        }
    }

    #[test]
    fn precomputed_line_payout_wins_over_derivation() {
        let cfg = PayoutConfig::default();
        let mut l = line("BASE", 200.0);
        l.payout = Some(90.0);
        let breakdown = calculate_payout(&job_with(None), &[l], None, &cfg);
        assert_cents(breakdown.total, 90.0);
    }

    #[test]
    fn multiple_lines_sum() {
        let cfg = PayoutConfig::default();
        let breakdown = calculate_payout(
            &job_with(None),
            &[line("BASE", 200.0), line("BYO", 100.0)],
            None,
            &cfg,
        );
        assert_cents(breakdown.total, 79.20 + 65.00);
    }

    #[test]
    fn no_lines_falls_back_to_estimated_payout() {
        let cfg = PayoutConfig::default();
        let breakdown = calculate_payout(&job_with(Some(88.5)), &[], None, &cfg);
        assert_cents(breakdown.total, 88.5);

        let empty = calculate_payout(&job_with(None), &[], None, &cfg);
        assert_cents(empty.total, 0.0);
    }

    #[test]
    fn percentage_split_shares_sum_exactly_to_total() {
        let cfg = PayoutConfig::default();
        let split = TeamSplit {
            job_id: JobId::new(),
            secondary_pro_id: ProId::new(),
            mode: SplitMode::Percentage {
                primary_percent: 66.0,
            },
        };
        // 79.20 * 0.66 = 52.272 → 52.27 primary, 26.93 secondary.
        let breakdown = calculate_payout(
            &job_with(None),
            &[line("BASE", 200.0)],
            Some(&split),
            &cfg,
        );
        assert_cents(breakdown.primary_amount, 52.27);
        assert_cents(breakdown.secondary_amount, 26.93);
        assert_cents(
            breakdown.primary_amount + breakdown.secondary_amount,
            breakdown.total,
        );
    }

    #[test]
    fn flat_split_is_passed_through_unnormalized() {
        let cfg = PayoutConfig::default();
        let split = TeamSplit {
            job_id: JobId::new(),
            secondary_pro_id: ProId::new(),
            mode: SplitMode::Flat {
                primary_amount: 50.0,
                secondary_amount: 10.0,
            },
        };
        let breakdown = calculate_payout(
            &job_with(None),
            &[line("BASE", 200.0)],
            Some(&split),
            &cfg,
        );
        // Total stays 79.20 even though the shares sum to 60.
        assert_cents(breakdown.total, 79.20);
        assert_cents(breakdown.primary_amount, 50.0);
        assert_cents(breakdown.secondary_amount, 10.0);
    }

    #[test]
    fn shares_follow_the_split_roles() {
        let cfg = PayoutConfig::default();
        let primary = ProId::new();
        let secondary = ProId::new();
        let split = TeamSplit {
            job_id: JobId::new(),
            secondary_pro_id: secondary,
            mode: SplitMode::Percentage {
                primary_percent: 60.0,
            },
        };
        let breakdown = calculate_payout(
            &job_with(None),
            &[line("BASE", 200.0)],
            Some(&split),
            &cfg,
        );

        // Primary holder: both shares are owed.
        let both = breakdown.shares_for(primary, Some(&split));
        assert_eq!(both.len(), 2);
        assert_eq!(both.first().map(|s| s.0), Some(primary));
        assert_eq!(both.last().map(|s| s.0), Some(secondary));

        // Secondary holder: only their own share, at the secondary amount.
        let own = breakdown.shares_for(secondary, Some(&split));
        assert_eq!(own.len(), 1);
        assert_eq!(own.first().map(|s| s.0), Some(secondary));
        assert_cents(
            own.first().map_or(0.0, |s| s.1),
            breakdown.secondary_amount,
        );

        // No split: the holder takes everything.
        let solo = breakdown.shares_for(primary, None);
        assert_eq!(solo.len(), 1);
    }

    #[test]
    fn identical_inputs_are_bit_for_bit_deterministic() {
        let cfg = PayoutConfig::default();
        let job = job_with(None);
        let lines = [line("H2S", 312.49), line("BASE", 88.0)];
        let a = calculate_payout(&job, &lines, None, &cfg);
        let b = calculate_payout(&job, &lines, None, &cfg);
        assert_eq!(a.total.to_bits(), b.total.to_bits());
        assert_eq!(a.primary_amount.to_bits(), b.primary_amount.to_bits());
    }
}
