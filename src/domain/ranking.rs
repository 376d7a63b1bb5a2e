//! Candidate ranking: radius filter, ordering, and random tie-breaks.
//!
//! [`rank_candidates`] is pure apart from the injected RNG, which makes
//! tie-breaking deterministically testable with a seeded generator.

use std::cmp::Ordering;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use super::geo::{GeoPoint, distance_miles};
use super::ids::ProId;
use super::pro::Pro;

/// Thresholds for candidate ranking.
#[derive(Debug, Clone, Copy)]
pub struct RankingConfig {
    /// Radius applied to pros without their own configured radius.
    pub default_radius_miles: f64,
    /// Distances closer than this are treated as equal and tie-broken
    /// uniformly at random, so no pro is systematically favored.
    pub tie_epsilon_miles: f64,
    /// Fixed RNG seed for deterministic ranking (tests, replays).
    pub rng_seed: Option<u64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_radius_miles: 50.0,
            tie_epsilon_miles: 0.1,
            rng_seed: None,
        }
    }
}

/// A ranked candidate pro for a job.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    /// Candidate pro.
    pub pro_id: ProId,
    /// Great-circle distance from the pro to the job, in miles.
    pub distance_miles: f64,
    /// Whether the pro is within their effective service radius.
    pub in_radius: bool,
    /// How far past the radius the pro is, for exception-routed
    /// fallback assignments. `None` for in-radius candidates.
    pub over_radius_miles: Option<f64>,
    /// Pro's rating at ranking time.
    pub rating: f64,
    /// Pro's open-job load at ranking time.
    pub open_jobs: u32,
}

/// Ranks active pros for a job location.
///
/// Pros are filtered to those within their own effective radius and
/// sorted by distance ascending, then open-job load ascending, then
/// rating descending. Candidates whose distances are within
/// `tie_epsilon_miles` of each other are shuffled uniformly at random
/// within the tie group. When nobody is in radius, the single nearest
/// pro is returned with `over_radius_miles` set so callers can flag the
/// assignment as exception-routed.
///
/// An empty pro pool yields an empty list; `NaN` distances make a pro
/// unrankable and drop it.
#[must_use]
pub fn rank_candidates<R: Rng>(
    job_location: GeoPoint,
    pros: &[Pro],
    cfg: &RankingConfig,
    rng: &mut R,
) -> Vec<RankedCandidate> {
    let mut measured: Vec<(f64, f64, &Pro)> = Vec::with_capacity(pros.len());
    for pro in pros.iter().filter(|p| p.active) {
        let Some(loc) = pro.location else { continue };
        let distance = distance_miles(job_location, loc);
        if distance.is_nan() {
            continue;
        }
        let radius = pro
            .service_radius_miles
            .unwrap_or(cfg.default_radius_miles);
        measured.push((distance, radius, pro));
    }

    let mut in_radius: Vec<RankedCandidate> = measured
        .iter()
        .filter(|(distance, radius, _)| distance <= radius)
        .map(|&(distance, _, pro)| RankedCandidate {
            pro_id: pro.id,
            distance_miles: distance,
            in_radius: true,
            over_radius_miles: None,
            rating: pro.rating,
            open_jobs: pro.open_jobs,
        })
        .collect();

    if in_radius.is_empty() {
        // Nearest-outside-radius fallback, annotated for exception routing.
        return measured
            .into_iter()
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
            .map(|(distance, radius, pro)| {
                vec![RankedCandidate {
                    pro_id: pro.id,
                    distance_miles: distance,
                    in_radius: false,
                    over_radius_miles: Some(distance - radius),
                    rating: pro.rating,
                    open_jobs: pro.open_jobs,
                }]
            })
            .unwrap_or_default();
    }

    in_radius.sort_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or(Ordering::Equal)
            .then(a.open_jobs.cmp(&b.open_jobs))
            .then(b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
    });

    shuffle_tie_groups(&mut in_radius, cfg.tie_epsilon_miles, rng);
    in_radius
}

/// Shuffles each run of candidates whose distances sit within `epsilon`
/// of the run's first member.
fn shuffle_tie_groups<R: Rng>(candidates: &mut [RankedCandidate], epsilon: f64, rng: &mut R) {
    let mut start = 0;
    while start < candidates.len() {
        let Some(anchor) = candidates.get(start) else {
            break;
        };
        let anchor_distance = anchor.distance_miles;
        let mut end = start + 1;
        while candidates
            .get(end)
            .is_some_and(|c| c.distance_miles - anchor_distance < epsilon)
        {
            end += 1;
        }
        if end - start > 1
            && let Some(group) = candidates.get_mut(start..end)
        {
            group.shuffle(rng);
        }
        start = end;
    }
}
