//! Difficulty-targeted encounter composition
//!
//! A wave's unit list is built in two passes:
//!
//! 1. **Seed** by rejection sampling: a uniformly drawn type is accepted with
//!    probability `exp(-2 * |difficulty - target|)`, so types near the
//!    target dominate without excluding the rest.
//! 2. **Refine** by local search: replace a random pick with a random type
//!    and keep the swap if the average moves no further from the target.
//!    Stops after `max_failures` consecutive rejected proposals. A swap to a
//!    type with the same score changes nothing and counts as rejected.

use rand::Rng;
use tracing::{debug, error};

use crate::config::ComposerSettings;
use crate::game::constants::composer::{ACCEPTANCE_SHARPNESS, MAX_SEED_REJECTIONS};
use crate::game::difficulty::{DifficultyProfile, UnitType};

/// Statistics from one refinement pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    pub initial_distance: f64,
    pub final_distance: f64,
    /// Swaps that strictly reduced the distance
    pub accepted: u32,
    /// Swaps to a different score at the same distance
    pub ties: u32,
    /// Proposals that would have increased the distance or changed nothing
    pub rejected: u32,
}

#[derive(Debug, Clone)]
pub struct EncounterComposer {
    profile: DifficultyProfile,
    settings: ComposerSettings,
}

impl EncounterComposer {
    pub fn new(profile: DifficultyProfile, settings: ComposerSettings) -> Self {
        Self { profile, settings }
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// starting * (1 + growth)^(wave - 1); wave 0 is treated as wave 1
    pub fn target_difficulty(&self, wave: u32) -> f64 {
        let exponent = wave.max(1) - 1;
        self.settings.starting_difficulty * (1.0 + self.settings.growth_rate).powi(exponent as i32)
    }

    /// Compose exactly `count` unit types for `wave`
    pub fn compose<R: Rng + ?Sized>(&self, wave: u32, count: usize, rng: &mut R) -> Vec<UnitType> {
        if count == 0 {
            return Vec::new();
        }

        if self.profile.is_empty() {
            error!(
                "No difficulty profile loaded; wave {} falls back to {} x {}",
                wave,
                count,
                UnitType::FALLBACK
            );
            return vec![UnitType::FALLBACK; count];
        }

        let target = self.target_difficulty(wave);
        let mut picks = self.seed(target, count, rng);
        let refinement = self.refine(&mut picks, target, rng);

        debug!(
            "Wave {} composed: {} units, target {:.3}, average {:.3} (distance {:.3} -> {:.3}, {} swaps)",
            wave,
            count,
            target,
            self.profile.average(&picks),
            refinement.initial_distance,
            refinement.final_distance,
            refinement.accepted
        );

        picks
    }

    /// Rejection-sampled initial picks
    ///
    /// A pick that keeps getting rejected falls back to the type closest to
    /// the target, so seeding always terminates.
    pub fn seed<R: Rng + ?Sized>(&self, target: f64, count: usize, rng: &mut R) -> Vec<UnitType> {
        let pool = self.profile.unit_types();
        if pool.is_empty() {
            return vec![UnitType::FALLBACK; count];
        }

        let mut picks = Vec::with_capacity(count);
        while picks.len() < count {
            let mut rejections = 0;
            let pick = loop {
                let candidate = pool[rng.gen_range(0..pool.len())];
                let distance = (self.profile.difficulty(candidate) - target).abs();
                let acceptance = (-ACCEPTANCE_SHARPNESS * distance).exp();
                if rng.gen::<f64>() < acceptance {
                    break candidate;
                }

                rejections += 1;
                if rejections >= MAX_SEED_REJECTIONS {
                    break self.closest_to(target).unwrap_or(UnitType::FALLBACK);
                }
            };
            picks.push(pick);
        }
        picks
    }

    /// Local search toward `target`; never increases the distance
    pub fn refine<R: Rng + ?Sized>(
        &self,
        picks: &mut [UnitType],
        target: f64,
        rng: &mut R,
    ) -> Refinement {
        let initial_distance = self.distance(picks, target);
        let mut refinement = Refinement {
            initial_distance,
            final_distance: initial_distance,
            accepted: 0,
            ties: 0,
            rejected: 0,
        };

        let pool = self.profile.unit_types();
        if picks.is_empty() || pool.is_empty() {
            return refinement;
        }

        let len = picks.len() as f64;
        let mut sum: f64 = picks.iter().map(|u| self.profile.difficulty(*u)).sum();
        let mut current = initial_distance;
        let mut failures = 0;

        while failures < self.settings.max_failures {
            let index = rng.gen_range(0..picks.len());
            let replacement = pool[rng.gen_range(0..pool.len())];
            let old_score = self.profile.difficulty(picks[index]);
            let new_score = self.profile.difficulty(replacement);
            if new_score == old_score {
                refinement.rejected += 1;
                failures += 1;
                continue;
            }

            let new_sum = sum - old_score + new_score;
            let new_distance = (new_sum / len - target).abs();

            if new_distance <= current {
                if new_distance < current {
                    refinement.accepted += 1;
                } else {
                    refinement.ties += 1;
                }
                picks[index] = replacement;
                sum = new_sum;
                current = new_distance;
                failures = 0;
            } else {
                refinement.rejected += 1;
                failures += 1;
            }
        }

        refinement.final_distance = self.distance(picks, target);
        refinement
    }

    /// |average difficulty - target|
    pub fn distance(&self, picks: &[UnitType], target: f64) -> f64 {
        (self.profile.average(picks) - target).abs()
    }

    /// Profiled type whose difficulty is closest to `target`
    pub fn closest_to(&self, target: f64) -> Option<UnitType> {
        self.profile.unit_types().iter().copied().min_by(|a, b| {
            let da = (self.profile.difficulty(*a) - target).abs();
            let db = (self.profile.difficulty(*b) - target).abs();
            da.total_cmp(&db)
        })
    }
}
