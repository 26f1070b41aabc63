//! Per-wave unit stat scaling and rank rolls
//!
//! Composition decides *which* unit types a wave gets; this module decides how
//! strong each one is and how it is labelled when it reaches the spawner.

use rand::Rng;
use serde::Serialize;

use crate::config::ScalingSettings;
use crate::game::difficulty::{DifficultyProfile, UnitType};

/// Unit rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnitRank {
    Normal,
    Elite,
    Boss,
}

/// Stat multipliers applied by the spawner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitTraits {
    pub health_multiplier: f64,
    pub damage_multiplier: f64,
    pub speed_multiplier: f64,
}

impl Default for UnitTraits {
    fn default() -> Self {
        Self {
            health_multiplier: 1.0,
            damage_multiplier: 1.0,
            speed_multiplier: 1.0,
        }
    }
}

/// Everything the host needs to materialize one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSpec {
    pub unit_type: UnitType,
    pub rank: UnitRank,
    pub wave: u32,
    pub traits: UnitTraits,
    /// Display name, e.g. "[ELITE] Cave Spider"
    pub label: String,
}

/// Turns a composed pick list into spawnable unit specs
#[derive(Debug, Clone)]
pub struct WaveScaling {
    settings: ScalingSettings,
}

impl WaveScaling {
    pub fn new(settings: ScalingSettings) -> Self {
        Self { settings }
    }

    /// base^(wave - 1)
    pub fn difficulty_multiplier(&self, wave: u32) -> f64 {
        self.settings
            .difficulty_base
            .powi(wave.saturating_sub(1) as i32)
    }

    pub fn is_boss_wave(&self, wave: u32) -> bool {
        let interval = self.settings.boss_wave_interval;
        interval > 0 && wave > 0 && wave % interval == 0
    }

    /// Stat multipliers for every unit of a wave
    pub fn traits(&self, wave: u32, participants: usize) -> UnitTraits {
        let difficulty = self.difficulty_multiplier(wave);
        UnitTraits {
            health_multiplier: difficulty
                * (1.0 + self.settings.health_per_participant * participants as f64),
            damage_multiplier: difficulty,
            speed_multiplier: 1.0 + self.settings.speed_per_wave * wave as f64,
        }
    }

    /// Build specs for a composed wave
    ///
    /// On a boss wave the highest-difficulty pick (first one on ties) is the
    /// boss. Every other unit may roll elite once the wave reaches
    /// `elite_min_wave`.
    pub fn specs_for<R: Rng + ?Sized>(
        &self,
        wave: u32,
        participants: usize,
        picks: &[UnitType],
        profile: &DifficultyProfile,
        rng: &mut R,
    ) -> Vec<UnitSpec> {
        let traits = self.traits(wave, participants);
        let boss_index = if self.is_boss_wave(wave) {
            hardest_pick(picks, profile)
        } else {
            None
        };
        let elites_allowed = wave >= self.settings.elite_min_wave;

        picks
            .iter()
            .enumerate()
            .map(|(i, &unit_type)| {
                let rank = if Some(i) == boss_index {
                    UnitRank::Boss
                } else if elites_allowed && rng.gen_bool(self.settings.elite_chance.clamp(0.0, 1.0)) {
                    UnitRank::Elite
                } else {
                    UnitRank::Normal
                };
                UnitSpec {
                    unit_type,
                    rank,
                    wave,
                    traits,
                    label: label(unit_type, rank, wave),
                }
            })
            .collect()
    }
}

/// Display label for a unit
pub fn label(unit_type: UnitType, rank: UnitRank, wave: u32) -> String {
    match rank {
        UnitRank::Boss => format!("[BOSS] {}", unit_type.display_name()),
        UnitRank::Elite => format!("[ELITE] {}", unit_type.display_name()),
        UnitRank::Normal => format!("[Wave {}] {}", wave, unit_type.display_name()),
    }
}

fn hardest_pick(picks: &[UnitType], profile: &DifficultyProfile) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, unit) in picks.iter().enumerate() {
        let difficulty = profile.difficulty(*unit);
        if best.map_or(true, |(_, d)| difficulty > d) {
            best = Some((i, difficulty));
        }
    }
    best.map(|(i, _)| i)
}
