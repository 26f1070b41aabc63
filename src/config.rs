use std::path::PathBuf;
use std::str::FromStr;

use crate::game::constants;

/// Session roster and start-up timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Participants required to leave the lobby
    pub min_participants: usize,
    /// Participants admitted into a running game
    pub max_participants: usize,
    /// Delay between starting the game and announcing wave 1 (seconds)
    pub preparation_secs: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            min_participants: constants::session::MIN_PARTICIPANTS,
            max_participants: constants::session::MAX_PARTICIPANTS,
            preparation_secs: constants::session::PREPARATION_SECS,
        }
    }
}

/// Wave timing and sizing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSettings {
    pub preparation_secs: f32,
    pub duration_secs: u32,
    pub next_wave_delay_secs: f32,
    pub countdown_secs: u32,
    pub milestone_interval: u32,
    /// Completing this wave ends the game (0 = endless)
    pub max_waves: u32,
    pub base_mob_count: usize,
    pub mobs_per_participant: usize,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            preparation_secs: constants::wave::PREPARATION_SECS,
            duration_secs: constants::wave::DURATION_SECS,
            next_wave_delay_secs: constants::wave::NEXT_WAVE_DELAY_SECS,
            countdown_secs: constants::wave::COUNTDOWN_SECS,
            milestone_interval: constants::wave::MILESTONE_INTERVAL,
            max_waves: constants::wave::MAX_WAVES,
            base_mob_count: constants::wave::BASE_MOB_COUNT,
            mobs_per_participant: constants::wave::MOBS_PER_PARTICIPANT,
        }
    }
}

impl WaveSettings {
    /// Units requested for a wave: (base + wave) + per_participant * participants
    pub fn mob_count(&self, wave: u32, participants: usize) -> usize {
        self.base_mob_count + wave as usize + self.mobs_per_participant * participants
    }
}

/// Difficulty targeting for encounter composition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposerSettings {
    pub starting_difficulty: f64,
    pub growth_rate: f64,
    pub max_failures: u32,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            starting_difficulty: constants::composer::STARTING_DIFFICULTY,
            growth_rate: constants::composer::GROWTH_RATE,
            max_failures: constants::composer::MAX_FAILURES,
        }
    }
}

/// Spawn point search parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSettings {
    pub containment_radius: f64,
    pub inner_fraction: f64,
    pub outer_fraction: f64,
    pub min_separation: f64,
    pub attempts_per_search: u32,
    pub search_rounds: u32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            containment_radius: constants::placement::CONTAINMENT_RADIUS,
            inner_fraction: constants::placement::INNER_FRACTION,
            outer_fraction: constants::placement::OUTER_FRACTION,
            min_separation: constants::placement::MIN_SEPARATION,
            attempts_per_search: constants::placement::ATTEMPTS_PER_SEARCH,
            search_rounds: constants::placement::SEARCH_ROUNDS,
        }
    }
}

/// Spawned unit expiry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleSettings {
    pub unit_lifetime_secs: f64,
    pub sweep_interval_secs: f32,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            unit_lifetime_secs: constants::lifecycle::UNIT_LIFETIME_SECS,
            sweep_interval_secs: constants::lifecycle::SWEEP_INTERVAL_SECS,
        }
    }
}

/// Per-wave unit stat scaling and rank rolls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingSettings {
    pub difficulty_base: f64,
    pub health_per_participant: f64,
    pub speed_per_wave: f64,
    pub elite_chance: f64,
    pub elite_min_wave: u32,
    /// Every Nth wave is a boss wave (0 = never)
    pub boss_wave_interval: u32,
}

impl Default for ScalingSettings {
    fn default() -> Self {
        Self {
            difficulty_base: constants::scaling::DIFFICULTY_BASE,
            health_per_participant: constants::scaling::HEALTH_PER_PARTICIPANT,
            speed_per_wave: constants::scaling::SPEED_PER_WAVE,
            elite_chance: constants::scaling::ELITE_CHANCE,
            elite_min_wave: constants::scaling::ELITE_MIN_WAVE,
            boss_wave_interval: constants::scaling::BOSS_WAVE_INTERVAL,
        }
    }
}

/// Boss-wave hazard cadence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardSettings {
    pub strike_interval_secs: f32,
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            strike_interval_secs: constants::hazard::STRIKE_INTERVAL_SECS,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Host simulation tick rate in Hz
    pub tick_rate: u32,
    pub session: SessionSettings,
    pub wave: WaveSettings,
    pub composer: ComposerSettings,
    pub placement: PlacementSettings,
    pub lifecycle: LifecycleSettings,
    pub scaling: ScalingSettings,
    pub hazard: HazardSettings,
    /// JSON difficulty table; the built-in profile is used when unset
    pub difficulty_profile_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: constants::tick::TICK_RATE,
            session: SessionSettings::default(),
            wave: WaveSettings::default(),
            composer: ComposerSettings::default(),
            placement: PlacementSettings::default(),
            lifecycle: LifecycleSettings::default(),
            scaling: ScalingSettings::default(),
            hazard: HazardSettings::default(),
            difficulty_profile_path: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick_rate must be between 1 and 1000, got {0}")]
    InvalidTickRate(u32),
    #[error("min_participants must be at least 1")]
    NoParticipantsRequired,
    #[error("min_participants ({min}) cannot exceed max_participants ({max})")]
    ParticipantBounds { min: usize, max: usize },
    #[error("wave duration must be at least 1 second")]
    ZeroWaveDuration,
    #[error("{name} must be a finite, non-negative number of seconds")]
    InvalidDelay { name: &'static str },
    #[error("starting difficulty must be positive and finite")]
    InvalidStartingDifficulty,
    #[error("growth rate must be greater than -1")]
    InvalidGrowthRate,
    #[error("containment radius must be positive")]
    InvalidContainmentRadius,
    #[error("sampling band must satisfy 0 <= inner ({inner}) <= outer ({outer}) <= 1")]
    InvalidSamplingBand { inner: f64, outer: f64 },
    #[error("placement attempts and search rounds must be at least 1")]
    NoPlacementAttempts,
    #[error("elite chance must be within [0, 1]")]
    InvalidEliteChance,
}

impl EngineConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(rate) = env_value::<u32>("TICK_RATE", |v| (1..=1000).contains(v)) {
            config.tick_rate = rate;
        }
        if let Some(min) = env_value::<usize>("MIN_PARTICIPANTS", |v| *v >= 1) {
            config.session.min_participants = min;
        }
        if let Some(max) = env_value::<usize>("MAX_PARTICIPANTS", |v| *v >= 1) {
            config.session.max_participants = max;
        }
        if let Some(secs) = env_value::<f32>("GAME_PREPARATION_SECS", |v| v.is_finite() && *v >= 0.0) {
            config.session.preparation_secs = secs;
        }
        if let Some(secs) = env_value::<f32>("WAVE_PREPARATION_SECS", |v| v.is_finite() && *v >= 0.0) {
            config.wave.preparation_secs = secs;
        }
        if let Some(secs) = env_value::<u32>("WAVE_DURATION_SECS", |v| *v > 0) {
            config.wave.duration_secs = secs;
        }
        if let Some(secs) = env_value::<f32>("NEXT_WAVE_DELAY_SECS", |v| v.is_finite() && *v >= 0.0) {
            config.wave.next_wave_delay_secs = secs;
        }
        if let Some(max_waves) = env_value::<u32>("MAX_WAVES", |_| true) {
            config.wave.max_waves = max_waves;
        }
        if let Some(difficulty) = env_value::<f64>("STARTING_DIFFICULTY", |v| v.is_finite() && *v > 0.0) {
            config.composer.starting_difficulty = difficulty;
        }
        if let Some(growth) = env_value::<f64>("DIFFICULTY_GROWTH", |v| v.is_finite() && *v > -1.0) {
            config.composer.growth_rate = growth;
        }
        if let Some(radius) = env_value::<f64>("CONTAINMENT_RADIUS", |v| v.is_finite() && *v > 0.0) {
            config.placement.containment_radius = radius;
        }
        if let Some(separation) = env_value::<f64>("MIN_SEPARATION", |v| v.is_finite() && *v >= 0.0) {
            config.placement.min_separation = separation;
        }

        if let Ok(path) = std::env::var("DIFFICULTY_PROFILE") {
            if !path.trim().is_empty() {
                config.difficulty_profile_path = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        if self.session.min_participants == 0 {
            return Err(ConfigError::NoParticipantsRequired);
        }
        if self.session.min_participants > self.session.max_participants {
            return Err(ConfigError::ParticipantBounds {
                min: self.session.min_participants,
                max: self.session.max_participants,
            });
        }
        if self.wave.duration_secs == 0 {
            return Err(ConfigError::ZeroWaveDuration);
        }

        let delays = [
            ("session.preparation_secs", self.session.preparation_secs),
            ("wave.preparation_secs", self.wave.preparation_secs),
            ("wave.next_wave_delay_secs", self.wave.next_wave_delay_secs),
            ("lifecycle.sweep_interval_secs", self.lifecycle.sweep_interval_secs),
            ("hazard.strike_interval_secs", self.hazard.strike_interval_secs),
        ];
        for (name, value) in delays {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDelay { name });
            }
        }

        let starting = self.composer.starting_difficulty;
        if !starting.is_finite() || starting <= 0.0 {
            return Err(ConfigError::InvalidStartingDifficulty);
        }
        if !self.composer.growth_rate.is_finite() || self.composer.growth_rate <= -1.0 {
            return Err(ConfigError::InvalidGrowthRate);
        }

        let placement = &self.placement;
        if !placement.containment_radius.is_finite() || placement.containment_radius <= 0.0 {
            return Err(ConfigError::InvalidContainmentRadius);
        }
        if !(0.0..=1.0).contains(&placement.inner_fraction)
            || !(0.0..=1.0).contains(&placement.outer_fraction)
            || placement.inner_fraction > placement.outer_fraction
        {
            return Err(ConfigError::InvalidSamplingBand {
                inner: placement.inner_fraction,
                outer: placement.outer_fraction,
            });
        }
        if placement.attempts_per_search == 0 || placement.search_rounds == 0 {
            return Err(ConfigError::NoPlacementAttempts);
        }

        if !(0.0..=1.0).contains(&self.scaling.elite_chance) {
            return Err(ConfigError::InvalidEliteChance);
        }

        Ok(())
    }
}

/// Read and parse an environment variable, keeping the default on bad input
fn env_value<T: FromStr>(key: &str, accept: impl Fn(&T) -> bool) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(parsed) if accept(&parsed) => Some(parsed),
        Ok(_) => {
            tracing::warn!("{} value '{}' is out of range, using default", key, raw);
            None
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 20);
        assert_eq!(config.session.min_participants, 1);
        assert_eq!(config.wave.duration_secs, 300);
        assert_eq!(config.composer.max_failures, 50);
        assert_eq!(config.placement.min_separation, 20.0);
        assert!(config.difficulty_profile_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = EngineConfig::load_or_default();
        assert!(config.tick_rate > 0);
    }

    #[test]
    fn test_mob_count_formula() {
        let wave = WaveSettings::default();
        // (5 + 1) + (2 * 2)
        assert_eq!(wave.mob_count(1, 2), 10);
        assert_eq!(wave.mob_count(7, 0), 12);
        assert_eq!(wave.mob_count(3, 4), 16);
    }

    #[test]
    fn test_validate_participant_bounds() {
        let mut config = EngineConfig::default();
        config.session.min_participants = 5;
        config.session.max_participants = 2;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ParticipantBounds { min: 5, max: 2 })
        );
    }

    #[test]
    fn test_validate_sampling_band() {
        let mut config = EngineConfig::default();
        config.placement.inner_fraction = 0.95;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSamplingBand { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_difficulty() {
        let mut config = EngineConfig::default();
        config.composer.starting_difficulty = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidStartingDifficulty));

        let mut config = EngineConfig::default();
        config.composer.growth_rate = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidGrowthRate));
    }

    #[test]
    fn test_validate_rejects_negative_delay() {
        let mut config = EngineConfig::default();
        config.wave.next_wave_delay_secs = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDelay { name: "wave.next_wave_delay_secs" })
        );
    }
}
