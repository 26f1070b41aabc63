/// Host simulation timing
pub mod tick {
    /// Host simulation tick rate in Hz
    pub const TICK_RATE: u32 = 20;
    /// Cadence of the per-wave timer in seconds
    pub const TIMER_INTERVAL: f32 = 1.0;
    /// Delay before a continuation that found the game paused checks again
    pub const PAUSE_RECHECK_INTERVAL: f32 = 1.0;
}

/// Session/roster constants
pub mod session {
    /// Minimum participants required to start a game
    pub const MIN_PARTICIPANTS: usize = 1;
    /// Maximum participants admitted into a running game
    pub const MAX_PARTICIPANTS: usize = 8;
    /// Delay between starting a game and the first wave announcement (seconds)
    pub const PREPARATION_SECS: f32 = 10.0;
}

/// Wave lifecycle constants
pub mod wave {
    /// Delay between a wave announcement and its units spawning (seconds)
    pub const PREPARATION_SECS: f32 = 10.0;
    /// Time budget for clearing a wave (seconds)
    pub const DURATION_SECS: u32 = 300;
    /// Delay between a wave ending and the next one being announced (seconds)
    pub const NEXT_WAVE_DELAY_SECS: f32 = 10.0;
    /// Remaining time at which countdown announcements begin (seconds)
    pub const COUNTDOWN_SECS: u32 = 10;
    /// Every Nth completed wave is a milestone
    pub const MILESTONE_INTERVAL: u32 = 5;
    /// Completing this wave ends the game (0 = endless)
    pub const MAX_WAVES: u32 = 30;
    /// Base unit count; the wave number is added on top
    pub const BASE_MOB_COUNT: usize = 5;
    /// Extra units per participant in the roster
    pub const MOBS_PER_PARTICIPANT: usize = 2;
}

/// Encounter composition constants
pub mod composer {
    /// Target average difficulty on wave 1
    pub const STARTING_DIFFICULTY: f64 = 1.0;
    /// Geometric growth of the target per wave
    pub const GROWTH_RATE: f64 = 0.1;
    /// Consecutive rejected swaps before refinement stops
    pub const MAX_FAILURES: u32 = 50;
    /// Sharpness of the seeding acceptance curve: exp(-k * |d - target|)
    pub const ACCEPTANCE_SHARPNESS: f64 = 2.0;
    /// Consecutive rejected draws before seeding takes the closest candidate
    pub const MAX_SEED_REJECTIONS: u32 = 10_000;
}

/// Spawn placement constants
pub mod placement {
    /// Containment radius around the defended area's center
    pub const CONTAINMENT_RADIUS: f64 = 50.0;
    /// Inner edge of the sampling band as a fraction of the containment radius
    pub const INNER_FRACTION: f64 = 0.7;
    /// Outer edge of the sampling band as a fraction of the containment radius
    pub const OUTER_FRACTION: f64 = 0.9;
    /// Minimum distance from participants and defended units
    pub const MIN_SEPARATION: f64 = 20.0;
    /// Candidate points sampled per search
    pub const ATTEMPTS_PER_SEARCH: u32 = 50;
    /// Searches before falling back to the cached point
    pub const SEARCH_ROUNDS: u32 = 50;
}

/// Spawned unit lifecycle constants
pub mod lifecycle {
    /// Units older than this are removed by the sweep (seconds)
    pub const UNIT_LIFETIME_SECS: f64 = 5.0 * 60.0;
    /// Cadence of the expiry sweep (seconds)
    pub const SWEEP_INTERVAL_SECS: f32 = 2.0;
}

/// Per-wave unit stat scaling
pub mod scaling {
    /// Difficulty multiplier base: base^(wave - 1)
    pub const DIFFICULTY_BASE: f64 = 1.5;
    /// Health bonus per participant in the roster
    pub const HEALTH_PER_PARTICIPANT: f64 = 0.3;
    /// Movement speed bonus per wave
    pub const SPEED_PER_WAVE: f64 = 0.05;
    /// Chance for a unit to be promoted to elite
    pub const ELITE_CHANCE: f64 = 0.2;
    /// First wave on which elites can appear
    pub const ELITE_MIN_WAVE: u32 = 5;
    /// Every Nth wave is a boss wave
    pub const BOSS_WAVE_INTERVAL: u32 = 10;
}

/// Boss-wave hazard constants
pub mod hazard {
    /// Time between hazard strikes during a boss wave (seconds)
    pub const STRIKE_INTERVAL_SECS: f32 = 5.0;
}
