//! Per-wave state owned by the orchestrator

use std::time::Instant;

use serde::Serialize;

/// Lifecycle of the current wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveLifecycle {
    #[default]
    Inactive,
    /// Announced, units not spawned yet
    Preparing,
    /// Units spawned, timer running
    Active,
}

/// State of the wave currently being announced or fought
#[derive(Debug, Clone, Default)]
pub struct WaveState {
    /// Wave number (0 before the first wave)
    pub number: u32,
    pub lifecycle: WaveLifecycle,
    /// Wall-clock instant the wave went active
    pub started_at: Option<Instant>,
    /// Scheduler clock when the wave went active
    pub started_at_secs: f64,
    /// Seconds counted by the wave timer; frozen while paused
    pub elapsed_secs: u32,
    pub duration_budget_secs: u32,
    /// Units the wave asked for
    pub requested: usize,
    /// Units actually spawned
    pub spawned: usize,
}

impl WaveState {
    /// Announce a wave; nothing is spawned yet
    pub fn prepare(&mut self, number: u32, duration_budget_secs: u32) {
        *self = WaveState {
            number,
            lifecycle: WaveLifecycle::Preparing,
            duration_budget_secs,
            ..WaveState::default()
        };
    }

    /// Mark the wave active and start its clock
    pub fn activate(&mut self, now_secs: f64) {
        self.lifecycle = WaveLifecycle::Active;
        self.started_at = Some(Instant::now());
        self.started_at_secs = now_secs;
        self.elapsed_secs = 0;
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == WaveLifecycle::Active
    }

    /// Count one unpaused timer second
    pub fn record_second(&mut self) {
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
    }

    pub fn is_timed_out(&self) -> bool {
        self.elapsed_secs >= self.duration_budget_secs
    }

    /// Seconds left in the budget (0 when no wave is active)
    pub fn remaining_secs(&self) -> u32 {
        if !self.is_active() {
            return 0;
        }
        self.duration_budget_secs.saturating_sub(self.elapsed_secs)
    }

    /// Wave ended; the number is kept so the next wave can be derived
    pub fn finish(&mut self) {
        self.lifecycle = WaveLifecycle::Inactive;
    }

    /// Zero everything
    pub fn reset(&mut self) {
        *self = WaveState::default();
    }
}
