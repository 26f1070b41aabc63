//! Wave end detection and summaries
//!
//! Decides whether the active wave is over and what wave comes next.

use serde::Serialize;

use crate::game::wave::WaveState;

/// How a wave ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveOutcome {
    /// Every unit was defeated; advance
    Completed,
    /// The time budget ran out; repeat
    Failed,
}

/// Reason why a wave ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveEndReason {
    /// No living units remain
    AllDefeated,
    /// Time budget exhausted
    TimeLimit,
}

impl WaveEndReason {
    pub fn outcome(&self) -> WaveOutcome {
        match self {
            WaveEndReason::AllDefeated => WaveOutcome::Completed,
            WaveEndReason::TimeLimit => WaveOutcome::Failed,
        }
    }
}

/// Check if the active wave should end
///
/// Defeat of every unit wins over the time limit when both hold on the same
/// tick.
pub fn check_wave_end(living: usize, state: &WaveState) -> Option<WaveEndReason> {
    if !state.is_active() {
        return None;
    }

    if living == 0 {
        return Some(WaveEndReason::AllDefeated);
    }

    if state.is_timed_out() {
        return Some(WaveEndReason::TimeLimit);
    }

    None
}

/// Wave to announce after `wave` ended with `outcome`
pub fn next_wave_number(wave: u32, outcome: WaveOutcome) -> u32 {
    match outcome {
        WaveOutcome::Completed => wave + 1,
        WaveOutcome::Failed => wave,
    }
}

/// Whether completing `wave` is a milestone
pub fn is_milestone(wave: u32, interval: u32) -> bool {
    interval > 0 && wave > 0 && wave % interval == 0
}

/// Summary of a finished wave
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveSummary {
    pub wave: u32,
    pub outcome: WaveOutcome,
    pub reason: WaveEndReason,
    pub elapsed_secs: u32,
    pub requested: usize,
    pub spawned: usize,
    pub next_wave: u32,
}

/// Summary of a game that reached its final wave
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub waves_survived: u32,
    pub defended_units: usize,
    pub participants: usize,
}
