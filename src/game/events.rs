//! Scheduled tasks and emitted session events
//!
//! Tasks carry the freshness token that was current when they were scheduled.
//! A task whose token no longer matches is stale and is dropped on dispatch.

use serde::Serialize;

use crate::game::outcome::{GameSummary, WaveSummary};
use crate::game::phase::GamePhase;
use crate::util::vec3::Vec3;

/// Continuations queued on the session scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTask {
    /// Game preparation elapsed; announce wave 1
    BeginSession { session: u64 },
    /// Wave preparation elapsed; spawn the wave and start its timer
    BeginWave { wave: u32, generation: u64 },
    /// Per-second wave timer
    WaveTimer { generation: u64 },
    /// Next-wave delay elapsed; announce the given wave
    StartWave { wave: u32, generation: u64 },
    /// Final wave cleared; return to the lobby
    FinishGame { generation: u64 },
    /// Periodic expiry sweep of tracked units
    Sweep { session: u64 },
    /// Boss-wave hazard strike
    HazardStrike { generation: u64 },
}

/// Events emitted to the host while dispatching
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    GameStarted { participants: usize },
    GameStopped,
    GameCompleted(GameSummary),
    WaveAnnounced { wave: u32, delay_secs: f32 },
    WaveBegan { wave: u32, requested: usize, spawned: usize },
    WaveEnded(WaveSummary),
    Countdown { wave: u32, remaining_secs: u32 },
    MilestoneReached { wave: u32 },
    Paused { from: GamePhase },
    Resumed { to: GamePhase },
    UnitsExpired { count: usize },
    HazardStruck { point: Vec3 },
}
