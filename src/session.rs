//! Defense session facade
//!
//! One session per defended region. The host calls [`DefenseSession::tick`]
//! once per simulation tick; everything else is a command that either takes
//! effect immediately or reports why it could not.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::game::constants::tick::PAUSE_RECHECK_INTERVAL;
use crate::game::difficulty::DifficultyProfile;
use crate::game::events::{SessionEvent, SessionTask};
use crate::game::orchestrator::{SpawnReport, WaveContext, WaveOrchestrator};
use crate::game::phase::{GamePhase, JoinOutcome, PhaseError, PhaseMachine};
use crate::game::scheduler::{Scheduler, TaskHandle, TickScheduler};
use crate::game::tracker::EntityLifecycleTracker;
use crate::game::wave::WaveLifecycle;
use crate::host::{HostWorld, ParticipantId, UnitHandle};

/// Operator-facing snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub phase: GamePhase,
    pub paused: bool,
    pub paused_from: Option<GamePhase>,
    pub wave: u32,
    pub wave_lifecycle: WaveLifecycle,
    pub living_mobs: usize,
    pub tracked_mobs: usize,
    pub remaining_secs: u32,
    pub participants: usize,
    pub target_difficulty: f64,
    pub uptime_secs: f64,
}

pub struct DefenseSession<W: HostWorld> {
    config: EngineConfig,
    world: W,
    phase: PhaseMachine,
    orchestrator: WaveOrchestrator,
    tracker: EntityLifecycleTracker,
    scheduler: TickScheduler<SessionTask>,
    rng: StdRng,
    /// Freshness token for session-level continuations
    session: u64,
    session_tasks: SmallVec<[TaskHandle; 2]>,
    events: Vec<SessionEvent>,
}

impl<W: HostWorld> DefenseSession<W> {
    pub fn new(config: EngineConfig, profile: DifficultyProfile, world: W) -> Self {
        Self::with_rng(config, profile, world, StdRng::from_entropy())
    }

    /// Deterministic session for tests and replays
    pub fn with_seed(config: EngineConfig, profile: DifficultyProfile, world: W, seed: u64) -> Self {
        Self::with_rng(config, profile, world, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, profile: DifficultyProfile, world: W, rng: StdRng) -> Self {
        Self {
            phase: PhaseMachine::new(&config.session),
            orchestrator: WaveOrchestrator::new(&config, profile),
            tracker: EntityLifecycleTracker::new(config.lifecycle.unit_lifetime_secs),
            scheduler: TickScheduler::new(config.tick_rate),
            rng,
            session: 0,
            session_tasks: SmallVec::new(),
            events: Vec::new(),
            config,
            world,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    fn split(&mut self) -> (&mut WaveOrchestrator, WaveContext<'_, W>) {
        (
            &mut self.orchestrator,
            WaveContext {
                phase: &mut self.phase,
                tracker: &mut self.tracker,
                scheduler: &mut self.scheduler,
                world: &mut self.world,
                rng: &mut self.rng,
                events: &mut self.events,
            },
        )
    }

    // ---- Game lifecycle ----

    /// Collect the online roster and begin preparing wave 1
    pub fn start_game(&mut self) -> Result<usize, PhaseError> {
        let participants = self.world.online_participants();
        let count = match self.phase.begin(participants) {
            Ok(count) => count,
            Err(e) => {
                warn!("Game not started: {}", e);
                if matches!(e, PhaseError::NotEnoughParticipants { .. }) {
                    self.world.announce(&e.to_string());
                }
                return Err(e);
            }
        };

        self.session += 1;
        let delay = self.config.session.preparation_secs;
        let begin = self
            .scheduler
            .run_after(delay, SessionTask::BeginSession { session: self.session });
        let sweep = self.scheduler.run_periodic(
            self.config.lifecycle.sweep_interval_secs,
            SessionTask::Sweep { session: self.session },
        );
        self.session_tasks.push(begin);
        self.session_tasks.push(sweep);

        self.world.announce("Preparing game...");
        self.events.push(SessionEvent::GameStarted { participants: count });
        info!("Game started with {} participants", count);
        Ok(count)
    }

    /// Cancel everything, remove spawned units and return to the lobby
    pub fn stop_game(&mut self) -> bool {
        if !self.phase.is_running() {
            return false;
        }

        self.orchestrator.stop_wave(&mut self.scheduler);
        for handle in self.session_tasks.drain(..) {
            self.scheduler.cancel(handle);
        }
        self.session += 1;

        let removed = self.tracker.clear(&mut self.world);
        self.phase.stop();

        self.world.announce("Game stopped!");
        self.events.push(SessionEvent::GameStopped);
        info!("Game stopped ({} units removed)", removed);
        true
    }

    pub fn try_pause_game(&mut self) -> Result<GamePhase, PhaseError> {
        match self.phase.try_pause() {
            Ok(from) => {
                self.world.announce("Game paused.");
                self.events.push(SessionEvent::Paused { from });
                info!("Game paused from {}", from);
                Ok(from)
            }
            Err(e) => {
                warn!("Pause rejected: {}", e);
                Err(e)
            }
        }
    }

    pub fn pause_game(&mut self) -> bool {
        self.try_pause_game().is_ok()
    }

    pub fn try_resume_game(&mut self) -> Result<GamePhase, PhaseError> {
        match self.phase.try_resume() {
            Ok(to) => {
                self.world.announce("Game resumed.");
                self.events.push(SessionEvent::Resumed { to });
                info!("Game resumed to {}", to);
                Ok(to)
            }
            Err(e) => {
                warn!("Resume rejected: {}", e);
                Err(e)
            }
        }
    }

    pub fn resume_game(&mut self) -> bool {
        self.try_resume_game().is_ok()
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    pub fn current_phase(&self) -> GamePhase {
        self.phase.phase()
    }

    // ---- Waves ----

    pub fn start_wave(&mut self, wave: u32) -> Result<(), PhaseError> {
        let (orchestrator, mut ctx) = self.split();
        orchestrator.start_wave(&mut ctx, wave)
    }

    pub fn stop_wave(&mut self) -> bool {
        self.orchestrator.stop_wave(&mut self.scheduler)
    }

    /// Compose, place and spawn units outside the normal wave flow
    pub fn spawn_wave(&mut self, wave: u32, count: usize) -> SpawnReport {
        let (orchestrator, mut ctx) = self.split();
        orchestrator.spawn_wave(&mut ctx, wave, count)
    }

    pub fn current_wave(&self) -> u32 {
        self.orchestrator.state().number
    }

    pub fn living_mob_count(&self) -> usize {
        self.tracker.living_count(&self.world)
    }

    /// Seconds left in the active wave
    pub fn remaining_time(&self) -> u32 {
        self.orchestrator.remaining_time()
    }

    /// Remove every tracked unit from the world
    pub fn cleanup_remaining_mobs(&mut self) -> usize {
        self.tracker.clear(&mut self.world)
    }

    // ---- Host notifications ----

    /// A tracked unit died or was removed by the host
    pub fn on_unit_removed(&mut self, handle: UnitHandle) -> bool {
        self.tracker.forget(handle)
    }

    pub fn join_participant(&mut self, participant: ParticipantId) -> Result<JoinOutcome, PhaseError> {
        let result = self.phase.join(participant);
        match &result {
            Ok(JoinOutcome::Joined) => {
                self.world.notify(participant, "You've joined an active game!");
                info!("Participant {} joined ({} total)", participant, self.phase.roster_size());
            }
            Ok(_) => {}
            Err(e) => self.world.notify(participant, &e.to_string()),
        }
        result
    }

    /// Remove a participant; the game stops once nobody is left
    pub fn leave_participant(&mut self, participant: ParticipantId) -> bool {
        let removed = self.phase.leave(participant);
        if removed && self.phase.is_running() && self.phase.roster_size() == 0 {
            self.stop_game();
            self.world.announce("Game ended - All players left!");
        }
        removed
    }

    // ---- Driving ----

    /// Advance one tick and dispatch every task that came due
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        if !self.phase.is_paused() {
            self.tracker.advance(1.0 / self.scheduler.tick_rate() as f64);
        }
        self.scheduler.advance();
        while let Some((_, task)) = self.scheduler.next_due() {
            self.dispatch(task);
        }
        std::mem::take(&mut self.events)
    }

    /// Run ticks covering `secs` seconds
    pub fn advance_secs(&mut self, secs: f32) -> Vec<SessionEvent> {
        let mut events = std::mem::take(&mut self.events);
        for _ in 0..self.scheduler.secs_to_ticks(secs) {
            events.extend(self.tick());
        }
        events
    }

    /// Events raised by commands since the last tick
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn dispatch(&mut self, task: SessionTask) {
        match task {
            SessionTask::BeginSession { session } => self.on_begin_session(session),
            SessionTask::Sweep { session } => self.on_sweep(session),
            SessionTask::BeginWave { wave, generation } => {
                let (orchestrator, mut ctx) = self.split();
                orchestrator.on_begin_wave(&mut ctx, wave, generation);
            }
            SessionTask::WaveTimer { generation } => {
                let (orchestrator, mut ctx) = self.split();
                orchestrator.on_timer_tick(&mut ctx, generation);
            }
            SessionTask::StartWave { wave, generation } => {
                let (orchestrator, mut ctx) = self.split();
                orchestrator.on_start_wave(&mut ctx, wave, generation);
            }
            SessionTask::FinishGame { generation } => {
                if self.orchestrator.is_current(generation) {
                    self.stop_game();
                }
            }
            SessionTask::HazardStrike { generation } => {
                #[cfg(feature = "boss_hazards")]
                {
                    let (orchestrator, mut ctx) = self.split();
                    orchestrator.on_hazard_strike(&mut ctx, generation);
                }
                #[cfg(not(feature = "boss_hazards"))]
                let _ = generation;
            }
        }
    }

    fn on_begin_session(&mut self, session: u64) {
        if session != self.session {
            debug!("Dropping stale session start {}", session);
            return;
        }
        if self.phase.is_paused() {
            let handle = self
                .scheduler
                .run_after(PAUSE_RECHECK_INTERVAL, SessionTask::BeginSession { session });
            self.session_tasks.push(handle);
            return;
        }

        if self.start_wave(1).is_ok() {
            self.world.announce("Game started!");
        }
    }

    fn on_sweep(&mut self, session: u64) {
        if session != self.session || self.phase.is_paused() {
            return;
        }
        let report = self
            .tracker
            .sweep(&mut self.world, self.orchestrator.live_generation());
        if report.expired > 0 {
            self.events.push(SessionEvent::UnitsExpired { count: report.expired });
        }
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.orchestrator.state();
        SessionStatus {
            phase: self.phase.phase(),
            paused: self.phase.is_paused(),
            paused_from: self.phase.paused_from(),
            wave: state.number,
            wave_lifecycle: state.lifecycle,
            living_mobs: self.living_mob_count(),
            tracked_mobs: self.tracker.tracked_count(),
            remaining_secs: state.remaining_secs(),
            participants: self.phase.roster_size(),
            target_difficulty: self.orchestrator.composer().target_difficulty(state.number),
            uptime_secs: self.scheduler.now_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::outcome::{WaveEndReason, WaveOutcome};
    use crate::host::sim::SimulatedWorld;
    use crate::util::vec3::Vec3;
    use uuid::Uuid;

    fn world_with(participants: usize) -> SimulatedWorld {
        let mut world = SimulatedWorld::with_seed(Vec3::new(0.0, 64.0, 0.0), 50.0, 99);
        for i in 0..participants {
            world.add_participant(Uuid::new_v4(), Vec3::new(i as f64 * 2.0, 64.0, 0.0));
        }
        world.add_defended_unit(Vec3::new(0.0, 64.0, 3.0));
        world
    }

    fn session_with(participants: usize) -> DefenseSession<SimulatedWorld> {
        DefenseSession::with_seed(
            EngineConfig::default(),
            DifficultyProfile::builtin(),
            world_with(participants),
            7,
        )
    }

    /// Start a game and run until wave 1 is active
    fn active_session(participants: usize) -> DefenseSession<SimulatedWorld> {
        let mut session = session_with(participants);
        session.start_game().unwrap();
        // Game preparation then wave preparation
        session.advance_secs(20.0);
        assert_eq!(session.current_phase(), GamePhase::Active);
        session
    }

    fn kill_all(session: &mut DefenseSession<SimulatedWorld>) {
        for handle in session.world_mut().kill_all() {
            session.on_unit_removed(handle);
        }
    }

    fn wave_ended(events: &[SessionEvent]) -> Option<(WaveOutcome, u32)> {
        events.iter().find_map(|e| match e {
            SessionEvent::WaveEnded(summary) => Some((summary.outcome, summary.next_wave)),
            _ => None,
        })
    }

    #[test]
    fn test_start_requires_participants() {
        let mut session = session_with(0);
        assert_eq!(
            session.start_game(),
            Err(PhaseError::NotEnoughParticipants { required: 1 })
        );
        assert_eq!(session.current_phase(), GamePhase::Lobby);
        assert_eq!(
            session.world().announcements.last().map(String::as_str),
            Some("Not enough players to start! Need at least 1 players.")
        );
    }

    #[test]
    fn test_end_to_end_wave_completion() {
        let mut session = session_with(2);
        assert_eq!(session.start_game(), Ok(2));
        assert_eq!(session.current_phase(), GamePhase::Preparing);

        // Game preparation: wave 1 announced, nothing spawned yet
        let events = session.advance_secs(10.0);
        assert!(events.contains(&SessionEvent::WaveAnnounced { wave: 1, delay_secs: 10.0 }));
        assert_eq!(session.living_mob_count(), 0);

        // Wave preparation: (5 + 1) + 2 * 2 units
        let events = session.advance_secs(10.0);
        assert!(events.contains(&SessionEvent::WaveBegan {
            wave: 1,
            requested: 10,
            spawned: 10,
        }));
        assert_eq!(session.current_phase(), GamePhase::Active);
        assert_eq!(session.living_mob_count(), 10);
        assert_eq!(session.remaining_time(), 300);

        kill_all(&mut session);
        let events = session.advance_secs(1.0);
        assert_eq!(wave_ended(&events), Some((WaveOutcome::Completed, 2)));
        assert_eq!(session.current_phase(), GamePhase::Completed);

        // Next-wave delay, then wave 2 is announced
        let events = session.advance_secs(10.0);
        assert!(events.contains(&SessionEvent::WaveAnnounced { wave: 2, delay_secs: 10.0 }));
        assert_eq!(session.current_wave(), 2);
        assert_eq!(session.current_phase(), GamePhase::Preparing);
    }

    #[test]
    fn test_timeout_repeats_wave() {
        let mut config = EngineConfig::default();
        config.wave.duration_secs = 5;
        let mut session =
            DefenseSession::with_seed(config, DifficultyProfile::builtin(), world_with(1), 3);
        session.start_game().unwrap();
        session.advance_secs(20.0);
        assert!(session.living_mob_count() > 0);

        let events = session.advance_secs(5.0);
        let ended = events.iter().find_map(|e| match e {
            SessionEvent::WaveEnded(summary) => Some(summary.clone()),
            _ => None,
        });
        let summary = ended.unwrap();
        assert_eq!(summary.outcome, WaveOutcome::Failed);
        assert_eq!(summary.reason, WaveEndReason::TimeLimit);
        assert_eq!(summary.next_wave, 1);
        assert_eq!(session.current_phase(), GamePhase::Failed);
        assert!(session
            .world()
            .announcements
            .iter()
            .any(|m| m == "Time's up! Wave 1 failed. Retrying..."));

        let events = session.advance_secs(10.0);
        assert!(events.contains(&SessionEvent::WaveAnnounced { wave: 1, delay_secs: 10.0 }));
    }

    #[test]
    fn test_countdown_broadcasts() {
        let mut config = EngineConfig::default();
        config.wave.duration_secs = 15;
        let mut session =
            DefenseSession::with_seed(config, DifficultyProfile::builtin(), world_with(1), 4);
        session.start_game().unwrap();
        session.advance_secs(20.0);

        let events = session.advance_secs(6.0);
        let countdowns: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Countdown { remaining_secs, .. } => Some(*remaining_secs),
                _ => None,
            })
            .collect();
        assert_eq!(countdowns, vec![10, 9]);
    }

    #[test]
    fn test_pause_freezes_remaining_time() {
        let mut session = active_session(1);
        session.advance_secs(7.0);
        let before = session.remaining_time();
        assert_eq!(before, 293);

        assert!(session.pause_game());
        assert!(session.is_paused());
        let events = session.advance_secs(30.0);
        assert!(wave_ended(&events).is_none());
        assert_eq!(session.remaining_time(), before);

        assert!(session.resume_game());
        assert_eq!(session.current_phase(), GamePhase::Active);
        assert!(session.remaining_time().abs_diff(before) <= 1);
    }

    #[test]
    fn test_paused_wave_does_not_complete() {
        let mut session = active_session(1);
        session.pause_game();
        kill_all(&mut session);

        let events = session.advance_secs(5.0);
        assert!(wave_ended(&events).is_none());
        assert_eq!(session.current_phase(), GamePhase::Paused);

        session.resume_game();
        let events = session.advance_secs(1.0);
        assert_eq!(wave_ended(&events), Some((WaveOutcome::Completed, 2)));
    }

    #[test]
    fn test_pause_during_preparation_delays_spawn() {
        let mut session = session_with(1);
        session.start_game().unwrap();
        session.advance_secs(10.0);
        assert_eq!(session.try_pause_game(), Ok(GamePhase::Preparing));

        session.advance_secs(20.0);
        assert_eq!(session.living_mob_count(), 0);

        session.resume_game();
        session.advance_secs(1.0);
        assert_eq!(session.current_phase(), GamePhase::Active);
        assert!(session.living_mob_count() > 0);
    }

    #[test]
    fn test_start_wave_rejected_while_paused() {
        let mut session = active_session(1);
        session.pause_game();
        assert_eq!(session.start_wave(4), Err(PhaseError::PausedWaveStart));
        assert_eq!(session.current_wave(), 1);
        assert!(session.is_paused());
    }

    #[test]
    fn test_pause_rejected_outside_running_phases() {
        let mut session = session_with(1);
        assert!(!session.pause_game());
        assert!(!session.is_paused());
        assert!(!session.resume_game());
    }

    #[test]
    fn test_stop_wave_drops_pending_ticks() {
        let mut session = active_session(1);
        assert!(session.stop_wave());
        assert!(!session.stop_wave());

        kill_all(&mut session);
        let events = session.advance_secs(30.0);
        assert!(wave_ended(&events).is_none());
        assert_eq!(session.current_wave(), 0);
        assert_eq!(session.remaining_time(), 0);
    }

    #[test]
    fn test_stop_game_cleans_up() {
        let mut session = active_session(2);
        assert!(session.living_mob_count() > 0);

        assert!(session.stop_game());
        assert!(!session.stop_game());
        assert_eq!(session.current_phase(), GamePhase::Lobby);
        assert_eq!(session.status().participants, 0);
        assert!(session.world().living_units().is_empty());
        assert!(session.take_events().contains(&SessionEvent::GameStopped));

        let events = session.advance_secs(30.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_sweep_expires_old_units() {
        let mut config = EngineConfig::default();
        config.lifecycle.unit_lifetime_secs = 5.0;
        config.wave.duration_secs = 3;
        let mut session =
            DefenseSession::with_seed(config, DifficultyProfile::builtin(), world_with(1), 5);
        session.start_game().unwrap();
        session.advance_secs(20.0);
        assert!(session.living_mob_count() > 0);

        let events = session.advance_secs(8.0);
        assert_eq!(wave_ended(&events), Some((WaveOutcome::Failed, 1)));
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::UnitsExpired { .. })));
        assert_eq!(session.status().tracked_mobs, 0);
    }

    #[test]
    fn test_lifetime_equal_to_budget_still_times_out() {
        let mut session = active_session(1);
        let living = session.living_mob_count();
        assert!(living > 0);

        let events = session.advance_secs(301.0);
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::UnitsExpired { .. })));
        assert_eq!(wave_ended(&events), Some((WaveOutcome::Failed, 1)));
        assert_eq!(session.current_phase(), GamePhase::Failed);
    }

    #[test]
    fn test_long_pause_keeps_wave_units() {
        let mut session = active_session(1);
        session.advance_secs(10.0);
        let living = session.living_mob_count();
        assert_eq!(session.remaining_time(), 290);

        assert!(session.pause_game());
        let events = session.advance_secs(400.0);
        assert!(wave_ended(&events).is_none());
        assert!(session.resume_game());
        assert_eq!(session.remaining_time(), 290);

        let events = session.advance_secs(3.0);
        assert!(wave_ended(&events).is_none());
        assert_eq!(session.current_phase(), GamePhase::Active);
        assert_eq!(session.living_mob_count(), living);
        assert!(session.remaining_time() >= 286);
    }

    #[test]
    fn test_rejected_spawns_still_run_the_wave() {
        let mut world = world_with(2);
        world.set_reject_spawns(true);
        let mut session =
            DefenseSession::with_seed(EngineConfig::default(), DifficultyProfile::builtin(), world, 7);
        session.start_game().unwrap();

        let events = session.advance_secs(20.0);
        let (requested, spawned) = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::WaveBegan { requested, spawned, .. } => Some((*requested, *spawned)),
                _ => None,
            })
            .unwrap();
        assert!(requested > spawned);
        assert_eq!(spawned, 0);

        let report = session.spawn_wave(1, 3);
        assert_eq!(report.rejected, 3);
        assert_eq!(report.spawned, 0);

        // Nothing to defeat: the wave closes on its first timer second
        let events = session.advance_secs(1.0);
        assert_eq!(wave_ended(&events), Some((WaveOutcome::Completed, 2)));
    }

    #[test]
    fn test_unplaceable_units_are_skipped() {
        let mut config = EngineConfig::default();
        // Wider than the whole sampling ring around the defenders
        config.placement.min_separation = 100.0;
        let mut session =
            DefenseSession::with_seed(config, DifficultyProfile::builtin(), world_with(1), 11);
        session.start_game().unwrap();
        session.advance_secs(20.0);
        assert_eq!(session.current_phase(), GamePhase::Active);
        assert_eq!(session.living_mob_count(), 0);

        let report = session.spawn_wave(1, 4);
        assert_eq!(
            report,
            SpawnReport {
                requested: 4,
                spawned: 0,
                unplaced: 4,
                rejected: 0,
            }
        );

        let events = session.advance_secs(1.0);
        assert_eq!(wave_ended(&events), Some((WaveOutcome::Completed, 2)));
    }

    #[test]
    fn test_last_participant_leaving_stops_game() {
        let mut session = session_with(0);
        let id = Uuid::new_v4();
        session.world_mut().add_participant(id, Vec3::new(1.0, 64.0, 1.0));
        session.start_game().unwrap();

        assert!(session.leave_participant(id));
        assert_eq!(session.current_phase(), GamePhase::Lobby);
        assert_eq!(
            session.world().announcements.last().map(String::as_str),
            Some("Game ended - All players left!")
        );
    }

    #[test]
    fn test_late_join() {
        let mut session = session_with(1);
        session.start_game().unwrap();
        let late = Uuid::new_v4();

        assert_eq!(session.join_participant(late), Err(PhaseError::GameInProgress));
        session.advance_secs(20.0);
        assert_eq!(session.join_participant(late), Ok(JoinOutcome::Joined));
        assert_eq!(session.status().participants, 2);
        assert_eq!(
            session.world().notices.last().map(|(_, m)| m.as_str()),
            Some("You've joined an active game!")
        );
    }

    #[test]
    fn test_milestone_and_game_completion() {
        let mut config = EngineConfig::default();
        config.wave.max_waves = 5;
        config.wave.preparation_secs = 1.0;
        config.wave.next_wave_delay_secs = 1.0;
        config.session.preparation_secs = 1.0;
        let mut session =
            DefenseSession::with_seed(config, DifficultyProfile::builtin(), world_with(1), 6);
        session.start_game().unwrap();

        let mut events = session.advance_secs(2.0);
        for _ in 0..5 {
            kill_all(&mut session);
            events.extend(session.advance_secs(3.0));
        }

        assert!(events.contains(&SessionEvent::MilestoneReached { wave: 5 }));
        let summary = events.iter().find_map(|e| match e {
            SessionEvent::GameCompleted(summary) => Some(summary.clone()),
            _ => None,
        });
        assert_eq!(summary.map(|s| s.waves_survived), Some(5));

        session.advance_secs(1.0);
        assert_eq!(session.current_phase(), GamePhase::Lobby);
    }

    #[test]
    fn test_manual_spawn_wave() {
        let mut session = active_session(1);
        let before = session.living_mob_count();
        let report = session.spawn_wave(3, 4);
        assert_eq!(report.requested, 4);
        assert_eq!(report.spawned, 4);
        assert_eq!(session.living_mob_count(), before + 4);

        assert_eq!(session.cleanup_remaining_mobs(), before + 4);
        assert_eq!(session.living_mob_count(), 0);
    }

    #[test]
    fn test_status_serializes() {
        let session = active_session(1);
        let status = session.status();
        assert_eq!(status.phase, GamePhase::Active);
        assert_eq!(status.wave, 1);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "ACTIVE");
        assert_eq!(json["wave_lifecycle"], "ACTIVE");
    }

    #[cfg(feature = "boss_hazards")]
    #[test]
    fn test_boss_wave_strikes() {
        let mut session = active_session(1);
        kill_all(&mut session);
        session.advance_secs(1.0);
        session.stop_wave();
        session.start_wave(10).unwrap();
        session.advance_secs(10.0);
        assert_eq!(session.current_phase(), GamePhase::Active);

        let events = session.advance_secs(5.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::HazardStruck { .. })));
        assert!(!session.world().strikes.is_empty());
    }
}
