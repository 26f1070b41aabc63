//! Per-wave lifecycle controller
//!
//! Announces waves, materializes their units, runs the once-per-second wave
//! timer and decides between advancing and repeating. All suspension goes
//! through the scheduler: every continuation carries the generation that was
//! current when it was queued, and `stop_wave`/`start_wave` bump the
//! generation so anything already queued for the old wave is dropped.

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

#[cfg(feature = "boss_hazards")]
use crate::config::HazardSettings;
use crate::config::{EngineConfig, WaveSettings};
use crate::game::composer::EncounterComposer;
use crate::game::constants::tick::{PAUSE_RECHECK_INTERVAL, TIMER_INTERVAL};
use crate::game::difficulty::DifficultyProfile;
use crate::game::events::{SessionEvent, SessionTask};
#[cfg(feature = "boss_hazards")]
use crate::game::hazard::BossHazard;
use crate::game::outcome::{
    check_wave_end, is_milestone, next_wave_number, GameSummary, WaveEndReason, WaveOutcome,
    WaveSummary,
};
use crate::game::phase::{GamePhase, PhaseError, PhaseMachine};
use crate::game::placement::{gather_avoid_points, SpawnPlacer};
use crate::game::scaling::WaveScaling;
use crate::game::scheduler::{Scheduler, TaskHandle};
use crate::game::tracker::EntityLifecycleTracker;
use crate::game::wave::WaveState;
use crate::host::HostWorld;

/// Mutable session state the orchestrator works on, borrowed per call
pub struct WaveContext<'a, W: HostWorld + ?Sized> {
    pub phase: &'a mut PhaseMachine,
    pub tracker: &'a mut EntityLifecycleTracker,
    pub scheduler: &'a mut dyn Scheduler<SessionTask>,
    pub world: &'a mut W,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Vec<SessionEvent>,
}

impl<'a, W: HostWorld + ?Sized> WaveContext<'a, W> {
    fn announce(&mut self, message: &str) {
        self.world.announce(message);
    }
}

/// Result of materializing a wave's units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub requested: usize,
    pub spawned: usize,
    /// Units dropped because no valid point was found
    pub unplaced: usize,
    /// Units the host refused to spawn
    pub rejected: usize,
}

#[derive(Debug)]
pub struct WaveOrchestrator {
    settings: WaveSettings,
    #[cfg(feature = "boss_hazards")]
    hazard_settings: HazardSettings,
    composer: EncounterComposer,
    placer: SpawnPlacer,
    scaling: WaveScaling,
    state: WaveState,
    /// Freshness token for queued continuations
    generation: u64,
    timer: Option<TaskHandle>,
    /// Outstanding one-shot continuation (wave start, next wave or game end)
    pending: Option<TaskHandle>,
    #[cfg(feature = "boss_hazards")]
    hazard: BossHazard,
}

impl WaveOrchestrator {
    pub fn new(config: &EngineConfig, profile: DifficultyProfile) -> Self {
        Self {
            settings: config.wave,
            #[cfg(feature = "boss_hazards")]
            hazard_settings: config.hazard,
            composer: EncounterComposer::new(profile, config.composer),
            placer: SpawnPlacer::new(config.placement),
            scaling: WaveScaling::new(config.scaling),
            state: WaveState::default(),
            generation: 0,
            timer: None,
            pending: None,
            #[cfg(feature = "boss_hazards")]
            hazard: BossHazard::new(),
        }
    }

    pub fn state(&self) -> &WaveState {
        &self.state
    }

    pub fn composer(&self) -> &EncounterComposer {
        &self.composer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a continuation carrying `generation` is still current
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Generation whose wave timer is running, if any
    pub fn live_generation(&self) -> Option<u64> {
        self.state.is_active().then_some(self.generation)
    }

    /// Seconds left in the active wave's budget
    pub fn remaining_time(&self) -> u32 {
        self.state.remaining_secs()
    }

    /// Announce wave `wave` and schedule its units after the preparation delay
    ///
    /// Rejected while paused; the request is not queued.
    pub fn start_wave<W: HostWorld + ?Sized>(
        &mut self,
        ctx: &mut WaveContext<'_, W>,
        wave: u32,
    ) -> Result<(), PhaseError> {
        if let Err(e) = ctx.phase.prepare() {
            warn!("Wave {} not started: {}", wave, e);
            return Err(e);
        }

        self.cancel_all(ctx.scheduler);
        self.generation += 1;
        self.state.prepare(wave, self.settings.duration_secs);

        let delay = self.settings.preparation_secs;
        ctx.announce(&format!("Wave {} starting in {} seconds!", wave, delay));
        ctx.events.push(SessionEvent::WaveAnnounced {
            wave,
            delay_secs: delay,
        });
        self.pending = Some(ctx.scheduler.run_after(
            delay,
            SessionTask::BeginWave {
                wave,
                generation: self.generation,
            },
        ));

        info!("Wave {} announced (generation {})", wave, self.generation);
        Ok(())
    }

    /// Preparation elapsed: start the timer and spawn the wave
    pub fn on_begin_wave<W: HostWorld + ?Sized>(
        &mut self,
        ctx: &mut WaveContext<'_, W>,
        wave: u32,
        generation: u64,
    ) {
        if !self.is_current(generation) {
            debug!("Dropping stale wave start (generation {})", generation);
            return;
        }
        self.pending = None;

        if ctx.phase.is_paused() {
            self.pending = Some(
                ctx.scheduler
                    .run_after(PAUSE_RECHECK_INTERVAL, SessionTask::BeginWave { wave, generation }),
            );
            return;
        }

        if let Err(e) = ctx.phase.activate() {
            warn!("Wave {} cannot begin: {}", wave, e);
            return;
        }

        self.state.activate(ctx.scheduler.now_secs());
        self.timer = Some(
            ctx.scheduler
                .run_periodic(TIMER_INTERVAL, SessionTask::WaveTimer { generation }),
        );

        let requested = self.settings.mob_count(wave, ctx.phase.roster_size());
        let report = self.spawn_wave(ctx, wave, requested);
        self.state.requested = report.requested;
        self.state.spawned = report.spawned;

        ctx.announce(&format!("Wave {} has begun!", wave));
        ctx.events.push(SessionEvent::WaveBegan {
            wave,
            requested: report.requested,
            spawned: report.spawned,
        });

        if self.scaling.is_boss_wave(wave) {
            ctx.announce("A boss approaches!");
            #[cfg(feature = "boss_hazards")]
            self.hazard
                .start(ctx.scheduler, self.hazard_settings.strike_interval_secs, generation);
        }

        info!(
            "Wave {} active: {}/{} units, {}s budget",
            wave, report.spawned, report.requested, self.state.duration_budget_secs
        );
    }

    /// Compose, place and spawn `count` units for `wave`
    ///
    /// Units with no valid spawn point are skipped.
    pub fn spawn_wave<W: HostWorld + ?Sized>(
        &mut self,
        ctx: &mut WaveContext<'_, W>,
        wave: u32,
        count: usize,
    ) -> SpawnReport {
        let mut report = SpawnReport {
            requested: count,
            ..SpawnReport::default()
        };
        if count == 0 {
            return report;
        }

        let picks = self.composer.compose(wave, count, ctx.rng);
        let specs = self.scaling.specs_for(
            wave,
            ctx.phase.roster_size(),
            &picks,
            self.composer.profile(),
            ctx.rng,
        );
        let avoid = gather_avoid_points(&*ctx.world);

        for spec in &specs {
            let Some(point) = self.placer.place(&*ctx.world, &avoid, ctx.rng) else {
                report.unplaced += 1;
                continue;
            };
            match ctx.world.spawn(spec, point) {
                Ok(handle) => {
                    ctx.tracker.register(handle, wave, self.generation);
                    report.spawned += 1;
                }
                Err(e) => {
                    debug!("Failed to spawn {}: {}", spec.label, e);
                    report.rejected += 1;
                }
            }
        }

        if report.spawned < report.requested {
            warn!(
                "Wave {}: spawned {} of {} units ({} unplaced, {} rejected)",
                wave, report.spawned, report.requested, report.unplaced, report.rejected
            );
        }
        report
    }

    /// Once-per-second wave timer
    pub fn on_timer_tick<W: HostWorld + ?Sized>(&mut self, ctx: &mut WaveContext<'_, W>, generation: u64) {
        if !self.is_current(generation) || ctx.phase.is_paused() || !self.state.is_active() {
            return;
        }

        self.state.record_second();
        let living = ctx.tracker.living_count(&*ctx.world);

        match check_wave_end(living, &self.state) {
            Some(reason) => {
                if let Err(e) = ctx.phase.finish(reason.outcome()) {
                    warn!("Wave {} ended outside ACTIVE: {}", self.state.number, e);
                }
                if reason == WaveEndReason::TimeLimit {
                    ctx.announce(&format!(
                        "Time's up! Wave {} failed. Retrying...",
                        self.state.number
                    ));
                }
                self.complete_wave(ctx, reason);
            }
            None => {
                let remaining = self.state.remaining_secs();
                if remaining > 0 && remaining <= self.settings.countdown_secs {
                    ctx.announce(&format!("{} seconds remaining!", remaining));
                    ctx.events.push(SessionEvent::Countdown {
                        wave: self.state.number,
                        remaining_secs: remaining,
                    });
                }
                debug!(
                    "Wave {}: {} living, {}s remaining",
                    self.state.number, living, remaining
                );
            }
        }
    }

    /// Close the current wave and schedule whatever comes next
    pub fn complete_wave<W: HostWorld + ?Sized>(
        &mut self,
        ctx: &mut WaveContext<'_, W>,
        reason: WaveEndReason,
    ) {
        self.cancel_timer(ctx.scheduler);
        #[cfg(feature = "boss_hazards")]
        self.hazard.stop(ctx.scheduler);

        let wave = self.state.number;
        let outcome = reason.outcome();
        let next_wave = next_wave_number(wave, outcome);
        self.state.finish();

        ctx.events.push(SessionEvent::WaveEnded(WaveSummary {
            wave,
            outcome,
            reason,
            elapsed_secs: self.state.elapsed_secs,
            requested: self.state.requested,
            spawned: self.state.spawned,
            next_wave,
        }));
        info!("Wave {} ended: {:?} ({:?}), next wave {}", wave, outcome, reason, next_wave);

        if outcome == WaveOutcome::Completed {
            ctx.announce(&format!("Wave {} completed!", wave));

            if is_milestone(wave, self.settings.milestone_interval) {
                ctx.announce(&format!("Milestone reached: wave {}!", wave));
                ctx.events.push(SessionEvent::MilestoneReached { wave });
            }

            if self.settings.max_waves > 0 && wave >= self.settings.max_waves {
                self.complete_game(ctx, wave);
                return;
            }
        }

        self.pending = Some(ctx.scheduler.run_after(
            self.settings.next_wave_delay_secs,
            SessionTask::StartWave {
                wave: next_wave,
                generation: self.generation,
            },
        ));
    }

    fn complete_game<W: HostWorld + ?Sized>(&mut self, ctx: &mut WaveContext<'_, W>, wave: u32) {
        let summary = GameSummary {
            waves_survived: wave,
            defended_units: ctx.world.defended_unit_locations().len(),
            participants: ctx.phase.roster_size(),
        };

        ctx.announce("=== Game Completed! ===");
        ctx.announce(&format!("Waves Survived: {}", summary.waves_survived));
        ctx.announce(&format!("Defended Units Protected: {}", summary.defended_units));
        info!("Game completed after {} waves", wave);
        ctx.events.push(SessionEvent::GameCompleted(summary));

        self.pending = Some(ctx.scheduler.run_after(
            self.settings.next_wave_delay_secs,
            SessionTask::FinishGame {
                generation: self.generation,
            },
        ));
    }

    /// Next-wave delay elapsed
    pub fn on_start_wave<W: HostWorld + ?Sized>(
        &mut self,
        ctx: &mut WaveContext<'_, W>,
        wave: u32,
        generation: u64,
    ) {
        if !self.is_current(generation) {
            debug!("Dropping stale next-wave request (generation {})", generation);
            return;
        }
        self.pending = None;

        if ctx.phase.phase() == GamePhase::Paused {
            self.pending = Some(
                ctx.scheduler
                    .run_after(PAUSE_RECHECK_INTERVAL, SessionTask::StartWave { wave, generation }),
            );
            return;
        }

        // Errors are logged by start_wave
        let _ = self.start_wave(ctx, wave);
    }

    /// Boss-wave hazard strike
    #[cfg(feature = "boss_hazards")]
    pub fn on_hazard_strike<W: HostWorld + ?Sized>(&mut self, ctx: &mut WaveContext<'_, W>, generation: u64) {
        if !self.is_current(generation) || ctx.phase.is_paused() {
            return;
        }
        if let Some(point) = BossHazard::pick_target(&*ctx.world, ctx.rng) {
            ctx.world.strike(point);
            ctx.events.push(SessionEvent::HazardStruck { point });
        }
    }

    /// Cancel every continuation and zero the wave state
    ///
    /// Returns false if there was nothing to stop.
    pub fn stop_wave(&mut self, scheduler: &mut dyn Scheduler<SessionTask>) -> bool {
        let was_live = self.cancel_all(scheduler) || self.state.number != 0;
        self.generation += 1;
        self.state.reset();
        self.placer.reset();
        if was_live {
            info!("Wave stopped");
        }
        was_live
    }

    fn cancel_timer(&mut self, scheduler: &mut dyn Scheduler<SessionTask>) -> bool {
        match self.timer.take() {
            Some(handle) => scheduler.cancel(handle),
            None => false,
        }
    }

    fn cancel_all(&mut self, scheduler: &mut dyn Scheduler<SessionTask>) -> bool {
        let mut cancelled = self.cancel_timer(scheduler);
        if let Some(handle) = self.pending.take() {
            cancelled |= scheduler.cancel(handle);
        }
        #[cfg(feature = "boss_hazards")]
        {
            cancelled |= self.hazard.stop(scheduler);
        }
        cancelled
    }
}
