//! Boss-wave hazard strikes
//!
//! While a boss wave is active a periodic task strikes a random participant or
//! defended unit standing inside the boundary.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::events::SessionTask;
use crate::game::scheduler::{Scheduler, TaskHandle};
use crate::host::{ParticipantRoster, WorldGeometry};
use crate::util::vec3::Vec3;

#[derive(Debug, Default)]
pub struct BossHazard {
    handle: Option<TaskHandle>,
}

impl BossHazard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start striking every `interval_secs`, replacing any running task
    pub fn start(
        &mut self,
        scheduler: &mut dyn Scheduler<SessionTask>,
        interval_secs: f32,
        generation: u64,
    ) {
        self.stop(scheduler);
        self.handle = Some(scheduler.run_periodic(interval_secs, SessionTask::HazardStrike { generation }));
    }

    /// Cancel the strike task; returns false if none was running
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler<SessionTask>) -> bool {
        match self.handle.take() {
            Some(handle) => {
                scheduler.cancel(handle);
                true
            }
            None => false,
        }
    }

    /// Random participant or defended unit inside the boundary
    pub fn pick_target<W, R>(world: &W, rng: &mut R) -> Option<Vec3>
    where
        W: ParticipantRoster + WorldGeometry + ?Sized,
        R: Rng + ?Sized,
    {
        let center = world.region_center()?;
        let targets: Vec<Vec3> = world
            .active_participant_locations()
            .into_iter()
            .chain(world.defended_unit_locations())
            .filter(|point| world.is_within_boundary(*point, center))
            .collect();
        targets.choose(rng).copied()
    }
}
