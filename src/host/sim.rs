//! In-process host world used by the demo binary and the tests
//!
//! Flat terrain, a circular boundary around a fixed center, participants at
//! fixed positions. Units never move; they die only when told to or through
//! [`SimulatedWorld::simulate_attrition`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{
    Announcer, HazardSink, ParticipantId, ParticipantRoster, SpawnError, UnitHandle, UnitSpawner,
    WorldGeometry,
};
use crate::game::scaling::UnitSpec;
use crate::util::vec3::Vec3;

/// A unit materialized by the simulated spawner
#[derive(Debug, Clone)]
pub struct SimulatedUnit {
    pub spec: UnitSpec,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Debug)]
pub struct SimulatedWorld {
    center: Option<Vec3>,
    boundary_radius: f64,
    surface_y: f64,
    participants: Vec<(ParticipantId, Vec3)>,
    defended: Vec<Vec3>,
    units: FxHashMap<UnitHandle, SimulatedUnit>,
    next_handle: u64,
    reject_spawns: bool,
    rng: StdRng,
    /// Broadcasts in the order they were sent
    pub announcements: Vec<String>,
    /// Direct messages in the order they were sent
    pub notices: Vec<(ParticipantId, String)>,
    /// Hazard strike points in the order they landed
    pub strikes: Vec<Vec3>,
}

impl SimulatedWorld {
    pub fn new(center: Vec3, boundary_radius: f64) -> Self {
        Self::with_seed(center, boundary_radius, rand::random())
    }

    pub fn with_seed(center: Vec3, boundary_radius: f64, seed: u64) -> Self {
        Self {
            center: Some(center),
            boundary_radius,
            surface_y: center.y,
            participants: Vec::new(),
            defended: Vec::new(),
            units: FxHashMap::default(),
            next_handle: 1,
            reject_spawns: false,
            rng: StdRng::seed_from_u64(seed),
            announcements: Vec::new(),
            notices: Vec::new(),
            strikes: Vec::new(),
        }
    }

    pub fn add_participant(&mut self, id: ParticipantId, location: Vec3) {
        self.participants.retain(|(existing, _)| *existing != id);
        self.participants.push((id, location));
    }

    pub fn remove_participant(&mut self, id: ParticipantId) {
        self.participants.retain(|(existing, _)| *existing != id);
    }

    pub fn add_defended_unit(&mut self, location: Vec3) {
        self.defended.push(location);
    }

    /// Remove the region center, as if the defended area were never set up
    pub fn clear_center(&mut self) {
        self.center = None;
    }

    pub fn set_reject_spawns(&mut self, reject: bool) {
        self.reject_spawns = reject;
    }

    pub fn unit(&self, handle: UnitHandle) -> Option<&SimulatedUnit> {
        self.units.get(&handle)
    }

    /// Handles of all units still alive
    pub fn living_units(&self) -> Vec<UnitHandle> {
        let mut handles: Vec<UnitHandle> = self
            .units
            .iter()
            .filter(|(_, unit)| unit.alive)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }

    /// Mark a unit dead; returns false if it was not alive
    pub fn kill(&mut self, handle: UnitHandle) -> bool {
        match self.units.get_mut(&handle) {
            Some(unit) if unit.alive => {
                unit.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Kill every living unit, returning their handles
    pub fn kill_all(&mut self) -> Vec<UnitHandle> {
        let handles = self.living_units();
        for handle in &handles {
            self.kill(*handle);
        }
        handles
    }

    /// Kill each living unit with the given probability
    pub fn simulate_attrition(&mut self, kill_chance: f64) -> Vec<UnitHandle> {
        let chance = kill_chance.clamp(0.0, 1.0);
        let victims: Vec<UnitHandle> = self
            .living_units()
            .into_iter()
            .filter(|_| self.rng.gen_bool(chance))
            .collect();
        for handle in &victims {
            self.kill(*handle);
        }
        victims
    }
}

impl UnitSpawner for SimulatedWorld {
    fn spawn(&mut self, spec: &UnitSpec, at: Vec3) -> Result<UnitHandle, SpawnError> {
        if self.reject_spawns {
            return Err(SpawnError::Rejected("spawning disabled".to_string()));
        }
        let Some(center) = self.center else {
            return Err(SpawnError::Obstructed);
        };
        if !self.is_within_boundary(at, center) {
            return Err(SpawnError::Obstructed);
        }

        let handle = UnitHandle(self.next_handle);
        self.next_handle += 1;
        self.units.insert(
            handle,
            SimulatedUnit {
                spec: spec.clone(),
                position: at,
                alive: true,
            },
        );
        Ok(handle)
    }

    fn is_valid(&self, handle: UnitHandle) -> bool {
        self.units.get(&handle).map_or(false, |unit| unit.alive)
    }

    fn remove(&mut self, handle: UnitHandle) {
        self.units.remove(&handle);
    }
}

impl WorldGeometry for SimulatedWorld {
    fn region_center(&self) -> Option<Vec3> {
        self.center
    }

    fn surface_height(&self, _x: f64, _z: f64) -> f64 {
        self.surface_y
    }

    fn is_within_boundary(&self, point: Vec3, center: Vec3) -> bool {
        point.horizontal_distance_to(center) <= self.boundary_radius
    }
}

impl ParticipantRoster for SimulatedWorld {
    fn online_participants(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|(id, _)| *id).collect()
    }

    fn active_participant_locations(&self) -> Vec<Vec3> {
        self.participants.iter().map(|(_, location)| *location).collect()
    }

    fn defended_unit_locations(&self) -> Vec<Vec3> {
        self.defended.clone()
    }
}

impl Announcer for SimulatedWorld {
    fn announce(&mut self, message: &str) {
        debug!("[broadcast] {}", message);
        self.announcements.push(message.to_string());
    }

    fn notify(&mut self, participant: ParticipantId, message: &str) {
        debug!("[to {}] {}", participant, message);
        self.notices.push((participant, message.to_string()));
    }
}

impl HazardSink for SimulatedWorld {
    fn strike(&mut self, point: Vec3) {
        self.strikes.push(point);
    }
}
