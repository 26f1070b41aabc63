//! Collaborators supplied by the host world
//!
//! The engine never touches world state directly. Spawning, terrain queries,
//! roster lookups and broadcasts all go through these traits so the same
//! orchestration code runs against a live server or [`sim::SimulatedWorld`].

pub mod sim;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::scaling::UnitSpec;
use crate::util::vec3::Vec3;

/// Unique participant identifier
pub type ParticipantId = Uuid;

/// Stable integer key for a unit spawned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitHandle(pub u64);

/// Failure reported by the host spawner
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpawnError {
    #[error("spawn rejected: {0}")]
    Rejected(String),
    #[error("spawn point obstructed")]
    Obstructed,
}

/// Creates and removes hostile units
pub trait UnitSpawner {
    fn spawn(&mut self, spec: &UnitSpec, at: Vec3) -> Result<UnitHandle, SpawnError>;
    /// False once the unit died or was removed by the host
    fn is_valid(&self, handle: UnitHandle) -> bool;
    fn remove(&mut self, handle: UnitHandle);
}

/// Terrain and boundary queries
pub trait WorldGeometry {
    /// Center of the defended region, if one is configured
    fn region_center(&self) -> Option<Vec3>;
    /// Height of the walkable surface at (x, z)
    fn surface_height(&self, x: f64, z: f64) -> f64;
    fn is_within_boundary(&self, point: Vec3, center: Vec3) -> bool;
}

/// Participants and the units they defend
pub trait ParticipantRoster {
    fn online_participants(&self) -> Vec<ParticipantId>;
    fn active_participant_locations(&self) -> Vec<Vec3>;
    fn defended_unit_locations(&self) -> Vec<Vec3>;
}

/// Broadcast and direct-message sink
pub trait Announcer {
    fn announce(&mut self, message: &str);
    fn notify(&mut self, participant: ParticipantId, message: &str);
}

/// Receives boss-wave hazard strikes
pub trait HazardSink {
    fn strike(&mut self, _point: Vec3) {}
}

/// Everything the session needs from the host
pub trait HostWorld: UnitSpawner + WorldGeometry + ParticipantRoster + Announcer + HazardSink {}

impl<T> HostWorld for T where T: UnitSpawner + WorldGeometry + ParticipantRoster + Announcer + HazardSink {}
