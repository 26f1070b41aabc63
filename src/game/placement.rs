//! Spawn point search inside the containment boundary
//!
//! Candidates are drawn from an inset ring around the region center (between
//! `inner_fraction` and `outer_fraction` of the containment radius), dropped
//! onto the surface, then checked against the boundary and the separation
//! distance from every participant and defended unit.

use std::f64::consts::TAU;

use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::config::PlacementSettings;
use crate::host::{ParticipantRoster, WorldGeometry};
use crate::util::vec3::Vec3;

/// Points a spawn must keep its distance from
pub type AvoidPoints = SmallVec<[Vec3; 16]>;

/// A sampled spawn point and whether it passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCandidate {
    pub point: Vec3,
    pub valid: bool,
}

/// Collect participant and defended unit positions from the roster
pub fn gather_avoid_points<R: ParticipantRoster + ?Sized>(roster: &R) -> AvoidPoints {
    let mut points = AvoidPoints::new();
    points.extend(roster.active_participant_locations());
    points.extend(roster.defended_unit_locations());
    points
}

#[derive(Debug, Clone)]
pub struct SpawnPlacer {
    settings: PlacementSettings,
    /// Most recent point that passed validation
    last_success: Option<Vec3>,
}

impl SpawnPlacer {
    pub fn new(settings: PlacementSettings) -> Self {
        Self {
            settings,
            last_success: None,
        }
    }

    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }

    pub fn last_success(&self) -> Option<Vec3> {
        self.last_success
    }

    /// Forget the cached point
    pub fn reset(&mut self) {
        self.last_success = None;
    }

    /// Inside the boundary and at least `min_separation` from every avoid point
    pub fn is_valid_point<G: WorldGeometry + ?Sized>(
        &self,
        point: Vec3,
        center: Vec3,
        geometry: &G,
        avoid: &[Vec3],
    ) -> bool {
        if !geometry.is_within_boundary(point, center) {
            return false;
        }
        let min_sq = self.settings.min_separation * self.settings.min_separation;
        avoid.iter().all(|other| point.distance_sq_to(*other) >= min_sq)
    }

    /// Draw one point from the sampling ring and validate it
    pub fn sample_candidate<G, R>(
        &self,
        center: Vec3,
        geometry: &G,
        avoid: &[Vec3],
        rng: &mut R,
    ) -> SpawnCandidate
    where
        G: WorldGeometry + ?Sized,
        R: Rng + ?Sized,
    {
        let radius = self.settings.containment_radius;
        let inner = radius * self.settings.inner_fraction;
        let outer = radius * self.settings.outer_fraction;

        let angle = rng.gen_range(0.0..TAU);
        let distance = if outer > inner {
            rng.gen_range(inner..=outer)
        } else {
            inner
        };

        let ground = center.offset_polar(angle, distance);
        let point = ground.with_y(geometry.surface_height(ground.x, ground.z));

        SpawnCandidate {
            point,
            valid: self.is_valid_point(point, center, geometry, avoid),
        }
    }

    /// One search of `attempts_per_search` candidates
    pub fn search<G, R>(
        &mut self,
        center: Vec3,
        geometry: &G,
        avoid: &[Vec3],
        rng: &mut R,
    ) -> Option<Vec3>
    where
        G: WorldGeometry + ?Sized,
        R: Rng + ?Sized,
    {
        for _ in 0..self.settings.attempts_per_search {
            let candidate = self.sample_candidate(center, geometry, avoid, rng);
            if candidate.valid {
                self.last_success = Some(candidate.point);
                return Some(candidate.point);
            }
        }
        None
    }

    /// Find a spawn point, falling back to the cached one
    ///
    /// The cached point is re-validated against the current avoid points, so
    /// a participant standing on it yields no placement rather than an unsafe
    /// one.
    pub fn place<G, R>(&mut self, geometry: &G, avoid: &[Vec3], rng: &mut R) -> Option<Vec3>
    where
        G: WorldGeometry + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(center) = geometry.region_center() else {
            warn!("No region center available; cannot place units");
            return None;
        };

        for _ in 0..self.settings.search_rounds {
            if let Some(point) = self.search(center, geometry, avoid, rng) {
                return Some(point);
            }
        }

        let fallback = self
            .last_success
            .filter(|point| self.is_valid_point(*point, center, geometry, avoid));
        match fallback {
            Some(point) => debug!("Placement exhausted; reusing last spawn point {:?}", point),
            None => debug!("Placement exhausted with no usable fallback"),
        }
        fallback
    }
}
