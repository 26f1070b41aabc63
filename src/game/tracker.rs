//! Spawned unit bookkeeping
//!
//! The tracker's live count is the only signal used to decide that a wave has
//! been cleared. Units are keyed by the host's stable [`UnitHandle`].
//!
//! Ages are measured on the tracker's own clock, which the session only
//! advances while the game is not paused. Units spawned under the generation
//! whose wave timer is still running never expire; only the timer decides how
//! that wave ends.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::host::{UnitHandle, UnitSpawner};

/// A unit spawned by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedUnit {
    pub handle: UnitHandle,
    /// Tracker clock at spawn time
    pub spawned_at_secs: f64,
    pub wave: u32,
    /// Wave generation that spawned the unit
    pub generation: u64,
}

/// Entries removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Units the host no longer considers valid
    pub invalid: usize,
    /// Units that outlived the lifetime limit
    pub expired: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.invalid + self.expired
    }
}

#[derive(Debug, Clone)]
pub struct EntityLifecycleTracker {
    units: FxHashMap<UnitHandle, TrackedUnit>,
    lifetime_secs: f64,
    /// Unpaused seconds since creation
    clock_secs: f64,
}

impl EntityLifecycleTracker {
    pub fn new(lifetime_secs: f64) -> Self {
        Self {
            units: FxHashMap::default(),
            lifetime_secs,
            clock_secs: 0.0,
        }
    }

    /// Age every tracked unit by `secs`
    pub fn advance(&mut self, secs: f64) {
        self.clock_secs += secs;
    }

    pub fn clock_secs(&self) -> f64 {
        self.clock_secs
    }

    pub fn register(&mut self, handle: UnitHandle, wave: u32, generation: u64) {
        self.units.insert(
            handle,
            TrackedUnit {
                handle,
                spawned_at_secs: self.clock_secs,
                wave,
                generation,
            },
        );
    }

    pub fn age_secs(&self, handle: UnitHandle) -> Option<f64> {
        self.units
            .get(&handle)
            .map(|unit| self.clock_secs - unit.spawned_at_secs)
    }

    /// Death or removal notification; returns true if the unit was tracked
    pub fn forget(&mut self, handle: UnitHandle) -> bool {
        self.units.remove(&handle).is_some()
    }

    pub fn get(&self, handle: UnitHandle) -> Option<&TrackedUnit> {
        self.units.get(&handle)
    }

    /// Entries still held, valid or not
    pub fn tracked_count(&self) -> usize {
        self.units.len()
    }

    /// Tracked units the host still considers valid
    pub fn living_count<S: UnitSpawner + ?Sized>(&self, spawner: &S) -> usize {
        self.units
            .keys()
            .filter(|handle| spawner.is_valid(**handle))
            .count()
    }

    /// Drop invalid and expired entries, removing their units from the world
    ///
    /// Units of the `live_generation` wave are exempt from expiry.
    pub fn sweep<S: UnitSpawner + ?Sized>(
        &mut self,
        spawner: &mut S,
        live_generation: Option<u64>,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        let lifetime = self.lifetime_secs;
        let now = self.clock_secs;

        self.units.retain(|handle, unit| {
            if !spawner.is_valid(*handle) {
                report.invalid += 1;
            } else if Some(unit.generation) != live_generation
                && now - unit.spawned_at_secs >= lifetime
            {
                report.expired += 1;
            } else {
                return true;
            }
            spawner.remove(*handle);
            false
        });

        if report.total() > 0 {
            debug!(
                "Sweep removed {} invalid and {} expired units",
                report.invalid, report.expired
            );
        }
        report
    }

    /// Remove every tracked unit from the world; returns how many were held
    pub fn clear<S: UnitSpawner + ?Sized>(&mut self, spawner: &mut S) -> usize {
        let count = self.units.len();
        for handle in self.units.keys() {
            spawner.remove(*handle);
        }
        self.units.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::difficulty::UnitType;
    use crate::game::scaling::{label, UnitRank, UnitSpec, UnitTraits};
    use crate::host::sim::SimulatedWorld;
    use crate::util::vec3::Vec3;

    fn spawn(world: &mut SimulatedWorld) -> UnitHandle {
        let spec = UnitSpec {
            unit_type: UnitType::Skeleton,
            rank: UnitRank::Normal,
            wave: 1,
            traits: UnitTraits::default(),
            label: label(UnitType::Skeleton, UnitRank::Normal, 1),
        };
        world.spawn(&spec, Vec3::new(10.0, 0.0, 10.0)).unwrap()
    }

    #[test]
    fn test_living_count_filters_invalid() {
        let mut world = SimulatedWorld::with_seed(Vec3::ZERO, 50.0, 1);
        let mut tracker = EntityLifecycleTracker::new(300.0);

        let a = spawn(&mut world);
        let b = spawn(&mut world);
        tracker.register(a, 1, 1);
        tracker.register(b, 1, 1);
        assert_eq!(tracker.living_count(&world), 2);

        world.kill(a);
        assert_eq!(tracker.living_count(&world), 1);
        assert_eq!(tracker.tracked_count(), 2);
    }

    #[test]
    fn test_forget_on_death() {
        let mut tracker = EntityLifecycleTracker::new(300.0);
        tracker.register(UnitHandle(7), 1, 1);
        assert!(tracker.forget(UnitHandle(7)));
        assert!(!tracker.forget(UnitHandle(7)));
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_sweep_removes_invalid_and_expired() {
        let mut world = SimulatedWorld::with_seed(Vec3::ZERO, 50.0, 1);
        let mut tracker = EntityLifecycleTracker::new(300.0);

        let dead = spawn(&mut world);
        let old = spawn(&mut world);
        let fresh = spawn(&mut world);
        tracker.register(old, 1, 1);
        tracker.advance(100.0);
        tracker.register(dead, 1, 1);
        tracker.register(fresh, 1, 1);
        tracker.advance(200.0);
        world.kill(dead);

        let report = tracker.sweep(&mut world, None);
        assert_eq!(report, SweepReport { invalid: 1, expired: 1 });
        assert_eq!(tracker.tracked_count(), 1);
        assert!(tracker.get(fresh).is_some());
        assert!(world.unit(old).is_none());
        assert!(world.unit(dead).is_none());
        assert!(world.is_valid(fresh));
    }

    #[test]
    fn test_clear_removes_units_from_world() {
        let mut world = SimulatedWorld::with_seed(Vec3::ZERO, 50.0, 1);
        let mut tracker = EntityLifecycleTracker::new(300.0);
        for _ in 0..4 {
            let handle = spawn(&mut world);
            tracker.register(handle, 2, 1);
        }

        assert_eq!(tracker.clear(&mut world), 4);
        assert_eq!(tracker.living_count(&world), 0);
        assert!(world.living_units().is_empty());
    }

    #[test]
    fn test_live_generation_never_expires() {
        let mut world = SimulatedWorld::with_seed(Vec3::ZERO, 50.0, 1);
        let mut tracker = EntityLifecycleTracker::new(300.0);

        let previous = spawn(&mut world);
        tracker.register(previous, 1, 1);
        let current = spawn(&mut world);
        tracker.register(current, 1, 2);
        tracker.advance(1_000.0);

        let report = tracker.sweep(&mut world, Some(2));
        assert_eq!(report, SweepReport { invalid: 0, expired: 1 });
        assert!(tracker.get(current).is_some());
        assert!(world.unit(previous).is_none());

        // Once the wave's timer is gone the same unit ages out
        let report = tracker.sweep(&mut world, None);
        assert_eq!(report.expired, 1);
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_age_follows_tracker_clock() {
        let mut tracker = EntityLifecycleTracker::new(300.0);
        tracker.advance(5.0);
        tracker.register(UnitHandle(3), 1, 1);
        tracker.advance(2.5);
        assert_eq!(tracker.age_secs(UnitHandle(3)), Some(2.5));
        assert_eq!(tracker.age_secs(UnitHandle(4)), None);
    }
}
