pub mod constants;
pub mod difficulty;
pub mod scheduler;
pub mod events;
pub mod phase;
pub mod wave;
pub mod outcome;
pub mod composer;
pub mod placement;
pub mod scaling;
pub mod tracker;
pub mod orchestrator;

#[cfg(feature = "boss_hazards")]
pub mod hazard;
