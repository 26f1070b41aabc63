//! Holdfast Engine Library
//!
//! Wave orchestration and procedural encounter composition for cooperative
//! defense games layered on a host world.
//!
//! The host supplies spawning, terrain, roster and broadcast collaborators
//! (see [`host`]) and drives a [`session::DefenseSession`] once per tick.
//!
//! # Features
//!
//! - `boss_hazards` - Periodic hazard strikes during boss waves (enabled by default)

pub mod config;
pub mod util;
pub mod game;
pub mod host;
pub mod session;
