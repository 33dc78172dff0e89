//! Relativistic ship/Earth time accounting for a host-driven simulation.
//!
//! The host samples the observer's position and clock every tick; the
//! [`clock::SimulationClock`] turns consecutive samples into a velocity,
//! combines special- and general-relativistic dilation, and accumulates
//! ship time and Earth time. [`engine::SimEngine`] wraps the clock with a
//! SQLite run log.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod gravimetrics;
pub mod host;
pub mod kinematics;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod units;
