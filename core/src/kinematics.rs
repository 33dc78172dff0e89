//! Kinematics: velocity and special-relativistic dilation from a
//! measured displacement and the proper time it took.
//!
//! `distance` is measured in the Earth frame; `proper_time` is what the
//! ship's own clock recorded while covering it. Solving
//! `L = v · γ · τ` for `v` gives `v = c / sqrt(1 + (c·τ / L)²)`, which
//! stays below c for every finite input, so no clamping is applied.

use crate::{
    types::{Meters, Seconds},
    units::C,
};
use glam::DVec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DilationResult {
    /// Velocity relative to the Earth frame (m/s).
    pub velocity: f64,
    /// Earth-frame seconds elapsed per ship-frame second.
    pub t_earth_rate: f64,
    /// Earth-frame seconds implied by the tick.
    pub t_earth: Seconds,
}

impl DilationResult {
    /// No motion: both clocks agree.
    pub fn at_rest(proper_time: Seconds) -> Self {
        Self { velocity: 0.0, t_earth_rate: 1.0, t_earth: proper_time }
    }

    /// Velocity as a percentage of the speed of light.
    pub fn light_percent(&self) -> f64 {
        self.velocity / C * 100.0
    }
}

/// Displacement and elapsed proper time for one tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickDelta {
    pub distance: Meters,
    pub delta_t:  Seconds,
}

/// Compute velocity and the Earth/ship rate for one tick.
///
/// `proper_time` must be non-zero; the clock short-circuits
/// zero-length ticks before calling this.
pub fn velocity_and_dilation(distance: Meters, proper_time: Seconds) -> DilationResult {
    if distance == 0.0 {
        return DilationResult::at_rest(proper_time);
    }

    let ratio = C * proper_time / distance;
    let velocity = C / (1.0 + ratio * ratio).sqrt();
    let t_earth = distance / velocity;

    DilationResult {
        velocity,
        t_earth_rate: t_earth / proper_time,
        t_earth,
    }
}

/// Euclidean distance between two host positions, converted to meters.
pub fn displacement(from: DVec3, to: DVec3, meters_per_unit: f64) -> Meters {
    from.distance(to) * meters_per_unit
}
