//! Gravimetrics: weak-field Schwarzschild dilation around one body.
//!
//! `factor = 1 / sqrt(1 − 2·G/c² · M/R)`. Inside the Schwarzschild
//! radius (boundary included) the factor is NaN, which the clock treats as "inside a black
//! hole" and never accumulates.

use crate::{
    host::TargetBody,
    types::Meters,
    units::{DistanceUnit, G_OVER_C_SQUARED, SOLAR_MASS},
};
use serde::{Deserialize, Serialize};

/// Host class name of gravitating targets in dynamic-target mode.
pub const DEFAULT_BODY_CLASS: &str = "blackHoleClass";

/// Earth-frame seconds per ship-frame second due to gravity alone.
pub fn gravity_dilation(mass_kg: f64, radius_m: Meters) -> f64 {
    if mass_kg == 0.0 || radius_m == 0.0 {
        return 1.0;
    }

    // At or inside the horizon; compared on radii so the boundary is exact.
    if radius_m <= schwarzschild_radius(mass_kg) {
        return f64::NAN;
    }
    let compactness = 2.0 * G_OVER_C_SQUARED * (mass_kg / radius_m);
    1.0 / (1.0 - compactness).sqrt()
}

/// Schwarzschild radius of a body (m).
pub fn schwarzschild_radius(mass_kg: f64) -> Meters {
    2.0 * G_OVER_C_SQUARED * mass_kg
}

/// A body described in host terms: solar masses and host distance units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FixedBody {
    pub mass_solar: f64,
    pub radius:     f64,
}

impl FixedBody {
    pub fn mass_kg(&self) -> f64 {
        self.mass_solar * SOLAR_MASS
    }

    pub fn factor(&self, unit: DistanceUnit) -> f64 {
        gravity_dilation(self.mass_kg(), unit.to_meters(self.radius))
    }
}

/// How the gravitating body is chosen each tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GravityMode {
    /// No gravitational term.
    Flat,
    /// Always orbiting the same body, regardless of target.
    FixedBody { body: FixedBody },
    /// Use the host's active target when its class marks it as a
    /// gravitating body, otherwise the fallback (if any).
    DynamicTarget {
        #[serde(default = "default_body_class")]
        body_class: String,
        #[serde(default)]
        fallback: Option<FixedBody>,
    },
}

fn default_body_class() -> String {
    DEFAULT_BODY_CLASS.to_string()
}

impl Default for GravityMode {
    fn default() -> Self {
        Self::DynamicTarget { body_class: default_body_class(), fallback: None }
    }
}

impl GravityMode {
    /// Resolve the body acting on the observer this tick.
    pub fn active_body(&self, target: Option<&TargetBody>) -> Option<FixedBody> {
        match self {
            Self::Flat => None,
            Self::FixedBody { body } => Some(*body),
            Self::DynamicTarget { body_class, fallback } => target
                .filter(|t| t.class == *body_class)
                .map(|t| FixedBody { mass_solar: t.mass_solar, radius: t.radius })
                .or(*fallback),
        }
    }

    /// Gravity factor for this tick; 1 when no body applies.
    pub fn factor(&self, target: Option<&TargetBody>, unit: DistanceUnit) -> f64 {
        self.active_body(target).map_or(1.0, |body| body.factor(unit))
    }
}
