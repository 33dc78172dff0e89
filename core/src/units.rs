//! Physical constants and host distance units.

use crate::types::Meters;
use serde::{Deserialize, Serialize};

/// Speed of light in vacuum (m/s).
pub const C: f64 = 299_792_458.0;

/// G / c², in m/kg.
pub const G_OVER_C_SQUARED: f64 = 7.4214e-28;

/// Mass of the Sun (kg).
pub const SOLAR_MASS: f64 = 1.9891e30;

pub const METERS_PER_KILOMETER: f64 = 1.0e3;
pub const METERS_PER_AU: f64 = 1.495_978_707e11;
pub const METERS_PER_LIGHT_YEAR: f64 = 9.460_730_472_580_8e15;
pub const METERS_PER_PARSEC: f64 = 3.085_677_581_491_367e16;

/// The distance unit the host uses for positions and body radii.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    AstronomicalUnits,
    LightYears,
    Parsecs,
}

impl DistanceUnit {
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            Self::Meters            => 1.0,
            Self::Kilometers        => METERS_PER_KILOMETER,
            Self::AstronomicalUnits => METERS_PER_AU,
            Self::LightYears        => METERS_PER_LIGHT_YEAR,
            Self::Parsecs           => METERS_PER_PARSEC,
        }
    }

    pub fn to_meters(&self, value: f64) -> Meters {
        value * self.meters_per_unit()
    }
}
