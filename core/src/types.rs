//! Shared primitive types used across the entire simulation.

/// One host polling step. Counted whether or not time accumulated.
pub type Tick = u64;

/// Seconds of elapsed time, in whichever frame the context names.
pub type Seconds = f64;

/// A distance in meters (SI). Host-native distances are converted
/// through `DistanceUnit` before reaching the physics.
pub type Meters = f64;

/// The canonical run identifier.
pub type RunId = String;
