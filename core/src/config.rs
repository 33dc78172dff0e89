use crate::{
    gravimetrics::{FixedBody, GravityMode},
    types::{Seconds, Tick},
    units::DistanceUnit,
};
use serde::{Deserialize, Serialize};

/// Polling cadence of the original host loop.
pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 0.1;

/// One snapshot per ten minutes of host time at the default cadence.
pub const DEFAULT_SNAPSHOT_INTERVAL: Tick = 6000;

/// M87*: 6.6 billion solar masses, observed from 2.599e13 m.
/// Roughly two Earth seconds pass per ship second there.
pub const M87_BODY: FixedBody = FixedBody {
    mass_solar: 6.586e9,
    radius:     2.599e13,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    #[serde(default)]
    pub distance_unit: DistanceUnit,
    #[serde(default)]
    pub gravity: GravityMode,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: f64,
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: Tick,
    #[serde(default)]
    pub earth_time_offset: Seconds,
}

fn default_tick_interval() -> f64 {
    DEFAULT_TICK_INTERVAL_SECS
}

fn default_snapshot_interval() -> Tick {
    DEFAULT_SNAPSHOT_INTERVAL
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            distance_unit:      DistanceUnit::default(),
            gravity:            GravityMode::default(),
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            snapshot_interval:  DEFAULT_SNAPSHOT_INTERVAL,
            earth_time_offset:  0.0,
        }
    }
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/dilation/config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Meters, dynamic targets, snapshots every 10 ticks.
    pub fn default_test() -> Self {
        Self {
            snapshot_interval: 10,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.tick_interval_secs > 0.0) {
            anyhow::bail!("tick_interval_secs must be positive, got {}", self.tick_interval_secs);
        }
        if self.snapshot_interval == 0 {
            anyhow::bail!("snapshot_interval must be at least 1");
        }
        if !self.earth_time_offset.is_finite() {
            anyhow::bail!("earth_time_offset must be finite");
        }
        Ok(())
    }
}
