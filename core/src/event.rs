//! Diagnostic events: what happened during a tick.
//!
//! The clock emits these alongside its display output; the engine
//! persists them to the run log. They never feed back into the physics.

use crate::{
    command::ControlMessage,
    gravimetrics::FixedBody,
    types::{RunId, Seconds, Tick},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are added, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
    },
    RunResumed {
        run_id: RunId,
        tick:   Tick,
    },

    // ── Control events ─────────────────────────────
    ControlApplied {
        tick:    Tick,
        message: ControlMessage,
    },
    AccumulatorsReset {
        tick: Tick,
    },
    EarthTimeSynced {
        tick:        Tick,
        earth_total: Seconds,
    },
    StatusReported {
        tick:        Tick,
        earth_total: Seconds,
        ship_total:  Seconds,
    },
    EarthOffsetInjected {
        tick:   Tick,
        offset: Seconds,
    },

    // ── Physics events ─────────────────────────────
    TimeAccumulated {
        tick:        Tick,
        ship_delta:  Seconds,
        earth_delta: Seconds,
        total_rate:  f64,
    },
    TimeStopped {
        tick:   Tick,
        reason: StopReason,
    },
    ClockRewound {
        tick:    Tick,
        delta_t: Seconds,
    },
    HorizonReached {
        tick: Tick,
        body: FixedBody,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The host clock did not move between samples.
    ZeroDelta,
    /// A global `pause` is in effect.
    Paused,
}

impl SimEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }      => "run_initialized",
            Self::RunResumed { .. }          => "run_resumed",
            Self::ControlApplied { .. }      => "control_applied",
            Self::AccumulatorsReset { .. }   => "accumulators_reset",
            Self::EarthTimeSynced { .. }     => "earth_time_synced",
            Self::StatusReported { .. }      => "status_reported",
            Self::EarthOffsetInjected { .. } => "earth_offset_injected",
            Self::TimeAccumulated { .. }     => "time_accumulated",
            Self::TimeStopped { .. }         => "time_stopped",
            Self::ClockRewound { .. }        => "clock_rewound",
            Self::HorizonReached { .. }      => "horizon_reached",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub tick:       Tick,
    pub source:     String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
