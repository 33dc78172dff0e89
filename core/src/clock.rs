//! Simulation clock: owns ship time, Earth time, and the pause flags.
//!
//! EXECUTION ORDER within one tick (fixed, never reordered):
//!   1. Drain control messages, in arrival order.
//!   2. Re-baseline the last observer sample.
//!   3. Short-circuit stopped ticks (paused, zero or negative delta).
//!   4. Kinematics, then gravimetrics.
//!   5. Accumulate the enabled tracks and render their display strings.
//!
//! RULES:
//!   - `advance` is infallible. Anomalies surface as status strings
//!     and events, never as errors.
//!   - Nothing here knows how the host schedules ticks.

use crate::{
    command::ControlMessage,
    config::SimConfig,
    event::{SimEvent, StopReason},
    format::{format_duration, format_light_fraction, format_rate},
    gravimetrics::GravityMode,
    host::{HostFrame, ObserverSample, TargetBody},
    kinematics::{displacement, velocity_and_dilation, TickDelta},
    types::{Seconds, Tick},
    units::DistanceUnit,
};
use serde::{Deserialize, Serialize};

/// Status written whenever a tick accumulates nothing.
pub const TIME_STOPPED: &str = "Time stopped";

/// Status written whenever the gravity factor is undefined.
pub const INSIDE_HORIZON: &str = "Inside black hole!";

/// Cumulative time, the only state that survives between ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AccumulatorState {
    pub tick:               Tick,
    pub ship_time:          Seconds,
    pub earth_time:         Seconds,
    pub earth_time_offset:  Seconds,
    /// Earth total captured by the last `syncTime`. Survives resets.
    pub synced_earth_time:  Option<Seconds>,
    pub earth_paused:       bool,
    pub ship_paused:        bool,
    pub paused:             bool,
    /// Display-only replacement for the computed rate string.
    pub override_rate_text: Option<String>,
}

impl AccumulatorState {
    /// Earth time as displayed, offset included.
    pub fn earth_total(&self) -> Seconds {
        self.earth_time + self.earth_time_offset
    }

    /// Zero the time fields. Flags, overrides and the synced total persist.
    pub fn reset(&mut self) {
        self.ship_time = 0.0;
        self.earth_time = 0.0;
        self.earth_time_offset = 0.0;
    }

    pub fn sync(&mut self) {
        self.synced_earth_time = Some(self.earth_total());
    }

    fn apply(&mut self, message: ControlMessage) -> Vec<SimEvent> {
        let tick = self.tick;
        let mut events = vec![SimEvent::ControlApplied { tick, message }];

        match message {
            ControlMessage::DisableEarth => self.earth_paused = true,
            ControlMessage::EnableEarth  => self.earth_paused = false,
            ControlMessage::DisableShip  => self.ship_paused = true,
            ControlMessage::EnableShip   => self.ship_paused = false,
            ControlMessage::Pause        => self.paused = true,
            ControlMessage::Unpause      => self.paused = false,
            ControlMessage::ResetTime => {
                self.reset();
                log::info!("tick={tick} clock: accumulators reset");
                events.push(SimEvent::AccumulatorsReset { tick });
            }
            ControlMessage::SyncTime => {
                self.sync();
                let earth_total = self.earth_total();
                log::info!("tick={tick} clock: synced earth total {earth_total:.3}s");
                events.push(SimEvent::EarthTimeSynced { tick, earth_total });
            }
            ControlMessage::Status => {
                let earth_total = self.earth_total();
                log::info!(
                    "tick={tick} clock: status earth={earth_total:.3}s ({}) ship={:.3}s",
                    format_duration(earth_total),
                    self.ship_time
                );
                events.push(SimEvent::StatusReported {
                    tick,
                    earth_total,
                    ship_total: self.ship_time,
                });
            }
        }
        events
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    Running,
    TimeStopped,
    InsideHorizon,
}

/// Display strings and raw values produced by one tick.
/// `None` means "leave the host's current value alone".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickOutput {
    pub tick:              Tick,
    pub status:            TickStatus,
    pub ship_time:         Option<String>,
    pub earth_time:        Option<String>,
    pub time_rate:         Option<String>,
    pub light_fraction:    Option<String>,
    pub synced_earth_time: Option<String>,
    /// Special-relativistic rate alone.
    pub velocity_rate:     Option<f64>,
    pub gravity_factor:    Option<f64>,
    /// Combined Earth/ship rate.
    pub total_rate:        Option<f64>,
    pub events:            Vec<SimEvent>,
}

impl TickOutput {
    fn blank(tick: Tick, status: TickStatus, events: Vec<SimEvent>) -> Self {
        Self {
            tick,
            status,
            ship_time: None,
            earth_time: None,
            time_rate: None,
            light_fraction: None,
            synced_earth_time: None,
            velocity_rate: None,
            gravity_factor: None,
            total_rate: None,
            events,
        }
    }

    fn stopped(tick: Tick, events: Vec<SimEvent>) -> Self {
        let mut output = Self::blank(tick, TickStatus::TimeStopped, events);
        output.time_rate = Some(TIME_STOPPED.to_string());
        output
    }
}

pub struct SimulationClock {
    state:         AccumulatorState,
    last_sample:   ObserverSample,
    gravity:       GravityMode,
    distance_unit: DistanceUnit,
}

impl SimulationClock {
    /// Start a fresh clock. `origin` is the host's first sample.
    pub fn new(config: &SimConfig, origin: ObserverSample) -> Self {
        let state = AccumulatorState {
            earth_time_offset: config.earth_time_offset,
            ..AccumulatorState::default()
        };
        Self::restore(config, state, origin)
    }

    /// Continue from a saved accumulator. `origin` becomes the baseline
    /// for the next tick's delta.
    pub fn restore(config: &SimConfig, state: AccumulatorState, origin: ObserverSample) -> Self {
        Self {
            state,
            last_sample: origin,
            gravity: config.gravity.clone(),
            distance_unit: config.distance_unit,
        }
    }

    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    pub fn last_sample(&self) -> ObserverSample {
        self.last_sample
    }

    pub fn inject_earth_offset(&mut self, offset: Seconds) -> SimEvent {
        self.state.earth_time_offset = offset;
        log::info!("tick={} clock: earth offset set to {offset:.3}s", self.state.tick);
        SimEvent::EarthOffsetInjected { tick: self.state.tick, offset }
    }

    /// Advance one tick from a host frame and the raw control tokens
    /// drained this tick. Unknown tokens are ignored.
    pub fn advance(&mut self, frame: &HostFrame, tokens: &[String]) -> TickOutput {
        let messages: Vec<ControlMessage> = tokens
            .iter()
            .filter_map(|token| {
                let parsed = ControlMessage::parse(token);
                if parsed.is_none() {
                    log::trace!("clock: ignoring control token {token:?}");
                }
                parsed
            })
            .collect();

        let delta = TickDelta {
            distance: displacement(
                self.last_sample.position,
                frame.sample.position,
                self.distance_unit.meters_per_unit(),
            ),
            delta_t: frame.sample.wall_time - self.last_sample.wall_time,
        };
        self.last_sample = frame.sample;
        self.state.override_rate_text = frame.override_rate_text.clone();

        self.advance_delta(delta, frame.target.as_ref(), &messages)
    }

    /// Advance one tick from an already-measured delta.
    pub fn advance_delta(
        &mut self,
        delta: TickDelta,
        target: Option<&TargetBody>,
        messages: &[ControlMessage],
    ) -> TickOutput {
        self.state.tick += 1;
        let tick = self.state.tick;

        let mut events = Vec::new();
        for message in messages {
            events.extend(self.state.apply(*message));
        }

        if self.state.paused {
            events.push(SimEvent::TimeStopped { tick, reason: StopReason::Paused });
            return TickOutput::stopped(tick, events);
        }
        if delta.delta_t == 0.0 || delta.delta_t.is_nan() {
            events.push(SimEvent::TimeStopped { tick, reason: StopReason::ZeroDelta });
            return TickOutput::stopped(tick, events);
        }
        if delta.delta_t < 0.0 {
            log::warn!("tick={tick} clock: host clock ran backwards by {:.3}s", -delta.delta_t);
            events.push(SimEvent::ClockRewound { tick, delta_t: delta.delta_t });
            return TickOutput::stopped(tick, events);
        }

        self.accumulate(delta, target, events)
    }

    fn accumulate(
        &mut self,
        delta: TickDelta,
        target: Option<&TargetBody>,
        mut events: Vec<SimEvent>,
    ) -> TickOutput {
        let tick = self.state.tick;
        let dilation = velocity_and_dilation(delta.distance, delta.delta_t);
        let body = self.gravity.active_body(target);
        let gravity = body.map_or(1.0, |b| b.factor(self.distance_unit));

        let mut output = TickOutput::blank(tick, TickStatus::Running, Vec::new());
        output.velocity_rate = Some(dilation.t_earth_rate);
        output.gravity_factor = Some(gravity);
        output.synced_earth_time = self.state.synced_earth_time.map(format_duration);

        if let Some(body) = body.filter(|_| gravity.is_nan()) {
            output.status = TickStatus::InsideHorizon;
            output.time_rate = Some(INSIDE_HORIZON.to_string());
            events.push(SimEvent::HorizonReached { tick, body });
            if !self.state.ship_paused {
                self.state.ship_time += delta.delta_t;
                output.ship_time = Some(format_duration(self.state.ship_time));
            }
            output.events = events;
            return output;
        }

        let total_rate = dilation.t_earth_rate * gravity;
        output.total_rate = Some(total_rate);

        let mut earth_delta = 0.0;
        if !self.state.earth_paused {
            earth_delta = delta.delta_t * total_rate;
            self.state.earth_time += earth_delta;
            output.light_fraction = Some(format_light_fraction(dilation.light_percent()));
            output.time_rate = Some(
                self.state
                    .override_rate_text
                    .clone()
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| format_rate(total_rate)),
            );
            output.earth_time = Some(format_duration(self.state.earth_total()));
        }

        let mut ship_delta = 0.0;
        if !self.state.ship_paused {
            ship_delta = delta.delta_t;
            self.state.ship_time += ship_delta;
            output.ship_time = Some(format_duration(self.state.ship_time));
        }

        log::debug!(
            "tick={tick} clock: v={:.1}m/s sr={:.6} gr={:.6} ship+={ship_delta:.3}s earth+={earth_delta:.3}s",
            dilation.velocity,
            dilation.t_earth_rate,
            gravity
        );

        events.push(SimEvent::TimeAccumulated { tick, ship_delta, earth_delta, total_rate });
        output.events = events;
        output
    }
}
