//! Host seams: what the embedding environment supplies each tick and
//! what it receives back.
//!
//! RULE: The clock never reaches into the host. Everything it needs
//! arrives in a `HostFrame`, and everything it produces leaves in a
//! `TickOutput`.

use crate::{clock::TickOutput, types::Seconds};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Observer position and host clock reading, captured once per tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObserverSample {
    /// Position in host distance units.
    pub position:  DVec3,
    pub wall_time: Seconds,
}

impl ObserverSample {
    pub fn new(position: DVec3, wall_time: Seconds) -> Self {
        Self { position, wall_time }
    }

    /// A sample at the origin.
    pub fn at_time(wall_time: Seconds) -> Self {
        Self::new(DVec3::ZERO, wall_time)
    }
}

/// The host's currently targeted object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetBody {
    pub name:       String,
    pub class:      String,
    /// Mass in solar masses.
    pub mass_solar: f64,
    /// Radius (or orbital distance) in host distance units.
    pub radius:     f64,
}

/// Everything the host supplies for one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostFrame {
    pub sample: ObserverSample,
    #[serde(default)]
    pub target: Option<TargetBody>,
    #[serde(default)]
    pub override_rate_text: Option<String>,
}

impl HostFrame {
    pub fn new(sample: ObserverSample) -> Self {
        Self { sample, target: None, override_rate_text: None }
    }

    pub fn with_target(mut self, target: TargetBody) -> Self {
        self.target = Some(target);
        self
    }
}

/// The host environment: position/clock source and display sink.
pub trait HostBridge {
    /// Capture this tick's inputs.
    fn frame(&mut self) -> HostFrame;

    /// Display this tick's outputs.
    fn publish(&mut self, output: &TickOutput);
}

/// The host's inbound control-message queue.
pub trait ControlChannel {
    /// Take every pending token, in arrival order.
    fn drain(&mut self) -> Vec<String>;
}

/// In-memory FIFO control channel.
#[derive(Debug, Default, Clone)]
pub struct MessageQueue {
    pending: VecDeque<String>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.pending.push_back(token.into());
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl ControlChannel for MessageQueue {
    fn drain(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }
}
