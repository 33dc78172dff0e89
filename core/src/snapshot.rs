//! Snapshot serialization: accumulator state to/from JSON.
//!
//! A snapshot is taken every `snapshot_interval` ticks. It captures
//! everything needed to resume a run without replaying the log; the
//! observer baseline is re-captured from the host on resume.

use crate::{
    clock::AccumulatorState,
    host::ObserverSample,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimSnapshot {
    pub run_id:      RunId,
    pub tick:        Tick,
    pub state:       AccumulatorState,
    /// The sample the next tick would have measured from.
    pub last_sample: ObserverSample,
}
