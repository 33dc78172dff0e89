//! The simulation engine: drives the clock from a host and keeps the
//! run log.
//!
//! EXECUTION ORDER per tick (fixed, never reordered):
//!   1. Capture the host frame.
//!   2. Drain the control channel.
//!   3. Advance the clock (messages first, then physics).
//!   4. Persist the tick's events.
//!   5. Snapshot every `snapshot_interval` ticks.
//!   6. Publish the output to the host.
//!
//! RULES:
//!   - Nothing straddles a tick: every step above completes before
//!     control returns to the host scheduler.
//!   - The engine never schedules itself. Callers decide when to tick.

use crate::{
    clock::{AccumulatorState, SimulationClock, TickOutput},
    config::SimConfig,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    host::{ControlChannel, HostBridge, HostFrame, ObserverSample},
    snapshot::SimSnapshot,
    store::SimStore,
    types::{RunId, Seconds, Tick},
};

pub struct SimEngine {
    pub run_id: RunId,
    pub config: SimConfig,
    clock:      SimulationClock,
    store:      SimStore,
}

impl SimEngine {
    pub fn new(run_id: RunId, config: SimConfig, store: SimStore, origin: ObserverSample) -> Self {
        Self {
            clock: SimulationClock::new(&config, origin),
            config,
            store,
            run_id,
        }
    }

    /// Build an engine for a run already registered in the store and
    /// log its initialization at tick 0.
    pub fn build(
        run_id: RunId,
        config: SimConfig,
        store: SimStore,
        origin: ObserverSample,
    ) -> SimResult<Self> {
        if !store.run_exists(&run_id)? {
            return Err(SimError::RunNotInitialized);
        }
        let engine = SimEngine::new(run_id, config, store, origin);
        let init = SimEvent::RunInitialized { run_id: engine.run_id.clone() };
        engine.record(0, "engine", &init)?;
        Ok(engine)
    }

    /// In-memory store, test config, observer at the origin at t=0.
    pub fn build_test(run_id: RunId) -> SimResult<Self> {
        Self::build_test_with(run_id, SimConfig::default_test())
    }

    pub fn build_test_with(run_id: RunId, config: SimConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, "0.1.0-test", &serde_json::to_string(&config)?, "test")?;
        Self::build(run_id, config, store, ObserverSample::at_time(0.0))
    }

    /// Rebuild a run from its latest snapshot. `origin` is the host's
    /// current sample; the next tick measures from it.
    pub fn resume(
        run_id: RunId,
        config: SimConfig,
        store: SimStore,
        origin: ObserverSample,
    ) -> SimResult<Self> {
        let (tick, payload) = store
            .latest_snapshot(&run_id)?
            .ok_or_else(|| SimError::SnapshotNotFound { run_id: run_id.clone() })?;
        let snapshot: SimSnapshot = serde_json::from_str(&payload)?;

        // Ticks after the snapshot will be replayed; their old log goes.
        let dropped = store.truncate_events_after(&run_id, tick)?;
        if dropped > 0 {
            log::info!("tick={tick} engine: discarded {dropped} events logged after the snapshot");
        }

        let clock = SimulationClock::restore(&config, snapshot.state, origin);
        let engine = Self { run_id, config, clock, store };
        let resumed = SimEvent::RunResumed { run_id: engine.run_id.clone(), tick };
        engine.record(tick, "engine", &resumed)?;
        log::info!("tick={tick} engine: resumed run {}", engine.run_id);
        Ok(engine)
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn state(&self) -> &AccumulatorState {
        self.clock.state()
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.state().tick
    }

    /// Advance one tick from an explicit frame and raw control tokens.
    ///
    /// The clock advances before anything is written. The tick's events
    /// are then stored in one transaction, so on error the log holds
    /// none of them while the in-memory state has already moved on.
    pub fn tick(&mut self, frame: &HostFrame, tokens: &[String]) -> SimResult<TickOutput> {
        let output = self.clock.advance(frame, tokens);

        let entries = output
            .events
            .iter()
            .map(|event| self.log_entry(output.tick, "clock", event))
            .collect::<SimResult<Vec<_>>>()?;
        self.store.append_events(&entries)?;

        if output.tick.is_multiple_of(self.config.snapshot_interval) {
            self.take_snapshot()?;
        }

        Ok(output)
    }

    /// Pull one frame from the host, drain the channel, tick, publish.
    pub fn run_tick<H, C>(&mut self, host: &mut H, channel: &mut C) -> SimResult<TickOutput>
    where
        H: HostBridge,
        C: ControlChannel,
    {
        let frame = host.frame();
        let tokens = channel.drain();
        let output = self.tick(&frame, &tokens)?;
        host.publish(&output);
        Ok(output)
    }

    /// Run n ticks back to back. Returns the last output, if any.
    pub fn run_ticks<H, C>(
        &mut self,
        host: &mut H,
        channel: &mut C,
        n: u64,
    ) -> SimResult<Option<TickOutput>>
    where
        H: HostBridge,
        C: ControlChannel,
    {
        let mut last = None;
        for _ in 0..n {
            last = Some(self.run_tick(host, channel)?);
        }
        Ok(last)
    }

    pub fn inject_earth_offset(&mut self, offset: Seconds) -> SimResult<()> {
        let event = self.clock.inject_earth_offset(offset);
        self.record(self.current_tick(), "engine", &event)
    }

    /// Query events for a specific tick from the store.
    pub fn store_events_for_tick(&self, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(&self.run_id, tick)
    }

    pub fn store_event_count(&self, event_type: &str) -> SimResult<i64> {
        self.store.event_count(&self.run_id, event_type)
    }

    pub fn store_latest_snapshot(&self) -> SimResult<Option<SimSnapshot>> {
        self.store
            .latest_snapshot(&self.run_id)?
            .map(|(_, payload)| serde_json::from_str(&payload).map_err(SimError::from))
            .transpose()
    }

    /// Hand the store back, e.g. to resume the run in a new engine.
    pub fn into_store(self) -> SimStore {
        self.store
    }

    pub fn take_snapshot(&self) -> SimResult<()> {
        let tick = self.current_tick();
        let snapshot = SimSnapshot {
            run_id:      self.run_id.clone(),
            tick,
            state:       self.clock.state().clone(),
            last_sample: self.clock.last_sample(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }

    fn record(&self, tick: Tick, source: &str, event: &SimEvent) -> SimResult<()> {
        let entry = self.log_entry(tick, source, event)?;
        self.store.append_event(&entry)
    }

    fn log_entry(&self, tick: Tick, source: &str, event: &SimEvent) -> SimResult<EventLogEntry> {
        Ok(EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            tick,
            source:     source.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}
