//! sim-runner: headless runner for the ship/Earth time engine.
//!
//! Usage:
//!   sim-runner --flight data/flights/m87_approach.json --db run.db
//!   sim-runner --flight data/flights/m87_approach.json --db run.db --ticks 1000
//!   sim-runner --flight data/flights/m87_approach.json --db run.db --resume run-<uuid>
//!   sim-runner --ipc-mode

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use dilation_core::{
    clock::{TickOutput, TickStatus},
    config::SimConfig,
    engine::SimEngine,
    format::format_duration,
    host::{ControlChannel, HostBridge, HostFrame, MessageQueue, ObserverSample, TargetBody},
    snapshot::SimSnapshot,
    store::SimStore,
    units::C,
};
use glam::DVec3;
use std::env;
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(serde::Deserialize)]
struct FlightPlan {
    name: String,
    #[serde(default)]
    start_position: DVec3,
    legs: Vec<FlightLeg>,
}

#[derive(serde::Deserialize)]
struct FlightLeg {
    ticks: u64,
    /// Host seconds per tick.
    dt: f64,
    /// Displacement per host second, in units of c.
    speed_c: f64,
    #[serde(default = "default_direction")]
    direction: DVec3,
    #[serde(default)]
    target: Option<TargetBody>,
    /// Tokens issued on the leg's first tick.
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    override_rate_text: Option<String>,
}

fn default_direction() -> DVec3 {
    DVec3::X
}

/// A host that flies one leg of a flight plan at constant speed.
struct ScriptedHost<'a> {
    leg: &'a FlightLeg,
    sample: ObserverSample,
    meters_per_unit: f64,
    last: Option<TickOutput>,
    horizon_ticks: u64,
}

impl<'a> ScriptedHost<'a> {
    fn new(leg: &'a FlightLeg, sample: ObserverSample, meters_per_unit: f64) -> Self {
        Self { leg, sample, meters_per_unit, last: None, horizon_ticks: 0 }
    }
}

impl HostBridge for ScriptedHost<'_> {
    fn frame(&mut self) -> HostFrame {
        let step_m = self.leg.speed_c * C * self.leg.dt;
        let direction = self.leg.direction.normalize_or_zero();
        self.sample = ObserverSample::new(
            self.sample.position + direction * (step_m / self.meters_per_unit),
            self.sample.wall_time + self.leg.dt,
        );
        HostFrame {
            sample: self.sample,
            target: self.leg.target.clone(),
            override_rate_text: self.leg.override_rate_text.clone(),
        }
    }

    fn publish(&mut self, output: &TickOutput) {
        if output.status == TickStatus::InsideHorizon {
            self.horizon_ticks += 1;
        }
        log::trace!("tick={} publish: {:?}", output.tick, output.time_rate);
        self.last = Some(output.clone());
    }
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Frame { frame: HostFrame },
    Message { token: String },
    Offset { seconds: f64 },
    GetState,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let realtime = args.iter().any(|a| a == "--realtime");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let resume = string_arg(&args, "--resume");
    let default_flight = format!("{data_dir}/flights/m87_approach.json");
    let flight_path = string_arg(&args, "--flight").unwrap_or(&default_flight);
    let start_date = string_arg(&args, "--start-date")
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--start-date must be YYYY-MM-DD")?
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2021, 11, 10).unwrap_or_default());

    let config = SimConfig::load(data_dir)?;
    let store = SimStore::open(db)?;
    store.migrate()?;

    if ipc_mode {
        let run_id = new_run_id();
        store.insert_run(&run_id, env!("CARGO_PKG_VERSION"), &serde_json::to_string(&config)?, &started_at())?;
        return run_ipc_loop(run_id, config, store);
    }

    let plan: FlightPlan = {
        let content = std::fs::read_to_string(flight_path)
            .with_context(|| format!("Cannot read {flight_path}"))?;
        serde_json::from_str(&content).with_context(|| format!("Cannot parse {flight_path}"))?
    };
    let max_ticks = parse_arg(&args, "--ticks", u64::MAX);

    // A resumed run picks up where its snapshot left off: the observer
    // restarts from the saved sample and finished legs are skipped.
    let (mut engine, completed) = match resume {
        Some(run_id) => {
            let snapshot: SimSnapshot = store
                .latest_snapshot(run_id)?
                .map(|(_, payload)| serde_json::from_str(&payload))
                .transpose()?
                .with_context(|| format!("No snapshot stored for run {run_id}"))?;
            let origin = snapshot.last_sample;
            (SimEngine::resume(run_id.to_string(), config, store, origin)?, snapshot.tick)
        }
        None => {
            let run_id = new_run_id();
            store.insert_run(&run_id, env!("CARGO_PKG_VERSION"), &serde_json::to_string(&config)?, &started_at())?;
            let origin = ObserverSample::new(plan.start_position, 0.0);
            (SimEngine::build(run_id, config, store, origin)?, 0)
        }
    };
    let runs = schedule(&plan.legs, completed, max_ticks);
    let ticks: u64 = runs.iter().map(|r| r.ticks).sum();

    println!("Ship/Earth time dilation: sim-runner");
    println!("  flight:     {} ({flight_path})", plan.name);
    println!("  resumed at: {completed}");
    println!("  ticks:      {ticks}");
    println!("  db:         {db}");
    println!("  start date: {start_date}");
    println!();

    let mut queue = MessageQueue::new();
    let mut sample = engine.clock().last_sample();
    let mut horizon_ticks = 0;
    let meters_per_unit = engine.config.distance_unit.meters_per_unit();
    let interval = Duration::from_secs_f64(engine.config.tick_interval_secs);

    for run in &runs {
        let leg = &plan.legs[run.leg];
        if run.issue_messages {
            for token in &leg.messages {
                queue.push(token.as_str());
            }
        }
        let mut host = ScriptedHost::new(leg, sample, meters_per_unit);
        if realtime {
            for _ in 0..run.ticks {
                engine.run_tick(&mut host, &mut queue)?;
                std::thread::sleep(interval);
            }
        } else {
            engine.run_ticks(&mut host, &mut queue, run.ticks)?;
        }
        sample = host.sample;
        horizon_ticks += host.horizon_ticks;
        if let Some(last) = &host.last {
            log::info!(
                "leg done at tick {}: ship={:?} earth={:?} rate={:?}",
                last.tick, last.ship_time, last.earth_time, last.time_rate
            );
        }
    }

    engine.take_snapshot()?;
    print_summary(&engine, start_date, horizon_ticks);
    Ok(())
}

/// One stretch of a flight leg still to fly.
#[derive(Debug, PartialEq)]
struct LegRun {
    leg: usize,
    ticks: u64,
    /// False when the leg was already entered before a resume.
    issue_messages: bool,
}

/// The legs left after `completed` ticks, capped at `max_ticks` in total.
fn schedule(legs: &[FlightLeg], completed: u64, max_ticks: u64) -> Vec<LegRun> {
    let mut runs = Vec::new();
    let mut start = 0u64;
    let mut budget = max_ticks;

    for (index, leg) in legs.iter().enumerate() {
        if budget == 0 {
            break;
        }
        let end = start + leg.ticks;
        if start >= completed || end > completed {
            let skipped = completed.saturating_sub(start);
            let ticks = (leg.ticks - skipped).min(budget);
            budget -= ticks;
            runs.push(LegRun { leg: index, ticks, issue_messages: skipped == 0 });
        }
        start = end;
    }
    runs
}

fn run_ipc_loop(run_id: String, config: SimConfig, store: SimStore) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut queue = MessageQueue::new();
    let mut store = Some(store);
    let mut engine: Option<SimEngine> = None;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Frame { frame } => match engine.as_mut() {
                Some(engine) => {
                    let output = engine.tick(&frame, &queue.drain())?;
                    serde_json::to_value(&output)?
                }
                None => {
                    // The first frame only establishes the baseline sample.
                    let Some(store) = store.take() else { break };
                    let primed = SimEngine::build(run_id.clone(), config.clone(), store, frame.sample)?;
                    let state = serde_json::to_value(primed.state())?;
                    engine = Some(primed);
                    state
                }
            },
            IpcCommand::Message { token } => {
                queue.push(token);
                serde_json::json!({ "queued": queue.len() })
            }
            IpcCommand::Offset { seconds } => match engine.as_mut() {
                Some(engine) => {
                    engine.inject_earth_offset(seconds)?;
                    serde_json::to_value(engine.state())?
                }
                None => serde_json::json!({ "error": "no frame received yet" }),
            },
            IpcCommand::GetState => match engine.as_ref() {
                Some(engine) => serde_json::to_value(engine.state())?,
                None => serde_json::json!({ "error": "no frame received yet" }),
            },
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(engine: &SimEngine, start_date: NaiveDate, horizon_ticks: u64) {
    let state = engine.state();
    let earth_total = state.earth_total();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", engine.run_id);
    println!("  final tick:     {}", state.tick);
    println!("  ship time:      {} ({:.3}s)", format_duration(state.ship_time), state.ship_time);
    println!("  earth time:     {} ({:.3}s)", format_duration(earth_total), earth_total);
    if let Some(synced) = state.synced_earth_time {
        println!("  synced earth:   {}", format_duration(synced));
    }
    println!("  horizon ticks:  {horizon_ticks}");
    println!("  earth date:     {}", earth_date(start_date, earth_total));
    println!("  ship date:      {}", earth_date(start_date, state.ship_time));
}

/// Calendar date reached after `seconds` of elapsed time.
fn earth_date(start: NaiveDate, seconds: f64) -> String {
    let start: NaiveDateTime = start.and_hms_opt(0, 0, 0).unwrap_or_default();
    chrono::Duration::try_seconds(seconds as i64)
        .and_then(|elapsed| start.checked_add_signed(elapsed))
        .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "beyond the calendar".to_string())
}

fn new_run_id() -> String {
    format!("run-{}", uuid::Uuid::new_v4())
}

fn started_at() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
