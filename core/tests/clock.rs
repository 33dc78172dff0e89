//! SimulationClock state machine: accumulation, control messages,
//! stopped ticks and the event horizon.

use dilation_core::{
    clock::{SimulationClock, TickStatus, INSIDE_HORIZON, TIME_STOPPED},
    command::ControlMessage,
    config::{SimConfig, M87_BODY},
    event::{SimEvent, StopReason},
    gravimetrics::GravityMode,
    host::{HostFrame, ObserverSample, TargetBody},
    kinematics::TickDelta,
};
use glam::DVec3;
use std::f64::consts::SQRT_2;

fn clock() -> SimulationClock {
    let _ = env_logger::builder().is_test(true).try_init();
    SimulationClock::new(&SimConfig::default_test(), ObserverSample::at_time(0.0))
}

fn frame(x: f64, t: f64) -> HostFrame {
    HostFrame::new(ObserverSample::new(DVec3::new(x, 0.0, 0.0), t))
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn black_hole(radius: f64) -> TargetBody {
    TargetBody {
        name:       "Gargantua".into(),
        class:      "blackHoleClass".into(),
        mass_solar: 1.0e8,
        radius,
    }
}

/// Stationary for 10 s, then one light-second per ship second.
#[test]
fn rest_then_relativistic_tick() {
    let mut clock = clock();

    let first = clock.advance(&frame(0.0, 10.0), &[]);
    assert_eq!(first.status, TickStatus::Running);
    assert_eq!(first.total_rate, Some(1.0));
    assert_eq!(first.time_rate.as_deref(), Some("1.00x"));
    assert_eq!(first.light_fraction.as_deref(), Some("0.00000%"));
    assert_eq!(first.ship_time.as_deref(), Some("10 seconds"));
    assert_eq!(first.earth_time.as_deref(), Some("10 seconds"));

    let second = clock.advance(&frame(2.998e9, 20.0), &[]);
    let rate = second.total_rate.unwrap();
    assert!((rate - SQRT_2).abs() < 1e-3, "rate {rate}");
    assert_eq!(second.time_rate.as_deref(), Some("1.41x"));

    let state = clock.state();
    assert_eq!(state.ship_time, 20.0);
    assert!((state.earth_time - (10.0 + 10.0 * rate)).abs() < 1e-9);
}

#[test]
fn zero_delta_stops_time() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 5.0), &[]);
    let before = clock.state().clone();

    let out = clock.advance(&frame(1.0e6, 5.0), &[]);
    assert_eq!(out.status, TickStatus::TimeStopped);
    assert_eq!(out.time_rate.as_deref(), Some(TIME_STOPPED));
    assert_eq!(out.ship_time, None);
    assert_eq!(out.earth_time, None);
    assert!(out.events.contains(&SimEvent::TimeStopped {
        tick:   out.tick,
        reason: StopReason::ZeroDelta,
    }));

    assert_eq!(clock.state().ship_time, before.ship_time);
    assert_eq!(clock.state().earth_time, before.earth_time);
    assert_eq!(clock.state().tick, before.tick + 1);
}

/// The jump made while time was stopped is not charged to the next tick.
#[test]
fn stopped_ticks_rebaseline_the_sample() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 0.0), &[]);
    clock.advance(&frame(1.0e12, 0.0), &[]);

    let out = clock.advance(&frame(1.0e12, 1.0), &[]);
    assert_eq!(out.total_rate, Some(1.0));
    assert_eq!(clock.state().earth_time, 1.0);
}

#[test]
fn reset_zeroes_time_but_keeps_flags() {
    let mut clock = clock();
    clock.advance(&frame(1.0e9, 100.0), &[]);
    clock.advance(&frame(1.0e9, 110.0), &tokens(&["disableShip", "pause"]));
    clock.inject_earth_offset(3600.0);
    assert!(clock.state().earth_time > 100.0);

    clock.advance(&frame(1.0e9, 110.0), &tokens(&["resetTime"]));

    let state = clock.state();
    assert_eq!(state.ship_time, 0.0);
    assert_eq!(state.earth_time, 0.0);
    assert_eq!(state.earth_time_offset, 0.0);
    assert!(state.ship_paused);
    assert!(state.paused);
}

#[test]
fn messages_apply_before_physics_in_the_same_tick() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 50.0), &[]);

    let out = clock.advance(&frame(0.0, 60.0), &tokens(&["reset"]));
    assert_eq!(clock.state().ship_time, 10.0);
    assert_eq!(clock.state().earth_time, 10.0);
    assert!(matches!(out.events[0], SimEvent::ControlApplied { message: ControlMessage::ResetTime, .. }));
    assert!(matches!(out.events.last(), Some(SimEvent::TimeAccumulated { .. })));
}

#[test]
fn global_pause_reports_time_stopped() {
    let mut clock = clock();
    let paused = clock.advance(&frame(0.0, 10.0), &tokens(&["pause"]));
    assert_eq!(paused.time_rate.as_deref(), Some(TIME_STOPPED));
    assert!(paused.events.contains(&SimEvent::TimeStopped {
        tick:   paused.tick,
        reason: StopReason::Paused,
    }));
    clock.advance(&frame(0.0, 20.0), &[]);
    assert_eq!(clock.state().ship_time, 0.0);

    clock.advance(&frame(0.0, 25.0), &tokens(&["unpause"]));
    assert_eq!(clock.state().ship_time, 5.0);
    assert_eq!(clock.state().earth_time, 5.0);
}

#[test]
fn disabled_earth_track_freezes_earth_only() {
    let mut clock = clock();
    let out = clock.advance(&frame(2.998e9, 10.0), &tokens(&["disableEarth"]));

    assert_eq!(out.earth_time, None);
    assert_eq!(out.time_rate, None);
    assert_eq!(out.light_fraction, None);
    assert_eq!(out.ship_time.as_deref(), Some("10 seconds"));
    assert!(out.total_rate.is_some());
    assert_eq!(clock.state().earth_time, 0.0);

    clock.advance(&frame(2.998e9, 20.0), &tokens(&["enableEarth", "pauseShip"]));
    assert_eq!(clock.state().earth_time, 10.0);
    assert_eq!(clock.state().ship_time, 10.0);

    clock.advance(&frame(2.998e9, 30.0), &tokens(&["resumeShip"]));
    assert_eq!(clock.state().ship_time, 20.0);
}

#[test]
fn inside_horizon_freezes_earth_but_not_ship() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 10.0), &[]);

    let out = clock.advance(&frame(0.0, 20.0).with_target(black_hole(1.0)), &[]);
    assert_eq!(out.status, TickStatus::InsideHorizon);
    assert_eq!(out.time_rate.as_deref(), Some(INSIDE_HORIZON));
    assert!(out.gravity_factor.unwrap().is_nan());
    assert_eq!(out.velocity_rate, Some(1.0));
    assert_eq!(out.total_rate, None);
    assert_eq!(out.earth_time, None);
    assert_eq!(out.ship_time.as_deref(), Some("20 seconds"));
    assert!(out.events.iter().any(|e| matches!(e, SimEvent::HorizonReached { .. })));

    assert_eq!(clock.state().earth_time, 10.0);
    assert_eq!(clock.state().ship_time, 20.0);

    // Leaving the horizon resumes normal accounting.
    let out = clock.advance(&frame(0.0, 30.0), &[]);
    assert_eq!(out.status, TickStatus::Running);
    assert_eq!(clock.state().earth_time, 20.0);
}

#[test]
fn gravitating_target_speeds_up_earth() {
    let mut clock = clock();
    let target = black_hole(1.0e13);
    let out = clock.advance(&frame(0.0, 10.0).with_target(target), &[]);

    let g = out.gravity_factor.unwrap();
    assert!(g > 1.0);
    assert_eq!(out.total_rate, Some(g));
    assert!((clock.state().earth_time - 10.0 * g).abs() < 1e-9);
}

#[test]
fn fixed_body_mode_ignores_targets() {
    let config = SimConfig {
        gravity: GravityMode::FixedBody { body: M87_BODY },
        ..SimConfig::default_test()
    };
    let mut clock = SimulationClock::new(&config, ObserverSample::at_time(0.0));

    let out = clock.advance(&frame(0.0, 1.0).with_target(black_hole(1.0)), &[]);
    let rate = out.total_rate.unwrap();
    assert!(rate > 1.9 && rate < 2.1, "rate {rate}");
    assert_eq!(out.time_rate.as_deref(), Some(format!("{rate:.2}x").as_str()));
}

#[test]
fn override_text_replaces_rate_display_only() {
    let mut clock = clock();
    let mut f = frame(2.998e9, 10.0);
    f.override_rate_text = Some("Warp factor 9".into());

    let out = clock.advance(&f, &[]);
    assert_eq!(out.time_rate.as_deref(), Some("Warp factor 9"));
    assert!((out.total_rate.unwrap() - SQRT_2).abs() < 1e-3);
    assert!(clock.state().earth_time > 14.0);

    let mut f = frame(2.998e9, 20.0);
    f.override_rate_text = Some(String::new());
    let out = clock.advance(&f, &[]);
    assert_eq!(out.time_rate.as_deref(), Some("1.00x"));
}

#[test]
fn host_clock_rewind_is_a_discontinuity() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 10.0), &[]);

    let out = clock.advance(&frame(0.0, 5.0), &[]);
    assert_eq!(out.status, TickStatus::TimeStopped);
    assert!(out.events.contains(&SimEvent::ClockRewound { tick: out.tick, delta_t: -5.0 }));
    assert_eq!(clock.state().ship_time, 10.0);

    clock.advance(&frame(0.0, 15.0), &[]);
    assert_eq!(clock.state().ship_time, 20.0);
}

#[test]
fn sync_total_survives_reset() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 10.0), &[]);
    clock.inject_earth_offset(50.0);

    let out = clock.advance(&frame(0.0, 10.0), &tokens(&["syncTime"]));
    assert!(out.events.contains(&SimEvent::EarthTimeSynced { tick: out.tick, earth_total: 60.0 }));

    clock.advance(&frame(0.0, 10.0), &tokens(&["resetTime"]));
    assert_eq!(clock.state().synced_earth_time, Some(60.0));

    let out = clock.advance(&frame(0.0, 11.0), &[]);
    assert_eq!(out.synced_earth_time.as_deref(), Some("60 seconds"));
    assert_eq!(out.earth_time.as_deref(), Some("1 seconds"));
}

#[test]
fn offset_shows_in_earth_display() {
    let mut clock = clock();
    clock.inject_earth_offset(7200.0);
    let out = clock.advance(&frame(0.0, 60.0), &[]);
    assert_eq!(out.earth_time.as_deref(), Some("2 hours|1 minutes"));
    assert_eq!(clock.state().earth_time, 60.0);
}

#[test]
fn status_reports_without_changing_state() {
    let mut clock = clock();
    clock.advance(&frame(0.0, 10.0), &[]);
    let before = clock.state().clone();

    let out = clock.advance(&frame(0.0, 10.0), &tokens(&["status"]));
    assert!(out.events.contains(&SimEvent::StatusReported {
        tick:        out.tick,
        earth_total: 10.0,
        ship_total:  10.0,
    }));
    assert_eq!(clock.state().earth_time, before.earth_time);
    assert_eq!(clock.state().paused, before.paused);
}

#[test]
fn unknown_tokens_are_ignored() {
    let mut clock = clock();
    let out = clock.advance(&frame(0.0, 10.0), &tokens(&["engage", "", "  pause  ", "PAUSE"]));

    let applied: Vec<_> = out
        .events
        .iter()
        .filter_map(|e| match e {
            SimEvent::ControlApplied { message, .. } => Some(*message),
            _ => None,
        })
        .collect();
    assert_eq!(applied, vec![ControlMessage::Pause]);
    assert!(clock.state().paused);
}

#[test]
fn advance_delta_accepts_measured_deltas() {
    let mut clock = clock();
    let out = clock.advance_delta(TickDelta { distance: 0.0, delta_t: 0.0 }, None, &[]);
    assert_eq!(out.status, TickStatus::TimeStopped);

    let out = clock.advance_delta(
        TickDelta { distance: 2.998e9, delta_t: 10.0 },
        None,
        &[ControlMessage::SyncTime],
    );
    assert!((out.total_rate.unwrap() - SQRT_2).abs() < 1e-3);
    assert_eq!(clock.state().synced_earth_time, Some(0.0));
}
