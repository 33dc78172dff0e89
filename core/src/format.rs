//! Human-readable rendering of rates, durations and light-speed fractions.
//!
//! Tiers are chosen by the coarsest unit whose value strictly exceeds 1.
//! Integer rounding is half-up, so `2.5` renders as `3`.

use crate::types::Seconds;

/// Rendered in place of any rate or percentage that is not a number.
pub const NEUTRAL_RATE: &str = "1x";

/// Shown instead of a percentage once the gap to c drops below this.
pub const LIGHT_SPEED_EPSILON: f64 = 1e-5;

const SECONDS_PER_MINUTE: f64 = 60.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_YEAR: f64 = 365.0;

pub fn format_rate(rate: f64) -> String {
    if rate.is_nan() {
        return NEUTRAL_RATE.to_string();
    }

    let thousands = rate / 1000.0;
    let millions = thousands / 1000.0;
    let billions = millions / 1000.0;
    let trillions = billions / 1000.0;

    if trillions > 1.0 {
        format!("{trillions:.2} trillion times")
    } else if billions > 1.0 {
        format!("{billions:.2} billion times")
    } else if millions > 1.0 {
        format!("{millions:.2} million times")
    } else if thousands > 1.0 {
        format!("{thousands:.2} thousand times")
    } else {
        format!("{rate:.2}x")
    }
}

/// Render a duration. Non-finite input renders as zero seconds.
pub fn format_duration(seconds: Seconds) -> String {
    if !seconds.is_finite() {
        return "0 seconds".to_string();
    }

    let minutes = seconds / SECONDS_PER_MINUTE;
    let hours = minutes / MINUTES_PER_HOUR;
    let days = hours / HOURS_PER_DAY;
    let years = days / DAYS_PER_YEAR;
    let centuries = years / 100.0;
    let millennia = years / 1000.0;
    let million = millennia / 1000.0;
    let billion = million / 1000.0;
    let trillion = billion / 1000.0;

    if trillion > 1.0 {
        format!("{trillion:.1} trillion years")
    } else if billion > 1.0 {
        format!("{billion:.1} billion years")
    } else if million > 1.0 {
        format!("{million:.1} million years")
    } else if millennia > 1.0 {
        format!("{} thousand years", round_half_up(millennia))
    } else if centuries > 1.0 {
        format!("{} hundred years", round_half_up(centuries))
    } else if years > 1.0 {
        format!("{} years", round_half_up(years))
    } else if days > 1.0 {
        format!("{} days", round_half_up(days))
    } else if hours > 1.0 {
        format!(
            "{} hours|{} minutes",
            round_half_up(hours),
            round_half_up(minutes % MINUTES_PER_HOUR)
        )
    } else if minutes > 1.0 {
        format!(
            "{} minutes|{} seconds",
            round_half_up(minutes),
            round_half_up(seconds % SECONDS_PER_MINUTE)
        )
    } else {
        format!("{} seconds", round_half_up(seconds))
    }
}

pub fn format_light_fraction(percent: f64) -> String {
    if percent.is_nan() {
        NEUTRAL_RATE.to_string()
    } else if 100.0 - percent < LIGHT_SPEED_EPSILON {
        "Almost speed of light".to_string()
    } else {
        format!("{percent:.5}%")
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
