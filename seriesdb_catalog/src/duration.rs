//! Duration literals as the query language spells them.
//!
//! Parsing accepts the single-unit literal form (`365d`, `1h`, `10s`, plus
//! a bare `0` for "indefinite"), and formatting reproduces the rendering
//! clients already depend on: hours/minutes/seconds run together, as in
//! `1h0m0s` or `8760h0m0s`, with sub-second durations falling back to
//! `ms`/`µs`/`ns` units.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid duration")]
pub struct DurationError;

/// Parse a duration literal such as `1h`, `90m`, `365d`, or `0`.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or(DurationError)?;
    if digits_end == 0 {
        return Err(DurationError);
    }
    let value: u64 = s[..digits_end].parse().map_err(|_| DurationError)?;
    let seconds = |mult: u64| {
        value
            .checked_mul(mult)
            .map(Duration::from_secs)
            .ok_or(DurationError)
    };
    match &s[digits_end..] {
        "u" | "µ" => Ok(Duration::from_micros(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "s" => seconds(1),
        "m" => seconds(60),
        "h" => seconds(60 * 60),
        "d" => seconds(24 * 60 * 60),
        "w" => seconds(7 * 24 * 60 * 60),
        _ => Err(DurationError),
    }
}

/// Render a duration in the `1h0m0s` style.
///
/// Durations of at least a minute always spell out their smaller
/// components, so an exact hour renders as `1h0m0s` rather than `1h`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format_with_frac(nanos, 1_000, "µs");
    }
    if nanos < 1_000_000_000 {
        return format_with_frac(nanos, 1_000_000, "ms");
    }

    let secs = d.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let sec_nanos = u128::from(secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos());
    let seconds = format_with_frac(sec_nanos, 1_000_000_000, "s");
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}")
    } else {
        seconds
    }
}

fn format_with_frac(nanos: u128, unit: u128, suffix: &str) -> String {
    let whole = nanos / unit;
    let frac = nanos % unit;
    if frac == 0 {
        return format!("{whole}{suffix}");
    }
    let width = unit.ilog10() as usize;
    let mut frac_digits = format!("{frac:0width$}");
    while frac_digits.ends_with('0') {
        frac_digits.pop();
    }
    format!("{whole}.{frac_digits}{suffix}")
}
