//! String to typed-value conversion.
//!
//! [`ParseValue`] supplies the default converter for the built-in scalar
//! kinds; a per-option callback can override it (or supply one for types
//! without a default, see [`Scalar::custom`](crate::Scalar::custom)).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::time::Duration;

/// A type with a canonical parse routine usable as an option value.
///
/// The error string names only the expectation; the validation pipeline
/// wraps it with the raw value and the owning option.
pub trait ParseValue: Sized {
    /// Short type label used in diagnostics.
    fn type_label() -> &'static str;

    fn parse_value(raw: &str) -> Result<Self, String>;
}

macro_rules! impl_from_str {
    ($($ty:ty => $label:literal),+ $(,)?) => {
        $(
            impl ParseValue for $ty {
                fn type_label() -> &'static str {
                    $label
                }

                fn parse_value(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )+
    };
}

impl_from_str! {
    i8 => "integer", i16 => "integer", i32 => "integer", i64 => "integer", i128 => "integer",
    u8 => "integer", u16 => "integer", u32 => "integer", u64 => "integer", u128 => "integer",
    isize => "integer", usize => "integer",
    f32 => "float", f64 => "float",
    char => "character",
    NaiveDate => "date",
    NaiveTime => "time",
    NaiveDateTime => "date-time",
    DateTime<Utc> => "date-time",
    DateTime<FixedOffset> => "date-time",
}

impl ParseValue for String {
    fn type_label() -> &'static str {
        "string"
    }

    fn parse_value(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl ParseValue for bool {
    fn type_label() -> &'static str {
        "boolean"
    }

    fn parse_value(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err("expected a boolean (true/false, yes/no, on/off, 1/0)".to_string()),
        }
    }
}

impl ParseValue for Duration {
    fn type_label() -> &'static str {
        "time-span"
    }

    /// Accepts bare seconds (`90`, `1.5`) or `[d.]HH:MM[:SS[.frac]]`.
    fn parse_value(raw: &str) -> Result<Self, String> {
        parse_time_span(raw.trim())
    }
}

fn parse_time_span(raw: &str) -> Result<Duration, String> {
    if raw.is_empty() {
        return Err("expected a time-span".to_string());
    }
    if raw.starts_with('-') {
        return Err("time-span must not be negative".to_string());
    }

    if !raw.contains(':') {
        let secs: f64 = raw
            .parse()
            .map_err(|_| "expected seconds or [d.]HH:MM[:SS]".to_string())?;
        return Duration::try_from_secs_f64(secs)
            .map_err(|_| "seconds out of range for a time-span".to_string());
    }

    // [d.]HH:MM[:SS[.frac]]
    let (days, clock) = match raw.split_once('.') {
        // A '.' before the first ':' separates days; later it is a fraction.
        Some((lead, rest)) if !lead.contains(':') && rest.contains(':') => {
            let days: u64 = lead.parse().map_err(|_| "invalid day component".to_string())?;
            (days, rest)
        }
        _ => (0, raw),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err("expected [d.]HH:MM[:SS]".to_string());
    }
    let hours: u64 = parts[0].parse().map_err(|_| "invalid hour component".to_string())?;
    let minutes: u64 = parts[1].parse().map_err(|_| "invalid minute component".to_string())?;
    if minutes >= 60 {
        return Err("minute component must be below 60".to_string());
    }
    let seconds: f64 = if parts.len() == 3 {
        let secs: f64 = parts[2]
            .parse()
            .map_err(|_| "invalid second component".to_string())?;
        if !(0.0..60.0).contains(&secs) {
            return Err("second component must be below 60".to_string());
        }
        secs
    } else {
        0.0
    };

    let whole = days
        .checked_mul(86_400)
        .and_then(|d| hours.checked_mul(3_600).and_then(|h| d.checked_add(h)))
        .and_then(|s| s.checked_add(minutes * 60))
        .ok_or_else(|| "time-span component out of range".to_string())?;
    let frac = Duration::try_from_secs_f64(seconds)
        .map_err(|_| "second component out of range".to_string())?;
    Duration::from_secs(whole)
        .checked_add(frac)
        .ok_or_else(|| "time-span out of range".to_string())
}
