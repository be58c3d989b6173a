//! String-to-value conversions used by [`Namespace`](crate::Namespace).
//!
//! Every converter trims surrounding whitespace first, since CIF values keep
//! the space after `=`. Failures are reported as
//! [`Conversion`](SettingsError::Conversion) errors naming the target type.

use std::time::Duration;

use crate::error::{Result, SettingsError};

fn fail(value: &str, target: &'static str) -> SettingsError {
    SettingsError::Conversion {
        value: value.to_string(),
        target,
    }
}

/// Collapse every run of whitespace into a single space.
pub fn to_flattened(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn to_int(s: &str) -> Result<i64> {
    s.trim().parse().map_err(|_| fail(s, "integer"))
}

pub fn to_float(s: &str) -> Result<f64> {
    s.trim().parse().map_err(|_| fail(s, "float"))
}

/// `true`/`yes`/`1` and `false`/`no`/`0`, case-insensitive.
pub fn to_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(fail(s, "bool")),
    }
}

/// Parse a human-readable duration such as `30s`, `5min`, `1h 30min` or
/// `42 seconds`.
pub fn to_duration(s: &str) -> Result<Duration> {
    let trimmed = s.trim();
    humantime::parse_duration(trimmed)
        .or_else(|_| humantime::parse_duration(&trimmed.split_whitespace().collect::<String>()))
        .map_err(|_| fail(s, "duration"))
}

/// Parse a size in bytes such as `512`, `42kb` or `3 gigabytes`. Units are
/// binary multiples (1kb = 1024 bytes).
pub fn to_size(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let value: u64 = digits.parse().map_err(|_| fail(s, "size"))?;
    let shift = match unit.trim().to_lowercase().as_str() {
        "" | "b" | "byte" | "bytes" => 0,
        "kb" | "kilo" | "kilobyte" | "kilobytes" => 10,
        "mb" | "mega" | "megabyte" | "megabytes" => 20,
        "gb" | "giga" | "gigabyte" | "gigabytes" => 30,
        "tb" | "tera" | "terabyte" | "terabytes" => 40,
        "pb" | "peta" | "petabyte" | "petabytes" => 50,
        _ => return Err(fail(s, "size")),
    };
    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| fail(s, "size"))
}

/// Parse a percentage such as `42%` or `12.5 %` into a fraction (`0.42`).
pub fn to_percentage(s: &str) -> Result<f64> {
    let number = s
        .trim()
        .strip_suffix('%')
        .map(str::trim_end)
        .ok_or_else(|| fail(s, "percentage"))?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(fail(s, "percentage"));
    }
    let value: f64 = number.parse().map_err(|_| fail(s, "percentage"))?;
    Ok(value / 100.0)
}
