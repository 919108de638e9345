//! Lenient readers for JSON override objects.
//!
//! Presets can be tweaked with a JSON object (from the CLI `--params` flag or
//! a `data-` attribute on the canvas). A missing key, a value of the wrong
//! type, or a number outside the accepted range leaves the preset's value in
//! place; overrides never make construction fail.

use serde_json::Value;

/// Reads a number, keeping `current` if absent or not numeric.
pub fn param_f64(params: &Value, name: &str, current: f64) -> f64 {
    params
        .get(name)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(current)
}

/// Reads a number and clamps it into `[min, max]`.
pub fn param_f64_in(params: &Value, name: &str, current: f64, min: f64, max: f64) -> f64 {
    param_f64(params, name, current).clamp(min, max)
}

/// Reads a non-negative integer, keeping `current` if absent, negative,
/// fractional or not numeric.
pub fn param_usize(params: &Value, name: &str, current: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(current)
}

/// Reads a non-negative integer that fits in `u32`.
pub fn param_u32(params: &Value, name: &str, current: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(current)
}

pub fn param_bool(params: &Value, name: &str, current: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(current)
}

pub fn param_str<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(Value::as_str)
}
