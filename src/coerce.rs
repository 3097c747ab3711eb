//! Defensive numeric coercion for loosely-typed producer output.
//!
//! Agents and the context fetcher both hand us JSON we do not control: numbers
//! may arrive as strings, confidences may be on a 0–100 scale, fields may be
//! missing or `null`. Nothing here ever fails; every path falls back to a
//! caller-supplied default.

use serde_json::Value;

/// Neutral confidence used when a producer omits it or sends garbage.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Convert an optional JSON value to `f64`.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace trimmed).
/// `null`, missing values, booleans, arrays, objects, unparsable strings and
/// non-finite results all yield `default`.
pub fn to_float(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => x,
        _ => default,
    }
}

/// Like [`to_float`] but returns `None` instead of a default, so callers can
/// tell "absent" apart from "present and zero".
pub fn try_float(value: Option<&Value>) -> Option<f64> {
    let x = to_float(value, f64::NAN);
    x.is_finite().then_some(x)
}

/// Bring a producer-reported confidence into `[0, 1]`.
///
/// Values above 1.0 are assumed to be on a 0–100 scale and divided by 100.
pub fn normalize_confidence(value: Option<&Value>) -> f64 {
    unit_confidence(to_float(value, DEFAULT_CONFIDENCE))
}

/// Scale/clamp step of [`normalize_confidence`] for an already-coerced number.
pub fn unit_confidence(mut x: f64) -> f64 {
    if x > 1.0 {
        x /= 100.0;
    }
    clamp(x, 0.0, 1.0)
}

/// Standard bound. Call sites guarantee `lo <= hi`.
#[inline]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Presentation rounding to two decimals.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
