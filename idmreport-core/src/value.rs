//! Value coercion helpers
//!
//! Recipe comparisons are loosely typed: string coercion for bracket filters
//! and `contains`, numeric coercion for range operators.

use serde_json::Value;
use std::cmp::Ordering;

/// Coerce a value to its canonical string form.
///
/// Absent values become `"undefined"`, integral floats drop their `.0`,
/// arrays are comma-joined and objects serialize as JSON.
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(other @ Value::Object(_)) => other.to_string(),
    }
}

/// Format a float without a trailing `.0` for integral values
pub fn format_number(f: f64) -> String {
    if !f.is_finite() {
        return "0".to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Numeric view of a value: numbers as-is, numeric strings parsed.
pub fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Strict equality (`===`) between two JSON values.
///
/// Numbers compare by value so `72` equals `72.0`; other types must match
/// structurally.
pub fn strict_eq(a: Option<&Value>, b: &Value) -> bool {
    match (a, b) {
        (None, _) => false,
        (Some(Value::Number(x)), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Some(x), y) => x == y,
    }
}

/// Locale-style string ordering: case-insensitive first, code point second.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Replace NaN/infinite values with 0 and clamp into `[0, max]`.
pub fn sanitize(v: f64, max: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, max)
    } else {
        0.0
    }
}
