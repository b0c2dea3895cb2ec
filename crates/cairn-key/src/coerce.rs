//! Type coercion for typed key reads.
//!
//! Native values are returned as-is (numbers are converted between widths
//! the way a narrowing cast would). Anything else is rendered as text and
//! parsed. Empty text read as a number or boolean falls back to the caller's
//! default; malformed non-empty text is a [`KeyError::Parse`]. Strings are
//! never coerced, so a stored empty string reads back as itself.

use std::str::FromStr;

use crate::error::{KeyError, KeyResult};
use crate::value::Value;

/// Numeric types that typed getters can produce.
pub trait Numeric: FromStr + Copy {
    /// Type label used in parse errors.
    const NAME: &'static str;

    fn from_int(value: i64) -> Self;

    fn from_float(value: f64) -> Self;
}

impl Numeric for i32 {
    const NAME: &'static str = "int";

    fn from_int(value: i64) -> Self {
        value as i32
    }

    fn from_float(value: f64) -> Self {
        value as i32
    }
}

impl Numeric for i64 {
    const NAME: &'static str = "long";

    fn from_int(value: i64) -> Self {
        value
    }

    fn from_float(value: f64) -> Self {
        value as i64
    }
}

impl Numeric for f64 {
    const NAME: &'static str = "double";

    fn from_int(value: i64) -> Self {
        value as f64
    }

    fn from_float(value: f64) -> Self {
        value
    }
}

/// Coerce a stored value to a boolean.
///
/// Strings are compared case-insensitively against `"true"`; every other
/// non-boolean value reads as `false`.
pub fn to_bool(value: &Value, default: bool) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) if s.is_empty() => default,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Coerce a stored value to a number.
pub fn to_number<T: Numeric>(path: &str, value: &Value, default: T) -> KeyResult<T> {
    match value {
        Value::Int(i) => Ok(T::from_int(*i)),
        Value::Float(x) => Ok(T::from_float(*x)),
        other => {
            let raw = other.to_string();
            if raw.is_empty() {
                return Ok(default);
            }
            raw.parse::<T>().map_err(|_| KeyError::Parse {
                path: path.to_string(),
                value: raw,
                target: T::NAME,
            })
        }
    }
}

/// Coerce a stored value to its text form.
///
/// Stored strings, empty ones included, are returned unchanged.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text form used when persisting doubles.
///
/// Always carries a decimal point or exponent so the value reads back as a
/// double rather than an integer.
pub fn format_double(value: f64) -> String {
    format!("{value:?}")
}
