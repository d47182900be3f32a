//! Scalar converters for raw vendor payloads
//!
//! The mobile API is loose about types: booleans arrive as `"1"`, numbers as
//! padded strings, dates in two different patterns. Each converter here takes
//! a raw [`Value`] and produces a typed value or a [`Error::Format`].
//!
//! Every converter also accepts the canonical rendering produced by
//! [`crate::mapping::ToRaw`] for its output type, so feeding an already
//! converted value back in returns it unchanged.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Canonical date rendering (`dd.mm.yyyy`)
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Date patterns tried in order when parsing
const DATE_PATTERNS: [&str; 2] = ["%d.%m.%y", DATE_FORMAT];

/// Canonical datetime rendering (`yyyymmddhhmmss`)
pub const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

const DATETIME_LENGTH: usize = 14;

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(a) => format!("array of {} items", a.len()),
        Value::Object(o) => format!("object with {} keys", o.len()),
    }
}

/// Trimmed text of a string or number value, `None` for anything else
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `null`, or a string that is empty after trimming
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

pub fn boolean(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::format(format!("invalid boolean value: {}", describe(value)))),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(Error::format(format!("invalid boolean value: {}", describe(value)))),
        },
        _ => Err(Error::format(format!("invalid boolean value: {}", describe(value)))),
    }
}

pub fn integer(value: &Value) -> Result<i64> {
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    let text = match value {
        Value::String(s) => s.trim(),
        _ => return Err(Error::format(format!("invalid integer value: {}", describe(value)))),
    };
    text.parse::<i64>()
        .map_err(|e| Error::format(format!("invalid integer value {text:?}: {e}")))
}

pub fn integer_opt(value: &Value) -> Result<Option<i64>> {
    if is_blank(value) {
        return Ok(None);
    }
    integer(value).map(Some)
}

/// Integer where `null` stands for zero (counters)
pub fn integer_or_zero(value: &Value) -> Result<i64> {
    if value.is_null() {
        return Ok(0);
    }
    integer(value)
}

pub fn float(value: &Value) -> Result<f64> {
    if let Some(f) = value.as_f64() {
        return Ok(f);
    }
    let text = match value {
        Value::String(s) => s.trim(),
        _ => return Err(Error::format(format!("invalid float value: {}", describe(value)))),
    };
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f),
        Ok(_) => Err(Error::format(format!("non-finite float value {text:?}"))),
        Err(e) => Err(Error::format(format!("invalid float value {text:?}: {e}"))),
    }
}

pub fn float_opt(value: &Value) -> Result<Option<f64>> {
    if is_blank(value) {
        return Ok(None);
    }
    float(value).map(Some)
}

/// Float where `null` stands for zero (balances, debts)
pub fn float_or_zero(value: &Value) -> Result<f64> {
    if value.is_null() {
        return Ok(0.0);
    }
    float(value)
}

pub fn date(value: &Value) -> Result<NaiveDate> {
    date_opt(value)?.ok_or_else(|| Error::format(format!("invalid date value: {}", describe(value))))
}

pub fn date_opt(value: &Value) -> Result<Option<NaiveDate>> {
    if is_blank(value) {
        return Ok(None);
    }
    let text = match value {
        Value::String(s) => s.trim(),
        _ => return Err(Error::format(format!("invalid date value: {}", describe(value)))),
    };
    parse_date(text).map(Some)
}

/// Parse `dd.mm.yy`, falling back to `dd.mm.yyyy`
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
        .ok_or_else(|| Error::format(format!("date {text:?} matches neither dd.mm.yy nor dd.mm.yyyy")))
}

pub fn datetime(value: &Value) -> Result<NaiveDateTime> {
    datetime_opt(value)?
        .ok_or_else(|| Error::format(format!("invalid datetime value: {}", describe(value))))
}

pub fn datetime_opt(value: &Value) -> Result<Option<NaiveDateTime>> {
    if is_blank(value) {
        return Ok(None);
    }
    let text = scalar_text(value)
        .ok_or_else(|| Error::format(format!("invalid datetime value: {}", describe(value))))?;
    parse_datetime(&text).map(Some)
}

/// Parse a fixed-width `yyyymmddhhmmss` timestamp
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    if text.len() != DATETIME_LENGTH {
        return Err(Error::format(format!(
            "datetime can only be converted from a {DATETIME_LENGTH}-character string, got {text:?}"
        )));
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::format(format!("datetime {text:?} contains non-digit characters")));
    }

    // All characters are ASCII digits, so byte slicing is safe and each part parses.
    let part = |range: std::ops::Range<usize>| text[range].parse::<u32>().unwrap_or_default();
    let year = part(0..4) as i32;

    NaiveDate::from_ymd_opt(year, part(4..6), part(6..8))
        .and_then(|d| d.and_hms_opt(part(8..10), part(10..12), part(12..14)))
        .ok_or_else(|| Error::format(format!("datetime {text:?} is out of range")))
}

/// Whitespace-stripped text; numbers and booleans are rendered
pub fn string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::format(format!("invalid string value: {}", describe(value)))),
    }
}

/// Stripped text, absent when `null` or empty after trimming
pub fn string_opt(value: &Value) -> Result<Option<String>> {
    if is_blank(value) {
        return Ok(None);
    }
    string(value).map(Some)
}
