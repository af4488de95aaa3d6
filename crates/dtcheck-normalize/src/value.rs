//! Canonical rendering of single cell values.
//!
//! Null classification and rendering are independent: callers combine them so
//! that a null-equivalent cell always renders as [`NULL_TOKEN`], whatever its
//! column type would otherwise produce.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, TimeUnit};

use dtcheck_model::{ColumnDescriptor, NULL_TOKEN};

/// Physical value of the not-a-time sentinel in temporal columns.
pub const NOT_A_TIME: i64 = i64::MIN;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Returns true for floating-point NaN.
///
/// Values that are not floats are never NaN; this never fails.
pub fn is_nan(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Float32(v) => v.is_nan(),
        AnyValue::Float64(v) => v.is_nan(),
        _ => false,
    }
}

/// Returns true for the absence sentinel, the not-a-time sentinel, or NaN.
pub fn is_null(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::Datetime(v, ..) | AnyValue::DatetimeOwned(v, ..) => *v == NOT_A_TIME,
        AnyValue::Duration(v, _) => *v == NOT_A_TIME,
        other => is_nan(other),
    }
}

/// Renders a value of a numeric column with exactly four fractional digits.
pub fn render_fixed(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Int8(v) => format!("{v}.0000"),
        AnyValue::Int16(v) => format!("{v}.0000"),
        AnyValue::Int32(v) => format!("{v}.0000"),
        AnyValue::Int64(v) => format!("{v}.0000"),
        AnyValue::UInt8(v) => format!("{v}.0000"),
        AnyValue::UInt16(v) => format!("{v}.0000"),
        AnyValue::UInt32(v) => format!("{v}.0000"),
        AnyValue::UInt64(v) => format!("{v}.0000"),
        AnyValue::Float32(v) => format!("{:.4}", f64::from(*v)),
        AnyValue::Float64(v) => format!("{v:.4}"),
        AnyValue::String(s) => fixed_from_str(s),
        AnyValue::StringOwned(s) => fixed_from_str(s.as_str()),
        other => render_plain(other),
    }
}

fn fixed_from_str(value: &str) -> String {
    if value == NULL_TOKEN {
        return value.to_string();
    }
    if let Some(v) = parse_i64(value) {
        return format!("{v}.0000");
    }
    if let Some(digits) = integer_literal(value) {
        return format!("{digits}.0000");
    }
    match parse_f64(value) {
        Some(v) => format!("{v:.4}"),
        None => value.to_string(),
    }
}

/// Renders a value of an exact zero-scale column as a plain integer.
///
/// Floats carrying a `.0` artifact from the data access layer are truncated
/// toward zero; values that are not numbers are rendered verbatim.
pub fn render_integer(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Float32(v) => integer_from_f64(f64::from(*v)),
        AnyValue::Float64(v) => integer_from_f64(*v),
        AnyValue::String(s) => integer_from_str(s),
        AnyValue::StringOwned(s) => integer_from_str(s.as_str()),
        other => render_plain(other),
    }
}

fn integer_from_f64(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let truncated = value.trunc();
    if truncated == 0.0 {
        // -0.5 truncates to -0.0
        "0".to_string()
    } else {
        format!("{truncated:.0}")
    }
}

fn integer_from_str(value: &str) -> String {
    if value == NULL_TOKEN {
        return value.to_string();
    }
    if let Some(v) = parse_i64(value) {
        return v.to_string();
    }
    if let Some(digits) = integer_literal(value) {
        return digits.to_string();
    }
    match parse_f64(value) {
        Some(v) if v.is_finite() => integer_from_f64(v),
        _ => value.to_string(),
    }
}

/// Plain string form for columns without precision normalization.
pub fn render_plain(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => v.to_string(),
        AnyValue::Float64(v) => v.to_string(),
        AnyValue::Date(days) => date_from_days(*days)
            .map(|date| date.to_string())
            .unwrap_or_else(|| days.to_string()),
        AnyValue::Datetime(v, unit, _) | AnyValue::DatetimeOwned(v, unit, _) => {
            naive_datetime(*v, *unit)
                .map(|datetime| datetime.to_string())
                .unwrap_or_else(|| v.to_string())
        }
        other => other.to_string(),
    }
}

/// Renders a non-null value according to its column's classification.
pub fn render_value(value: &AnyValue<'_>, column: &ColumnDescriptor) -> String {
    if column.is_exact_zero_scale() {
        render_integer(value)
    } else if column.is_numeric() {
        render_fixed(value)
    } else {
        render_plain(value)
    }
}

/// Canonical cell value: the null token wins over any rendering.
pub fn canonical_cell(value: &AnyValue<'_>, column: &ColumnDescriptor) -> String {
    if is_null(value) {
        NULL_TOKEN.to_string()
    } else {
        render_value(value, column)
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn naive_datetime(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    datetime.map(|datetime| datetime.naive_utc())
}

fn parse_f64(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

/// Integer text too wide for `i64`, kept exact rather than rounded through `f64`.
fn integer_literal(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let literal = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(literal)
}

fn parse_i64(value: &str) -> Option<i64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<i64>().ok()
}
