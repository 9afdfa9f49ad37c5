//! Pure per-column type coercion.
//!
//! Coercion never fails: a value that cannot be parsed as the target type
//! becomes a null cell, and whether that null is acceptable is decided later
//! by constraint enforcement. The `string` target is total (no cell is ever
//! null afterwards) and an unrecognized target type is the identity
//! transform.

use crate::{
    data::{self, Number, Value},
    mapping::TargetType,
};

/// Converts a column of raw cells to the target semantic type.
pub fn coerce_column(cells: &[Option<&str>], target: &TargetType) -> Vec<Option<Value>> {
    match target {
        TargetType::Date => cells.iter().map(|cell| cell.and_then(coerce_date)).collect(),
        TargetType::Float => cells
            .iter()
            .map(|cell| cell.and_then(coerce_float))
            .collect(),
        TargetType::Integer => cells
            .iter()
            .map(|cell| cell.and_then(coerce_integer))
            .collect(),
        TargetType::String => cells
            .iter()
            .map(|cell| {
                Some(Value::String(cell.unwrap_or_default().to_string()))
            })
            .collect(),
        TargetType::Identity(_) => cells
            .iter()
            .map(|cell| cell.map(|raw| Value::String(raw.to_string())))
            .collect(),
    }
}

fn coerce_date(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = data::parse_naive_date(trimmed) {
        return Some(Value::Date(date));
    }
    data::parse_naive_datetime(trimmed).ok().map(Value::DateTime)
}

fn coerce_float(raw: &str) -> Option<Value> {
    match data::parse_number(raw)? {
        Number::Integer(i) => Some(Value::Float(i as f64)),
        Number::Float(f) => Some(Value::Float(f)),
    }
}

// Narrow to i64 whenever the parsed number is integral; a fractional value
// stays a float rather than turning into a null.
fn coerce_integer(raw: &str) -> Option<Value> {
    match data::parse_number(raw)? {
        Number::Integer(i) => Some(Value::Integer(i)),
        Number::Float(f)
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 =>
        {
            Some(Value::Integer(f as i64))
        }
        Number::Float(f) => Some(Value::Float(f)),
    }
}
