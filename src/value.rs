//! Driver values and the DB2 bind/result processors.
//!
//! DB2 has no BOOLEAN column type, so booleans travel as `'1'`/`'0'` and come
//! back as small integers. Dates and timestamps are bound as strings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::types::ValueKind;

/// Dynamic value exchanged with the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the value as text, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value. Catalog columns such as LENGTH arrive as
    /// integers from some drivers and as strings from others.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

/// Convert a value into its bound form for a column of the given kind.
pub fn bind_value(kind: ValueKind, value: Value) -> Value {
    match (kind, value) {
        (_, Value::Null) => Value::Null,
        (ValueKind::Boolean, Value::Bool(b)) => Value::String(if b { "1" } else { "0" }.into()),
        (ValueKind::Boolean, v) => match v.as_i64() {
            Some(0) => Value::String("0".into()),
            Some(_) => Value::String("1".into()),
            None => v,
        },
        (ValueKind::DateTime, Value::Date(d)) => Value::String(midnight(d).to_string()),
        (ValueKind::DateTime, Value::DateTime(dt)) => Value::String(dt.to_string()),
        (ValueKind::Date, Value::DateTime(dt)) => Value::String(dt.date().to_string()),
        (ValueKind::Date, Value::Date(d)) => Value::String(d.to_string()),
        (_, v) => v,
    }
}

/// Convert a fetched value for a column of the given kind.
pub fn result_value(kind: ValueKind, value: Value) -> Value {
    match (kind, value) {
        (_, Value::Null) => Value::Null,
        (ValueKind::Boolean, v) => match v.as_i64() {
            Some(n) => Value::Bool(n != 0),
            None => v,
        },
        (ValueKind::DateTime, Value::Date(d)) => Value::DateTime(midnight(d)),
        (ValueKind::Date, Value::DateTime(dt)) => Value::Date(dt.date()),
        (_, v) => v,
    }
}

fn midnight(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_boolean_bind() {
        assert_eq!(bind_value(ValueKind::Boolean, true.into()), Value::from("1"));
        assert_eq!(bind_value(ValueKind::Boolean, false.into()), Value::from("0"));
        assert_eq!(bind_value(ValueKind::Boolean, Value::Null), Value::Null);
    }

    #[test]
    fn test_boolean_result() {
        assert_eq!(result_value(ValueKind::Boolean, Value::Int(1)), Value::Bool(true));
        assert_eq!(result_value(ValueKind::Boolean, Value::Int(0)), Value::Bool(false));
        assert_eq!(result_value(ValueKind::Boolean, "1".into()), Value::Bool(true));
    }

    #[test]
    fn test_datetime_bind_from_date() {
        let v = bind_value(ValueKind::DateTime, date(2024, 2, 29).into());
        assert_eq!(v, Value::from("2024-02-29 00:00:00"));
    }

    #[test]
    fn test_date_processors_truncate() {
        let dt = date(2023, 7, 4).and_hms_opt(13, 30, 0).unwrap();
        assert_eq!(bind_value(ValueKind::Date, dt.into()), Value::from("2023-07-04"));
        assert_eq!(result_value(ValueKind::Date, dt.into()), Value::Date(date(2023, 7, 4)));
        assert_eq!(
            result_value(ValueKind::DateTime, date(2023, 7, 4).into()),
            Value::DateTime(date(2023, 7, 4).and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_plain_passthrough() {
        assert_eq!(bind_value(ValueKind::Plain, Value::Int(7)), Value::Int(7));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(" 42 ").as_i64(), Some(42));
    }
}
