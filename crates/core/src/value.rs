//! Parameter and result values
//!
//! [`Value`] is what callers bind as statement parameters and what result
//! columns scan from. It carries only the types the ODBC layer marshals:
//! integers, character data and time-of-day.
//!
//! ## Equality Rules
//!
//! - Different variants are never equal (`Int(1) != String("1")`)
//! - `Time` compares hour/minute/second only

use crate::error::{Error, Result};
use crate::time::TimeOfDay;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::fmt;

/// A bound parameter or a fetched column value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 64-bit signed integer
    Int(i64),
    /// Character data
    String(String),
    /// Time of day, bound as `SQL_TIME_STRUCT`
    Time(TimeOfDay),
}

impl Value {
    /// Returns the type name as a string (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Int(_) => "Int",
            Value::String(_) => "String",
            Value::Time(_) => "Time",
        }
    }

    /// Check if this is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Time(t) => write!(f, "{}", t),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<TimeOfDay> for Value {
    fn from(t: TimeOfDay) -> Self {
        Value::Time(t)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(TimeOfDay::from_naive_time(t))
    }
}

/// A timestamp binds as its wall-clock time of day
impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(ts: DateTime<Tz>) -> Self {
        Value::Time(TimeOfDay::encode(&ts))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Types a result column can be scanned into
pub trait FromValue: Sized {
    /// Convert a fetched value, failing on a type mismatch
    fn from_value(value: Value) -> Result<Self>;
}

fn wrong_type(expected: &'static str, value: &Value) -> Error {
    Error::WrongType {
        expected,
        actual: value.type_name(),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(n),
            other => Err(wrong_type("Int", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(wrong_type("String", &other)),
        }
    }
}

impl FromValue for TimeOfDay {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(t) => Ok(t),
            other => Err(wrong_type("Time", &other)),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self> {
        TimeOfDay::from_value(value).map(|t| t.to_naive_time())
    }
}

/// Scans a TIME column the way a timestamp reads it back: anchored at the
/// reference date in the local zone
impl FromValue for DateTime<Local> {
    fn from_value(value: Value) -> Result<Self> {
        TimeOfDay::from_value(value).map(|t| t.decode())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
