//! Declared field types

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::data::query::SqlValue;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    String,
    Json,
    Datetime,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Json => "json",
            Self::Datetime => "datetime",
            Self::Date => "date",
        }
    }

    /// Bind a raw request value, falling back to text when it does not parse
    pub fn bind(&self, raw: &str) -> SqlValue {
        let parsed = match self {
            Self::Integer => raw.trim().parse::<i64>().ok().map(SqlValue::Int),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(SqlValue::Float),
            Self::Boolean => parse_bool(raw).map(SqlValue::Bool),
            _ => None,
        };
        parsed.unwrap_or_else(|| SqlValue::from(raw))
    }

    /// Convert a decoded column value to this type
    ///
    /// Returns `None` when the value cannot be represented. `null` stays `null`.
    pub fn convert(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match self {
            Self::Integer => to_integer(value).map(Value::from),
            Self::Float => to_float(value)
                .and_then(Number::from_f64)
                .map(Value::Number),
            Self::Boolean => to_bool(value).map(Value::Bool),
            Self::String => Some(Value::String(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            Self::Json => match value {
                Value::String(s) => serde_json::from_str(s).ok(),
                other => Some(other.clone()),
            },
            Self::Datetime => to_datetime(value)
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
            Self::Date => to_date(value).map(|d| Value::String(d.format(DATE_FORMAT).to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => parse_bool(s),
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => parse_datetime(s.trim()),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc())
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    if let Value::String(s) = value
        && let Ok(date) = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
    {
        return Some(date);
    }
    to_datetime(value).map(|dt| dt.date_naive())
}
