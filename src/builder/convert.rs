//! Built-in type converters
//!
//! One function per declared type, dispatched by [`convert`]. Conversion
//! failures name the offending key and abort the whole build pass.

use super::value::{ConfigValue, ValueType};
use crate::domain::{Result, StrataError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::Value;

/// Convert a resolved raw value to its declared type
pub fn convert(key: &str, value: &Value, value_type: ValueType) -> Result<ConfigValue> {
    match value_type {
        ValueType::String => convert_string(key, value).map(ConfigValue::String),
        ValueType::Symbol => convert_string(key, value).map(ConfigValue::Symbol),
        ValueType::Integer => convert_integer(key, value),
        ValueType::Float => convert_float(key, value),
        ValueType::Boolean => convert_boolean(key, value),
        ValueType::Date => convert_date(key, value),
        ValueType::Timestamp => convert_timestamp(key, value),
        ValueType::Json => convert_json(key, value),
        ValueType::CommaSeparatedStringList => convert_string_list(key, value),
    }
}

fn conversion_error(key: &str, message: impl Into<String>) -> StrataError {
    StrataError::Conversion {
        key: key.to_string(),
        message: message.into(),
    }
}

fn convert_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(conversion_error(
            key,
            format!("invalid configuration value: {other:?}"),
        )),
    }
}

fn convert_integer(key: &str, value: &Value) -> Result<ConfigValue> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(ConfigValue::Integer)
            .ok_or_else(|| conversion_error(key, format!("invalid integer value: {n}"))),
        Value::String(s) => s
            .parse::<i64>()
            .map(ConfigValue::Integer)
            .map_err(|_| conversion_error(key, format!("invalid integer value: {s:?}"))),
        other => Err(conversion_error(
            key,
            format!("invalid integer value: {other:?}"),
        )),
    }
}

fn convert_float(key: &str, value: &Value) -> Result<ConfigValue> {
    match value {
        Value::Number(n) => Ok(ConfigValue::Float(
            n.as_f64()
                .ok_or_else(|| conversion_error(key, format!("invalid float value: {n}")))?,
        )),
        Value::String(s) => s
            .parse::<f64>()
            .map(ConfigValue::Float)
            .map_err(|_| conversion_error(key, format!("invalid float value: {s:?}"))),
        other => Err(conversion_error(
            key,
            format!("invalid float value: {other:?}"),
        )),
    }
}

// Strict: only true/false and their string forms; "1"/"yes" are not booleans.
fn convert_boolean(key: &str, value: &Value) -> Result<ConfigValue> {
    match value {
        Value::Bool(b) => Ok(ConfigValue::Boolean(*b)),
        Value::String(s) if s == "true" => Ok(ConfigValue::Boolean(true)),
        Value::String(s) if s == "false" => Ok(ConfigValue::Boolean(false)),
        other => Err(conversion_error(
            key,
            format!("invalid boolean value: {other:?}"),
        )),
    }
}

fn convert_date(key: &str, value: &Value) -> Result<ConfigValue> {
    let text = convert_string(key, value)?;
    text.parse::<NaiveDate>()
        .map(ConfigValue::Date)
        .map_err(|err| conversion_error(key, format!("invalid date value {text:?}: {err}")))
}

fn convert_timestamp(key: &str, value: &Value) -> Result<ConfigValue> {
    let text = convert_string(key, value)?;
    DateTime::parse_from_rfc3339(&text)
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .map(ConfigValue::Timestamp)
        .map_err(|err| conversion_error(key, format!("invalid timestamp value {text:?}: {err}")))
}

fn convert_json(key: &str, value: &Value) -> Result<ConfigValue> {
    let text = convert_string(key, value)?;
    serde_json::from_str(&text)
        .map(ConfigValue::Json)
        .map_err(|err| conversion_error(key, format!("invalid JSON value: {err}")))
}

// CSV semantics: empty string is an empty list, double-quotes escape
// embedded commas. The csv crate is lenient about unterminated quotes and
// extra records, so both are rejected up front.
fn convert_string_list(key: &str, value: &Value) -> Result<ConfigValue> {
    let text = convert_string(key, value)?;
    if text.is_empty() {
        return Ok(ConfigValue::StringList(Vec::new()));
    }
    if text.matches('"').count() % 2 != 0 {
        return Err(conversion_error(
            key,
            format!("unterminated quote in comma-separated list: {text:?}"),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let converted = match records.next() {
        Some(Ok(record)) => ConfigValue::StringList(record.iter().map(str::to_string).collect()),
        Some(Err(err)) => {
            return Err(conversion_error(
                key,
                format!("malformed comma-separated list: {err}"),
            ))
        }
        None => ConfigValue::StringList(Vec::new()),
    };

    if records.next().is_some() {
        return Err(conversion_error(
            key,
            "comma-separated list must be a single record",
        ));
    }
    Ok(converted)
}
