//! Typed configuration values and raw-setting classification
//!
//! Declared keys convert into one of the [`ConfigValue`] variants. Raw input
//! values may themselves be indirections: `["env", NAME]` or
//! `["secret", NAME]` pairs meaning "fetch the real value from there".
//! These are classified up front into [`RawSetting`] and resolved by the
//! builder before any type conversion runs.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_yaml::Value;
use std::fmt;

/// Declared type of a configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Symbol,
    Integer,
    Float,
    Boolean,
    Date,
    Timestamp,
    Json,
    CommaSeparatedStringList,
}

/// One converted, immutable configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    /// Identifier/atom form of a string
    Symbol(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
    Json(serde_json::Value),
    StringList(Vec<String>),
}

impl ConfigValue {
    /// Shorthand for the symbol variant
    pub fn symbol(value: impl Into<String>) -> Self {
        ConfigValue::Symbol(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            ConfigValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ConfigValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            ConfigValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ConfigValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringList(list) => Some(list),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{s}"),
            ConfigValue::Symbol(s) => write!(f, ":{s}"),
            ConfigValue::Integer(n) => write!(f, "{n}"),
            ConfigValue::Float(n) => write!(f, "{n}"),
            ConfigValue::Boolean(b) => write!(f, "{b}"),
            ConfigValue::Date(d) => write!(f, "{d}"),
            ConfigValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            ConfigValue::Json(v) => write!(f, "{v}"),
            ConfigValue::StringList(list) => write!(f, "{}", list.join(",")),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Classification of one raw input value
#[derive(Debug, Clone, PartialEq)]
pub enum RawSetting {
    /// A plain value, used as-is
    Literal(Value),
    /// Fetch the value from this environment variable
    EnvRef(String),
    /// Fetch the value from the secrets vault under this name
    SecretRef(String),
}

/// Classify a raw value into literal or indirection
pub fn classify_raw(value: &Value) -> RawSetting {
    if let Value::Sequence(items) = value {
        if let [Value::String(kind), Value::String(name)] = items.as_slice() {
            match kind.as_str() {
                "env" => return RawSetting::EnvRef(name.clone()),
                "secret" => return RawSetting::SecretRef(name.clone()),
                _ => {}
            }
        }
    }
    RawSetting::Literal(value.clone())
}
