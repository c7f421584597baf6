// SPDX-License-Identifier: MIT
//! A single effective configuration value, and the flat dotted-key
//! representation the manager merges layers through before binding.

use std::time::Duration;

use ignite_core::FlagValue;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Duration(Duration),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            ConfigValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Int(i) => serde_json::json!(i),
            ConfigValue::Float(f) => serde_json::json!(f),
            ConfigValue::Bool(b) => serde_json::json!(b),
            ConfigValue::Duration(d) => serde_json::json!(d.as_secs_f64()),
        }
    }

    /// Best-effort parse of a raw environment-variable string: tries bool,
    /// then integer, then float, falling back to a plain string. There is no
    /// declared schema at this point in the pipeline to parse against more
    /// precisely.
    pub(crate) fn from_env_str(raw: &str) -> ConfigValue {
        if let Ok(b) = raw.parse::<bool>() {
            return ConfigValue::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ConfigValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return ConfigValue::Float(f);
        }
        ConfigValue::String(raw.to_string())
    }
}

impl From<FlagValue> for ConfigValue {
    fn from(value: FlagValue) -> Self {
        match value {
            FlagValue::String(s) => ConfigValue::String(s),
            FlagValue::Int(i) => ConfigValue::Int(i),
            FlagValue::Bool(b) => ConfigValue::Bool(b),
            FlagValue::Duration(d) => ConfigValue::Duration(d),
            FlagValue::Float(f) => ConfigValue::Float(f),
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
