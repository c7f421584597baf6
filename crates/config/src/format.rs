// SPDX-License-Identifier: MIT
//! Pluggable file-format parsers, producing a flat dotted-key map.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::value::ConfigValue;

/// A file-format parser the configuration manager can discover files by
/// extension and decode through. [`YamlFormat`] is the default, matching the
/// `type` option's default of `yaml`; [`TomlFormat`] and [`JsonFormat`] are
/// the other two recognized built-ins.
pub trait ConfigFormat: Send + Sync {
    fn extension(&self) -> &'static str;
    fn parse(&self, contents: &str) -> Result<BTreeMap<String, ConfigValue>, ConfigError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TomlFormat;

impl ConfigFormat for TomlFormat {
    fn extension(&self) -> &'static str {
        "toml"
    }

    fn parse(&self, contents: &str) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
        let root: toml::Value = toml::from_str(contents).map_err(|e| ConfigError::ConfigParseFailed(Box::new(e)))?;
        let mut out = BTreeMap::new();
        flatten_toml(&root, String::new(), &mut out);
        Ok(out)
    }
}

fn flatten_toml(value: &toml::Value, prefix: String, out: &mut BTreeMap<String, ConfigValue>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let dotted = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten_toml(child, dotted, out);
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix, ConfigValue::String(s.clone()));
        }
        toml::Value::Integer(i) => {
            out.insert(prefix, ConfigValue::Int(*i));
        }
        toml::Value::Float(f) => {
            out.insert(prefix, ConfigValue::Float(*f));
        }
        toml::Value::Boolean(b) => {
            out.insert(prefix, ConfigValue::Bool(*b));
        }
        toml::Value::Datetime(dt) => {
            out.insert(prefix, ConfigValue::String(dt.to_string()));
        }
        // Arrays have no representation in the flat scalar model; stored as
        // their TOML text so a round-trip through a raw accessor at least
        // preserves the information, rather than silently dropping it.
        toml::Value::Array(arr) => {
            out.insert(prefix, ConfigValue::String(toml::to_string(arr).unwrap_or_default()));
        }
    }
}

/// The default recognized format (`type = "yaml"`).
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlFormat;

impl ConfigFormat for YamlFormat {
    fn extension(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, contents: &str) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::ConfigParseFailed(Box::new(e)))?;
        let mut out = BTreeMap::new();
        flatten_yaml(&root, String::new(), &mut out);
        Ok(out)
    }
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: String, out: &mut BTreeMap<String, ConfigValue>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, child) in map {
                let Some(key) = key.as_str() else { continue };
                let dotted = if prefix.is_empty() { key.to_string() } else { format!("{prefix}.{key}") };
                flatten_yaml(child, dotted, out);
            }
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix, ConfigValue::String(s.clone()));
        }
        serde_yaml::Value::Bool(b) => {
            out.insert(prefix, ConfigValue::Bool(*b));
        }
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.insert(prefix, ConfigValue::Int(i));
            } else if let Some(f) = n.as_f64() {
                out.insert(prefix, ConfigValue::Float(f));
            }
        }
        serde_yaml::Value::Null => {}
        // Sequences have no representation in the flat scalar model; stored
        // as their YAML text, same tradeoff as TOML arrays above.
        serde_yaml::Value::Sequence(seq) => {
            out.insert(prefix, ConfigValue::String(serde_yaml::to_string(seq).unwrap_or_default()));
        }
        serde_yaml::Value::Tagged(tagged) => {
            flatten_yaml(&tagged.value, prefix, out);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFormat;

impl ConfigFormat for JsonFormat {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn parse(&self, contents: &str) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
        let root: serde_json::Value =
            serde_json::from_str(contents).map_err(|e| ConfigError::ConfigParseFailed(Box::new(e)))?;
        let mut out = BTreeMap::new();
        flatten_json(&root, String::new(), &mut out);
        Ok(out)
    }
}

fn flatten_json(value: &serde_json::Value, prefix: String, out: &mut BTreeMap<String, ConfigValue>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let dotted = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten_json(child, dotted, out);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(prefix, ConfigValue::String(s.clone()));
        }
        serde_json::Value::Bool(b) => {
            out.insert(prefix, ConfigValue::Bool(*b));
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.insert(prefix, ConfigValue::Int(i));
            } else if let Some(f) = n.as_f64() {
                out.insert(prefix, ConfigValue::Float(f));
            }
        }
        serde_json::Value::Null => {}
        serde_json::Value::Array(arr) => {
            out.insert(prefix, ConfigValue::String(serde_json::to_string(arr).unwrap_or_default()));
        }
    }
}

/// Look up a built-in format by its `type` name (`yaml`, `json`, `toml`).
/// Unrecognized names fall back to [`YamlFormat`], the documented default.
pub fn format_by_name(name: &str) -> std::sync::Arc<dyn ConfigFormat> {
    match name {
        "toml" => std::sync::Arc::new(TomlFormat),
        "json" => std::sync::Arc::new(JsonFormat),
        _ => std::sync::Arc::new(YamlFormat),
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
