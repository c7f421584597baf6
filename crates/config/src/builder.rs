// SPDX-License-Identifier: MIT
//! The layered configuration manager: merges defaults, file, profile, env,
//! and CLI layers into one effective dotted-key map, then binds it into
//! typed structures.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::format::{format_by_name, ConfigFormat, YamlFormat};
use crate::profile::selected_profile;
use crate::source::{default_search_paths, discover_file, load_env, read_to_string};
use crate::value::ConfigValue;

/// One merged layer, emitted once per `build()` so an operator can see which
/// layer last touched which keys. Never re-emitted — there is no hot-reload.
#[derive(Clone, Debug)]
pub struct ConfigEvent {
    pub source: &'static str,
    pub keys_added: usize,
    pub keys_overridden: usize,
}

/// Optional post-bind defaulting hook. A no-op unless the target type
/// overrides it; implement with an empty body to opt a type in without
/// changing its behavior.
pub trait ConfigDefaults {
    fn apply_defaults(&mut self) {}
}

/// Optional post-bind validation hook, run immediately after
/// [`ConfigDefaults::apply_defaults`]. A failure aborts bring-up with
/// [`ConfigError::ConfigInvalid`].
pub trait ConfigValidate {
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Builds a [`ConfigManager`] from layered sources, lowest to highest
/// precedence: programmatic defaults, file + profile overlay, environment
/// variables, then CLI flags.
pub struct ConfigBuilder {
    name: String,
    format: Arc<dyn ConfigFormat>,
    search_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    profile_env: Option<String>,
    profile: Option<String>,
    strict: bool,
    defaults: BTreeMap<String, ConfigValue>,
    cli_overrides: BTreeMap<String, ConfigValue>,
    explicit_file: Option<PathBuf>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            name: "config".to_string(),
            format: Arc::new(YamlFormat),
            search_paths: default_search_paths(),
            env_prefix: None,
            profile_env: None,
            profile: None,
            strict: false,
            defaults: BTreeMap::new(),
            cli_overrides: BTreeMap::new(),
            explicit_file: None,
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn format(mut self, format: impl ConfigFormat + 'static) -> Self {
        self.format = Arc::new(format);
        self
    }

    /// Select a built-in format by its `type` name (`yaml`, `json`, `toml`),
    /// matching the recognized `type` option. Unrecognized names fall back
    /// to YAML.
    pub fn type_name(mut self, name: impl AsRef<str>) -> Self {
        self.format = format_by_name(name.as_ref());
        self
    }

    pub fn search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn profile_env(mut self, var: impl Into<String>) -> Self {
        self.profile_env = Some(var.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load this literal file instead of searching `search_paths` for
    /// `<name>.<ext>`. The format is inferred from the path's extension
    /// (falling back to YAML if it has none or isn't recognized), and the
    /// profile overlay file is not searched for either — an explicit path
    /// names the one file to load.
    pub fn explicit_path(mut self, path: PathBuf) -> Self {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.format = format_by_name(ext);
        }
        self.explicit_file = Some(path);
        self
    }

    /// Add a programmatic default at the lowest precedence tier.
    pub fn default_value(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Add a value at the highest precedence tier, as if the caller had
    /// passed it explicitly on the command line. Used by the provider-config
    /// binder to inject flag values the user actually supplied.
    pub fn cli_override(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.cli_overrides.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<ConfigManager, ConfigError> {
        let mut effective = BTreeMap::new();
        let mut events = Vec::new();

        merge_layer(&mut effective, &mut events, "defaults", self.defaults.clone());

        if let Some(path) = &self.explicit_file {
            let parsed = self.load_file(path)?;
            if self.strict {
                check_unknown_keys(&parsed, &self.defaults)?;
            }
            merge_layer(&mut effective, &mut events, "file", parsed);
        } else {
            if let Some(path) = discover_file(&self.name, self.format.extension(), &self.search_paths) {
                let parsed = self.load_file(&path)?;
                if self.strict {
                    check_unknown_keys(&parsed, &self.defaults)?;
                }
                merge_layer(&mut effective, &mut events, "file", parsed);
            }

            let profile = selected_profile(self.profile.as_deref(), self.profile_env.as_deref());
            if let Some(profile) = &profile {
                let profile_name = format!("{}.{profile}", self.name);
                if let Some(path) = discover_file(&profile_name, self.format.extension(), &self.search_paths) {
                    let parsed = self.load_file(&path)?;
                    merge_layer(&mut effective, &mut events, "file:profile", parsed);
                }
            }
        }

        if let Some(prefix) = &self.env_prefix {
            merge_layer(&mut effective, &mut events, "env", load_env(prefix));
        }

        merge_layer(&mut effective, &mut events, "cli", self.cli_overrides.clone());

        Ok(ConfigManager { effective, events })
    }

    fn load_file(&self, path: &PathBuf) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
        let contents = read_to_string(path)
            .map_err(|e| ConfigError::ConfigLoadFailed { path: path.clone(), source: Box::new(e) })?;
        self.format.parse(&contents)
    }
}

fn check_unknown_keys(
    parsed: &BTreeMap<String, ConfigValue>,
    known_defaults: &BTreeMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let unknown: Vec<String> = parsed.keys().filter(|key| !known_defaults.contains_key(*key)).cloned().collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ConfigUnknownKeys(unknown))
    }
}

fn merge_layer(
    effective: &mut BTreeMap<String, ConfigValue>,
    events: &mut Vec<ConfigEvent>,
    source: &'static str,
    incoming: BTreeMap<String, ConfigValue>,
) {
    if incoming.is_empty() {
        return;
    }
    let span = tracing::info_span!("config_layer", source);
    let _guard = span.enter();
    let mut added = 0usize;
    let mut overridden = 0usize;
    for (key, value) in incoming {
        if effective.insert(key, value).is_some() {
            overridden += 1;
        } else {
            added += 1;
        }
    }
    tracing::info!(added, overridden, "merged configuration layer");
    events.push(ConfigEvent { source, keys_added: added, keys_overridden: overridden });
}

/// The effective, merged configuration: a flat dotted-key map plus the
/// per-layer trace produced while merging it.
pub struct ConfigManager {
    effective: BTreeMap<String, ConfigValue>,
    events: Vec<ConfigEvent>,
}

impl ConfigManager {
    pub fn events(&self) -> &[ConfigEvent] {
        &self.events
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.effective.get(key)
    }

    /// Deserialize the effective map into `T`, then run its defaulting and
    /// validation hooks.
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + ConfigDefaults + ConfigValidate,
    {
        let tree = dotted_to_json(&self.effective);
        let mut value: T = serde_json::from_value(tree)?;
        value.apply_defaults();
        value.validate()?;
        Ok(value)
    }

    pub(crate) fn namespace_values(&self, namespace: &str) -> BTreeMap<String, ConfigValue> {
        let prefix = format!("{namespace}.");
        self.effective
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| (key[prefix.len()..].to_string(), value.clone()))
            .collect()
    }
}

fn dotted_to_json(map: &BTreeMap<String, ConfigValue>) -> serde_json::Value {
    let mut root = serde_json::Map::new();
    for (key, value) in map {
        insert_dotted(&mut root, key.split('.'), value.to_json());
    }
    serde_json::Value::Object(root)
}

fn insert_dotted(obj: &mut serde_json::Map<String, serde_json::Value>, mut parts: std::str::Split<'_, char>, value: serde_json::Value) {
    let Some(part) = parts.next() else { return };
    if parts.clone().next().is_none() {
        obj.insert(part.to_string(), value);
        return;
    }
    let entry = obj.entry(part.to_string()).or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    if let serde_json::Value::Object(child) = entry {
        insert_dotted(child, parts, value);
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
