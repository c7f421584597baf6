// SPDX-License-Identifier: MIT
//! Collects provider-declared configuration namespaces and flags, and binds
//! the results back into the configuration manager and, when a CLI host is
//! attached, a `clap::Command`.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use ignite_core::{FlagSpec, FlagType, SealedRegistry};

use crate::builder::ConfigBuilder;
use crate::value::ConfigValue;

/// The typed accessor a provider uses to read the values bound to its
/// declared namespace.
pub struct ProviderValues {
    values: BTreeMap<String, ConfigValue>,
}

impl ProviderValues {
    pub(crate) fn new(values: BTreeMap<String, ConfigValue>) -> Self {
        Self { values }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(ConfigValue::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(ConfigValue::as_i64)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(ConfigValue::as_bool)
    }

    pub fn duration(&self, key: &str) -> Option<Duration> {
        self.values.get(key).and_then(ConfigValue::as_duration)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(ConfigValue::as_f64)
    }
}

/// Every provider-declared namespace/flag pair, deduplicated by flag name on
/// first sight: duplicate registrations from a second provider silently lose
/// so multi-provider composition never needs central coordination.
pub struct FlagRegistry {
    declarations: Vec<(String, FlagSpec)>,
}

impl FlagRegistry {
    pub fn collect(registry: &SealedRegistry) -> Self {
        let mut seen = HashSet::new();
        let mut declarations = Vec::new();
        for descriptor in registry.iter() {
            let Some(meta) = descriptor.provider_config() else { continue };
            for flag in &meta.flags {
                let name = flag.flag_name(&meta.namespace);
                if !seen.insert(name) {
                    continue;
                }
                declarations.push((meta.namespace.clone(), flag.clone()));
            }
        }
        Self { declarations }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Merge every flag's default into the builder's programmatic-defaults
    /// tier. A default only ever surfaces when the caller did not supply the
    /// flag and no higher-precedence layer set the same key.
    pub fn apply_defaults(&self, mut builder: ConfigBuilder) -> ConfigBuilder {
        for (namespace, flag) in &self.declarations {
            builder = builder.default_value(flag.dotted_key(namespace), ConfigValue::from(flag.default.clone()));
        }
        builder
    }

    pub fn provider_values(&self, manager: &crate::builder::ConfigManager, namespace: &str) -> ProviderValues {
        ProviderValues::new(manager.namespace_values(namespace))
    }
}

#[cfg(feature = "cli")]
mod cli {
    use super::*;

    impl FlagRegistry {
        /// Register every declared flag on a host `clap::Command`.
        pub fn register_on(&self, command: clap::Command) -> clap::Command {
            let mut command = command;
            for (namespace, flag) in &self.declarations {
                command = command.arg(arg_for(namespace, flag));
            }
            command
        }

        /// Read only the flags the caller actually supplied on the command
        /// line and merge them into the builder's CLI tier. An unsupplied
        /// flag's default already entered the defaults tier via
        /// [`FlagRegistry::apply_defaults`]; re-reading clap's own default
        /// here would double-count it at the wrong precedence.
        pub fn apply_matches(&self, mut builder: ConfigBuilder, matches: &clap::ArgMatches) -> ConfigBuilder {
            for (namespace, flag) in &self.declarations {
                let id = flag.flag_name(namespace);
                if matches.value_source(&id) != Some(clap::parser::ValueSource::CommandLine) {
                    continue;
                }
                if let Some(value) = read_matched(matches, &id, flag.default.kind()) {
                    builder = builder.cli_override(flag.dotted_key(namespace), value);
                }
            }
            builder
        }
    }

    fn arg_for(namespace: &str, flag: &FlagSpec) -> clap::Arg {
        let id = flag.flag_name(namespace);
        let help = flag.help.clone();
        match &flag.default {
            ignite_core::FlagValue::String(s) => {
                clap::Arg::new(id.clone()).long(leak(id)).help(help).default_value(leak(s.clone()))
            }
            ignite_core::FlagValue::Int(i) => clap::Arg::new(id.clone())
                .long(leak(id))
                .help(help)
                .value_parser(clap::value_parser!(i64))
                .default_value(leak(i.to_string())),
            ignite_core::FlagValue::Bool(b) => clap::Arg::new(id.clone())
                .long(leak(id))
                .help(help)
                .num_args(0..=1)
                .value_parser(clap::value_parser!(bool))
                .default_value(leak(b.to_string()))
                .default_missing_value("true"),
            ignite_core::FlagValue::Duration(d) => clap::Arg::new(id.clone())
                .long(leak(id))
                .help(format!("{help} (seconds)"))
                .value_parser(clap::value_parser!(u64))
                .default_value(leak(d.as_secs().to_string())),
            ignite_core::FlagValue::Float(f) => clap::Arg::new(id.clone())
                .long(leak(id))
                .help(help)
                .value_parser(clap::value_parser!(f64))
                .default_value(leak(f.to_string())),
        }
    }

    fn read_matched(matches: &clap::ArgMatches, id: &str, kind: FlagType) -> Option<ConfigValue> {
        match kind {
            FlagType::String => matches.get_one::<String>(id).cloned().map(ConfigValue::String),
            FlagType::Int => matches.get_one::<i64>(id).copied().map(ConfigValue::Int),
            FlagType::Bool => matches.get_one::<bool>(id).copied().map(ConfigValue::Bool),
            FlagType::Duration => matches.get_one::<u64>(id).copied().map(|secs| ConfigValue::Duration(Duration::from_secs(secs))),
            FlagType::Float => matches.get_one::<f64>(id).copied().map(ConfigValue::Float),
        }
    }

    /// Flag metadata is derived at runtime from provider declarations, so
    /// clap's `'static` string requirements need an owned string promoted to
    /// a leaked, process-lifetime slice. Flags are registered once, at
    /// bring-up, so the leak is bounded by the number of declared flags.
    fn leak(s: impl Into<String>) -> &'static str {
        Box::leak(s.into().into_boxed_str())
    }
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
