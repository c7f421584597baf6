// SPDX-License-Identifier: MIT
//! The fluent builder that assembles services, modules, and configuration
//! into a sealed, config-loaded [`crate::Orchestrator`] (§4.8.1).

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use ignite_config::{ConfigBuilder, ConfigDefaults, ConfigManager, ConfigValidate, FlagRegistry};
use ignite_core::{Registration, Registry, ResolveError, Scope, ServiceKey};
use ignite_runtime::{Clock, LifecycleConfig, SystemClock};
use serde::de::DeserializeOwned;

use crate::error::OrchestratorError;
use crate::module::Module;
use crate::orchestrator::Orchestrator;

type RegistrationFn = Box<dyn FnOnce(&Registry) -> Result<(), ignite_core::RegistryError> + Send>;

/// Builds an [`Orchestrator`]: register descriptors and modules, attach a
/// configuration layer and (optionally) a CLI host, then `build()`.
pub struct OrchestratorBuilder {
    root_registrations: Vec<RegistrationFn>,
    modules: Vec<Module>,
    config: ConfigBuilder,
    config_cell: Arc<OnceLock<Arc<ConfigManager>>>,
    lifecycle_config: LifecycleConfig,
    clock: Arc<dyn Clock>,
    #[cfg(feature = "cli")]
    cli: Option<clap::Command>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            root_registrations: Vec::new(),
            modules: Vec::new(),
            config: ConfigBuilder::new(),
            config_cell: Arc::new(OnceLock::new()),
            lifecycle_config: LifecycleConfig::default(),
            clock: Arc::new(SystemClock),
            #[cfg(feature = "cli")]
            cli: None,
        }
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single descriptor directly, outside any named module.
    pub fn register<T: Send + Sync + 'static>(mut self, registration: Registration<T>) -> Self {
        self.root_registrations.push(Box::new(move |registry| registry.register(registration)));
        self
    }

    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// Bind the effective configuration into `T` and make it resolvable by
    /// providers via `cx.resolve::<T>()`. Registered as `eager-shared`: the
    /// bind happens lazily, the first time the graph asks for it during
    /// eager resolution, by which point `build()` has already loaded
    /// configuration into the shared cell this closure reads from — the
    /// registry itself must accept the registration before `seal()`, so the
    /// descriptor captures the (still-empty) cell rather than a value.
    pub fn with_config<T>(mut self) -> Self
    where
        T: DeserializeOwned + ConfigDefaults + ConfigValidate + Send + Sync + 'static,
    {
        let cell = self.config_cell.clone();
        self.root_registrations.push(Box::new(move |registry| {
            registry.register(Registration::<T>::factory(Scope::EagerShared, move |_cx| {
                let cell = cell.clone();
                async move {
                    #[allow(clippy::expect_used)]
                    let manager = cell.get().expect("configuration manager not loaded before resolution").clone();
                    manager.bind::<T>().map_err(|source| ResolveError::ProviderFailed {
                        key: ServiceKey::of::<T>(),
                        source: Box::new(source),
                    })
                }
            }))
        }));
        self
    }

    pub fn config_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.name(name);
        self
    }

    pub fn search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config = self.config.search_paths(paths);
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config = self.config.env_prefix(prefix);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config = self.config.profile(profile);
        self
    }

    pub fn profile_env(mut self, var: impl Into<String>) -> Self {
        self.config = self.config.profile_env(var);
        self
    }

    pub fn config_strict(mut self, strict: bool) -> Self {
        self.config = self.config.strict(strict);
        self
    }

    pub fn lifecycle_config(mut self, config: LifecycleConfig) -> Self {
        self.lifecycle_config = config;
        self
    }

    /// Override the clock used by the lifecycle engine and worker
    /// supervisor. Application code has no reason to call this; it exists
    /// for deterministic tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(feature = "cli")]
    pub fn attach_cli(mut self, command: clap::Command) -> Self {
        self.cli = Some(command);
        self
    }

    pub fn build(self) -> Result<Orchestrator, OrchestratorError> {
        let registry = Registry::new();
        let mut seen = HashSet::new();
        for module in self.modules {
            module.apply(&registry, &mut seen)?;
        }
        for registration in self.root_registrations {
            registration(&registry)?;
        }

        let sealed = registry.seal();
        let flags = FlagRegistry::collect(&sealed);

        #[cfg(feature = "cli")]
        let config_builder = match self.cli {
            Some(command) => apply_cli(command, self.config, &flags),
            None => flags.apply_defaults(self.config),
        };
        #[cfg(not(feature = "cli"))]
        let config_builder = flags.apply_defaults(self.config);

        let manager = Arc::new(config_builder.build()?);
        let _ = self.config_cell.set(manager.clone());

        Ok(Orchestrator::new(sealed, manager, self.lifecycle_config, self.clock))
    }
}

#[cfg(feature = "cli")]
fn apply_cli(command: clap::Command, config: ConfigBuilder, flags: &FlagRegistry) -> ConfigBuilder {
    let command = crate::cli::with_global_flags(command);
    let command = flags.register_on(command);
    let matches = command.get_matches();
    let global = crate::cli::parse_global_options(&matches);

    let mut config = flags.apply_defaults(config);
    if let Some(path) = &global.config {
        config = config.explicit_path(path.clone());
    }
    if let Some(prefix) = &global.env_prefix {
        config = config.env_prefix(prefix.clone());
    }
    if global.config_strict {
        config = config.strict(true);
    }
    flags.apply_matches(config, &matches)
}
