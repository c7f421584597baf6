// SPDX-License-Identifier: MIT
//! Assembles `ignite-core`'s registry and `ignite-runtime`'s lifecycle
//! engine and worker supervisor, plus `ignite-config`'s layered
//! configuration, into a single application orchestrator.
//!
//! Most applications only need [`OrchestratorBuilder`] and [`Module`]:
//! register services, attach configuration sources, `build()`, and `run()`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod builder;
#[cfg(feature = "cli")]
pub mod cli;
mod error;
mod module;
mod orchestrator;

pub use builder::OrchestratorBuilder;
pub use error::OrchestratorError;
pub use module::Module;
pub use orchestrator::{AppState, Orchestrator};

pub use ignite_config::{
    format_by_name, ConfigBuilder, ConfigDefaults, ConfigError, ConfigEvent, ConfigFormat, ConfigManager,
    ConfigValidate, ConfigValue, JsonFormat, TomlFormat, YamlFormat,
};
pub use ignite_core::{
    BackoffPolicy, CircuitPolicy, Criticality, ExponentialBackoff, FlagSpec, FlagType, FlagValue, HookContext,
    HookError, HookOutcome, Lifecycle, ProviderConfigMeta, Registration, ResolveContext, Scope, ServiceKey, Worker,
    WorkerContext, WorkerError, WorkerOptions,
};
pub use ignite_runtime::{Clock, LifecycleConfig, ShutdownReport, SupervisorError, WorkerSnapshot};
