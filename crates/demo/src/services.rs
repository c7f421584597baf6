// SPDX-License-Identifier: MIT
//! The handful of illustrative services this demo wires into the
//! orchestrator: one config-backed value, one provider declaring flags in
//! its own namespace, one lifecycle-bearing service that depends on the
//! bound configuration, and one supervised worker.

use std::time::Duration;

use async_trait::async_trait;
use ignite::{
    ConfigDefaults, ConfigValidate, FlagSpec, FlagValue, HookContext, HookError, Lifecycle, ProviderConfigMeta,
    WorkerContext, WorkerError,
};
use serde::Deserialize;
use tracing::info;

/// Bound from the `server.*` namespace once the configuration layer has
/// loaded — see `ServerFlags` below for the flag declarations that feed it.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ServerSettings {
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: i64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> i64 {
    8080
}

impl ConfigDefaults for ServerSettings {}

impl ConfigValidate for ServerSettings {
    fn validate(&self) -> Result<(), ignite::ConfigError> {
        if self.server.port == 0 {
            return Err(ignite::ConfigError::ConfigInvalid("server.port must be nonzero".to_string()));
        }
        Ok(())
    }
}

/// A marker type carrying no behavior of its own; its only purpose is to
/// give the `server` namespace's flag declarations a descriptor to live on
/// so the provider-config binder (§4.7) discovers them during `build()`.
pub struct ServerFlags;

impl ServerFlags {
    pub fn declarations() -> ProviderConfigMeta {
        ProviderConfigMeta::new("server")
            .with_flag(FlagSpec::new("host", FlagValue::String("localhost".to_string()), "listen host"))
            .with_flag(FlagSpec::new("port", FlagValue::Int(8080), "listen port"))
    }
}

/// Logs a banner on start naming the bound server address, and a farewell
/// on stop. Depends on `ServerSettings`, so the graph engine places it one
/// layer above the config bind.
pub struct Greeter {
    settings: std::sync::Arc<ServerSettings>,
}

impl Greeter {
    pub fn new(settings: std::sync::Arc<ServerSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Lifecycle for Greeter {
    async fn start(&self, _cx: &HookContext) -> Result<(), HookError> {
        info!(host = self.settings.server.host.as_str(), port = self.settings.server.port, "greeter starting up");
        Ok(())
    }

    async fn stop(&self, _cx: &HookContext) -> Result<(), HookError> {
        info!("greeter shutting down");
        Ok(())
    }
}

/// Ticks every `interval` until cancelled, demonstrating the worker
/// supervisor's discovery and shutdown-ordering guarantees (§4.5): it
/// starts after every service hook completes and stops before any of them
/// begin tearing down.
pub struct HeartbeatWorker {
    interval: Duration,
}

impl HeartbeatWorker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl ignite::Worker for HeartbeatWorker {
    fn name(&self) -> &str {
        "heartbeat"
    }

    async fn start(&self, cx: WorkerContext) -> Result<(), WorkerError> {
        let mut ticks = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cx.cancellation().cancelled() => return Ok(()),
                _ = ticks.tick() => info!("heartbeat"),
            }
        }
    }
}
