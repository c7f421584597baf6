// SPDX-License-Identifier: MIT
//! End-to-end coverage exercising the whole stack together: a registry
//! sealed by `ignite-core`, configuration layered by `ignite-config`, and
//! the lifecycle engine plus worker supervisor driven by `ignite-runtime`,
//! all through the `ignite` facade's `OrchestratorBuilder`.
//!
//! Unit tests in each crate already cover their own subsystem in isolation;
//! these scenarios assert on the seams between them.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use ignite::{
    AppState, CircuitPolicy, Criticality, HookContext, HookError, Lifecycle, OrchestratorBuilder, OrchestratorError,
    Registration, Scope, WorkerOptions,
};
use ignite_core::test_support::{FlakyWorker, RecordingLifecycle};
use ignite_core::ResolveError;
use ignite_runtime::FakeClock;

mod support {
    use super::*;

    /// Wraps a resolved upstream [`RecordingLifecycle`] so a second,
    /// distinctly-typed service can depend on it and record its own
    /// start/stop into the same shared logs — the edge the Graph Engine
    /// needs has to come from an actual `resolve()` call, not from two
    /// same-typed registrations.
    pub struct Downstream {
        name: &'static str,
        _upstream: Arc<RecordingLifecycle>,
        starts: Arc<StdMutex<Vec<&'static str>>>,
        stops: Arc<StdMutex<Vec<&'static str>>>,
    }

    impl Downstream {
        pub fn new(
            name: &'static str,
            upstream: Arc<RecordingLifecycle>,
            starts: Arc<StdMutex<Vec<&'static str>>>,
            stops: Arc<StdMutex<Vec<&'static str>>>,
        ) -> Self {
            Self { name, _upstream: upstream, starts, stops }
        }
    }

    #[async_trait]
    impl Lifecycle for Downstream {
        async fn start(&self, _cx: &HookContext) -> Result<(), HookError> {
            self.starts.lock().unwrap().push(self.name);
            Ok(())
        }

        async fn stop(&self, _cx: &HookContext) -> Result<(), HookError> {
            self.stops.lock().unwrap().push(self.name);
            Ok(())
        }
    }
}

use support::Downstream;

#[tokio::test]
async fn a_dependent_service_starts_after_and_stops_before_the_service_it_resolves() {
    let starts = Arc::new(StdMutex::new(Vec::new()));
    let stops = Arc::new(StdMutex::new(Vec::new()));

    let upstream = RecordingLifecycle::new("upstream", starts.clone(), stops.clone());

    let orchestrator = OrchestratorBuilder::new()
        .register(Registration::<RecordingLifecycle>::value_named("upstream", upstream).with_lifecycle())
        .register(
            Registration::<Downstream>::factory(Scope::Shared, {
                let starts = starts.clone();
                let stops = stops.clone();
                move |cx| {
                    let starts = starts.clone();
                    let stops = stops.clone();
                    async move {
                        let upstream = cx.resolve_named::<RecordingLifecycle>("upstream").await?;
                        Ok(Downstream::new("downstream", upstream, starts, stops))
                    }
                }
            })
            .with_lifecycle(),
        )
        .build()
        .expect("build succeeds with no provider flags and no config file present");

    orchestrator.start().await.expect("start succeeds");
    assert_eq!(orchestrator.state(), AppState::Running);
    assert_eq!(*starts.lock().unwrap(), vec!["upstream", "downstream"]);

    orchestrator.stop().await.expect("stop succeeds");
    assert_eq!(orchestrator.state(), AppState::Stopped);
    assert_eq!(*stops.lock().unwrap(), vec!["downstream", "upstream"]);
}

#[tokio::test]
async fn a_failing_start_hook_rolls_back_only_what_already_started() {
    let starts = Arc::new(StdMutex::new(Vec::new()));
    let stops = Arc::new(StdMutex::new(Vec::new()));

    let upstream = RecordingLifecycle::new("upstream", starts.clone(), stops.clone());
    let failing = RecordingLifecycle::new("failing", starts.clone(), stops.clone()).failing();

    let orchestrator = OrchestratorBuilder::new()
        .register(Registration::<RecordingLifecycle>::value_named("upstream", upstream).with_lifecycle())
        .register(Registration::<RecordingLifecycle>::value_named("failing", failing).with_lifecycle())
        .build()
        .expect("build succeeds");

    let err = orchestrator.start().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::BringUpFailed { .. }));
    assert_eq!(orchestrator.state(), AppState::Failed);

    // Both are independent, layer-0 vertices; only one of them actually
    // started before the other's failure cancelled the layer, so the
    // rollback only ever tears down what came up.
    let started = starts.lock().unwrap().clone();
    let stopped = stops.lock().unwrap().clone();
    assert!(started.contains(&"upstream"));
    assert!(!started.contains(&"failing"));
    assert_eq!(stopped, started);
}

#[tokio::test]
async fn a_three_service_resolve_cycle_fails_start() {
    struct A;
    struct B;
    struct C;

    #[async_trait]
    impl Lifecycle for A {
        async fn start(&self, _cx: &HookContext) -> Result<(), HookError> {
            Ok(())
        }
        async fn stop(&self, _cx: &HookContext) -> Result<(), HookError> {
            Ok(())
        }
    }
    #[async_trait]
    impl Lifecycle for B {
        async fn start(&self, _cx: &HookContext) -> Result<(), HookError> {
            Ok(())
        }
        async fn stop(&self, _cx: &HookContext) -> Result<(), HookError> {
            Ok(())
        }
    }
    #[async_trait]
    impl Lifecycle for C {
        async fn start(&self, _cx: &HookContext) -> Result<(), HookError> {
            Ok(())
        }
        async fn stop(&self, _cx: &HookContext) -> Result<(), HookError> {
            Ok(())
        }
    }

    let orchestrator = OrchestratorBuilder::new()
        .register(
            Registration::<A>::factory(Scope::Shared, |cx| async move {
                cx.resolve::<B>().await?;
                Ok(A)
            })
            .with_lifecycle(),
        )
        .register(
            Registration::<B>::factory(Scope::Shared, |cx| async move {
                cx.resolve::<C>().await?;
                Ok(B)
            })
            .with_lifecycle(),
        )
        .register(
            Registration::<C>::factory(Scope::Shared, |cx| async move {
                cx.resolve::<A>().await?;
                Ok(C)
            })
            .with_lifecycle(),
        )
        .build()
        .expect("build only registers and loads configuration, so a construction cycle among services does not surface until start() resolves them");

    let err = orchestrator.start().await.unwrap_err();
    match err {
        OrchestratorError::Resolve(ResolveError::CycleDetected(path)) => {
            assert!(path.len() >= 3, "cycle path should name every participant: {path:?}");
        }
        other => panic!("expected a resolve cycle, got {other:?}"),
    }
    assert_eq!(orchestrator.state(), AppState::Failed);
}

#[tokio::test]
async fn a_critical_worker_that_trips_its_circuit_escalates_and_the_rest_of_the_graph_still_stops_cleanly() {
    let starts = Arc::new(StdMutex::new(Vec::new()));
    let stops = Arc::new(StdMutex::new(Vec::new()));
    let bystander = RecordingLifecycle::new("bystander", starts.clone(), stops.clone());

    let worker = FlakyWorker::new("always-fails", usize::MAX);
    let options = WorkerOptions {
        criticality: Criticality::Critical,
        circuit: CircuitPolicy { threshold: 2, ..CircuitPolicy::default() },
        ..WorkerOptions::default()
    };

    let orchestrator = OrchestratorBuilder::new()
        .clock(Arc::new(FakeClock::new()))
        .register(Registration::<RecordingLifecycle>::value_named("bystander", bystander).with_lifecycle())
        .register(Registration::<FlakyWorker>::value(worker).as_worker(options))
        .build()
        .expect("build succeeds");

    orchestrator.start().await.expect("start succeeds");
    assert_eq!(*starts.lock().unwrap(), vec!["bystander"]);

    // Let the supervised task fail twice, trip its threshold-2 circuit, and
    // escalate, all before we call stop().
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }

    let snapshot = orchestrator.worker_snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].circuit_open);

    let err = orchestrator.stop().await.unwrap_err();
    match err {
        OrchestratorError::WorkerEscalated { shutdown, .. } => {
            assert!(shutdown.is_clean(), "the bystander's own stop hook should still complete cleanly");
        }
        other => panic!("expected a worker escalation, got {other:?}"),
    }
    assert_eq!(orchestrator.state(), AppState::Stopped);
    assert_eq!(*stops.lock().unwrap(), vec!["bystander"]);
}

#[tokio::test]
async fn a_non_critical_worker_opens_its_circuit_without_escalating() {
    let worker = FlakyWorker::new("always-fails", usize::MAX);
    let options = WorkerOptions {
        criticality: Criticality::NonCritical,
        circuit: CircuitPolicy { threshold: 2, ..CircuitPolicy::default() },
        ..WorkerOptions::default()
    };

    let orchestrator = OrchestratorBuilder::new()
        .clock(Arc::new(FakeClock::new()))
        .register(Registration::<FlakyWorker>::value(worker).as_worker(options))
        .build()
        .expect("build succeeds");

    orchestrator.start().await.expect("start succeeds");
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }

    let snapshot = orchestrator.worker_snapshot().await;
    assert!(snapshot[0].circuit_open);
    assert!(snapshot[0].restart_count >= 2);

    orchestrator.stop().await.expect("a non-critical worker's open circuit never escalates, so stop succeeds");
    assert_eq!(orchestrator.state(), AppState::Stopped);
}

mod config_layering {
    use ignite_config::{ConfigBuilder, ConfigDefaults, ConfigValidate, ConfigValue};
    use serde::Deserialize;
    use serial_test::serial;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, Default)]
    struct ServerSettings {
        #[serde(default)]
        host: String,
        #[serde(default)]
        port: i64,
        #[serde(default)]
        workers: i64,
    }

    impl ConfigDefaults for ServerSettings {}
    impl ConfigValidate for ServerSettings {}

    #[tokio::test]
    #[serial(ignite_env)]
    async fn file_profile_and_env_layers_merge_in_ascending_precedence() {
        let dir = tempdir().expect("create temp config dir");
        std::fs::write(
            dir.path().join("app.toml"),
            "host = \"localhost\"\nport = 8080\nworkers = 4\n",
        )
        .expect("write base config file");
        std::fs::write(dir.path().join("app.staging.toml"), "port = 9090\n").expect("write profile overlay");

        std::env::set_var("IGNITE_SPECS_TEST_WORKERS", "16");

        let manager = ConfigBuilder::new()
            .type_name("toml")
            .name("app")
            .search_paths(vec![dir.path().to_path_buf()])
            .profile("staging")
            .env_prefix("IGNITE_SPECS_TEST")
            .build()
            .expect("layered build succeeds");

        std::env::remove_var("IGNITE_SPECS_TEST_WORKERS");

        let settings: ServerSettings = manager.bind().expect("bind succeeds");
        assert_eq!(settings.host, "localhost", "untouched by the profile or env layer, so the file value survives");
        assert_eq!(settings.port, 9090, "the profile overlay outranks the base file");
        assert_eq!(settings.workers, 16, "the environment layer outranks both file layers");

        let sources: Vec<&str> = manager.events().iter().map(|event| event.source).collect();
        assert_eq!(sources, vec!["file", "file:profile", "env"]);
    }

    #[tokio::test]
    #[serial(ignite_env)]
    async fn an_explicit_profile_env_variable_selects_the_overlay_when_no_profile_is_named() {
        let dir = tempdir().expect("create temp config dir");
        std::fs::write(dir.path().join("app.toml"), "port = 1\n").expect("write base config file");
        std::fs::write(dir.path().join("app.canary.toml"), "port = 2\n").expect("write profile overlay");

        std::env::set_var("IGNITE_SPECS_TEST_PROFILE", "canary");
        let manager = ConfigBuilder::new()
            .type_name("toml")
            .name("app")
            .search_paths(vec![dir.path().to_path_buf()])
            .profile_env("IGNITE_SPECS_TEST_PROFILE")
            .build()
            .expect("layered build succeeds");
        std::env::remove_var("IGNITE_SPECS_TEST_PROFILE");

        assert_eq!(manager.get("port"), Some(&ConfigValue::Int(2)));
    }

    #[test]
    fn strict_mode_rejects_an_unknown_key_in_the_file_layer() {
        let dir = tempdir().expect("create temp config dir");
        std::fs::write(dir.path().join("app.toml"), "typo_key = 1\n").expect("write base config file");

        let err = ConfigBuilder::new()
            .type_name("toml")
            .name("app")
            .search_paths(vec![dir.path().to_path_buf()])
            .default_value("port", ConfigValue::Int(80))
            .strict(true)
            .build()
            .unwrap_err();

        assert!(matches!(err, ignite_config::ConfigError::ConfigUnknownKeys(_)));
    }

    #[tokio::test]
    #[serial(ignite_env)]
    async fn yaml_base_and_prod_profile_selected_by_app_env_resolve_to_prod_host() {
        let dir = tempdir().expect("create temp config dir");
        std::fs::write(dir.path().join("config.yaml"), "host: base-host\nport: 8080\n").expect("write base file");
        std::fs::write(dir.path().join("config.prod.yaml"), "host: prod-host\n").expect("write profile overlay");

        std::env::set_var("APP_ENV", "prod");
        let manager = ConfigBuilder::new()
            .search_paths(vec![dir.path().to_path_buf()])
            .profile_env("APP_ENV")
            .build()
            .expect("layered build succeeds");
        std::env::remove_var("APP_ENV");

        assert_eq!(manager.get("host"), Some(&ConfigValue::String("prod-host".to_string())));
        assert_eq!(manager.get("port"), Some(&ConfigValue::Int(8080)));
    }
}

mod provider_flags {
    use clap::Command;
    use ignite_config::{ConfigBuilder, FlagRegistry};
    use ignite_core::{FlagSpec, FlagValue, ProviderConfigMeta, Registration, Registry};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default)]
    struct ServerSettings {
        server: ServerSection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct ServerSection {
        #[serde(default)]
        host: String,
        #[serde(default)]
        port: i64,
    }

    impl ignite_config::ConfigDefaults for ServerSettings {}
    impl ignite_config::ConfigValidate for ServerSettings {}

    fn declare_server_flags() -> ProviderConfigMeta {
        ProviderConfigMeta::new("server")
            .with_flag(FlagSpec::new("host", FlagValue::String("localhost".to_string()), "listen host"))
            .with_flag(FlagSpec::new("port", FlagValue::Int(8080), "listen port"))
    }

    #[test]
    fn an_explicit_cli_flag_overrides_the_providers_own_default_while_the_other_flag_keeps_it() {
        let registry = Registry::new();
        registry
            .register(Registration::<()>::value(()).provider_config(declare_server_flags()))
            .expect("register the flag-declaring provider");
        let sealed = registry.seal();
        let flags = FlagRegistry::collect(&sealed);
        assert!(!flags.is_empty());

        let command = flags.register_on(Command::new("demo"));
        let matches = command
            .try_get_matches_from(["demo", "--server-port", "9090"])
            .expect("clap accepts the declared --server-port flag");

        let builder =
            flags.apply_matches(flags.apply_defaults(ConfigBuilder::new().search_paths(Vec::new())), &matches);
        let manager = builder.build().expect("build succeeds with no file on disk");
        let settings: ServerSettings = manager.bind().expect("bind succeeds");

        assert_eq!(settings.server.port, 9090, "the flag the caller actually passed wins");
        assert_eq!(settings.server.host, "localhost", "an unpassed flag falls back to its declared default");
    }
}
