// SPDX-License-Identifier: MIT

use std::sync::Mutex as StdMutex;

use ignite_core::test_support::{FlakyWorker, RecordingLifecycle};
use ignite_core::{CircuitPolicy, Criticality, Registration, WorkerOptions};
use ignite_runtime::FakeClock;

use super::*;
use crate::builder::OrchestratorBuilder;

#[tokio::test]
async fn start_runs_lifecycle_hooks_and_stop_runs_them_in_reverse() {
    let starts = Arc::new(StdMutex::new(Vec::new()));
    let stops = Arc::new(StdMutex::new(Vec::new()));

    let upstream = RecordingLifecycle::new("upstream", starts.clone(), stops.clone());
    let downstream = RecordingLifecycle::new("downstream", starts.clone(), stops.clone());

    let orchestrator = OrchestratorBuilder::new()
        .register(Registration::<RecordingLifecycle>::value_named("upstream", upstream).with_lifecycle())
        .register(Registration::<RecordingLifecycle>::value_named("downstream", downstream).with_lifecycle())
        .build()
        .expect("build succeeds");

    orchestrator.start().await.expect("start succeeds");
    assert_eq!(orchestrator.state(), AppState::Running);

    orchestrator.stop().await.expect("stop succeeds");
    assert_eq!(orchestrator.state(), AppState::Stopped);

    let started = starts.lock().unwrap().clone();
    let stopped = stops.lock().unwrap().clone();
    assert_eq!(started.len(), 2);
    assert_eq!(stopped, started.into_iter().rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn starting_twice_fails_with_already_started() {
    let orchestrator = OrchestratorBuilder::new().build().expect("build succeeds");
    orchestrator.start().await.expect("first start succeeds");
    let err = orchestrator.start().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::AlreadyStarted));
    orchestrator.stop().await.expect("stop succeeds");
}

#[tokio::test]
async fn a_critical_worker_that_opens_its_circuit_surfaces_through_stop() {
    let worker = FlakyWorker::new("flaky", usize::MAX);
    let options = WorkerOptions {
        criticality: Criticality::Critical,
        max_restarts: None,
        circuit: CircuitPolicy { threshold: 1, ..CircuitPolicy::default() },
        ..WorkerOptions::default()
    };

    let orchestrator = OrchestratorBuilder::new()
        .clock(Arc::new(FakeClock::new()))
        .register(Registration::<FlakyWorker>::value(worker).as_worker(options))
        .build()
        .expect("build succeeds");

    orchestrator.start().await.expect("start succeeds");

    // Let the supervised task actually run: it fails its first attempt,
    // trips the threshold-1 circuit, and escalates before we ever call
    // `stop()`.
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }

    let err = orchestrator.stop().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::WorkerEscalated { .. }));
    assert_eq!(orchestrator.state(), AppState::Stopped);
}

#[tokio::test]
async fn stopping_before_starting_fails_with_not_started() {
    let orchestrator = OrchestratorBuilder::new().build().expect("build succeeds");
    let err = orchestrator.stop().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotStarted));
}
