// SPDX-License-Identifier: MIT

use ignite_core::test_support::FlakyWorker;

use super::*;
use crate::clock::FakeClock;

fn options(criticality: Criticality, circuit: CircuitPolicy) -> WorkerOptions {
    WorkerOptions { criticality, max_restarts: None, circuit, stop_timeout: Duration::from_secs(1), pool_size: 1 }
}

#[tokio::test]
async fn a_worker_that_fails_twice_then_runs_is_restarted_with_backoff() {
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let supervisor = WorkerSupervisor::new(clock);
    let worker: Arc<dyn Worker> = Arc::new(FlakyWorker::new("flaky", 2));
    let opts = options(Criticality::NonCritical, CircuitPolicy { threshold: 10, ..Default::default() });

    let cancellation = CancellationToken::new();
    let (mut handles, _escalations) = supervisor.spawn_all(vec![(ServiceKey::named::<()>("flaky"), worker, opts)], &cancellation);

    // Give the supervised task enough real yields to fail twice and then
    // settle into its long-running (cancellation-await) third attempt.
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    let handle = handles.pop().unwrap();
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.restart_count, 2);
    assert!(!snapshot.circuit_open);

    handle.stop().await;
}

#[tokio::test]
async fn a_critical_worker_opens_its_circuit_after_the_threshold_and_escalates() {
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let supervisor = WorkerSupervisor::new(clock);
    let worker: Arc<dyn Worker> = Arc::new(FlakyWorker::new("always-fails", usize::MAX));
    let opts = options(Criticality::Critical, CircuitPolicy { threshold: 3, ..Default::default() });

    let cancellation = CancellationToken::new();
    let (mut handles, mut escalations) =
        supervisor.spawn_all(vec![(ServiceKey::named::<()>("always-fails"), worker, opts)], &cancellation);

    let escalation = escalations.recv().await.expect("supervisor should escalate once the circuit opens");
    assert_eq!(escalation.worker, "always-fails");

    let handle = handles.pop().unwrap();
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.restart_count, 3);
    assert!(snapshot.circuit_open);
}

#[tokio::test]
async fn pool_size_expands_into_independently_named_instances() {
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let supervisor = WorkerSupervisor::new(clock);
    let worker: Arc<dyn Worker> = Arc::new(FlakyWorker::new("pooled", 0));
    let mut opts = options(Criticality::NonCritical, CircuitPolicy::default());
    opts.pool_size = 3;

    let cancellation = CancellationToken::new();
    let (handles, _escalations) =
        supervisor.spawn_all(vec![(ServiceKey::named::<()>("pooled"), worker, opts)], &cancellation);

    let mut names: Vec<String> = handles.iter().map(|h| h.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["pooled-1", "pooled-2", "pooled-3"]);

    stop_all(handles).await;
}
