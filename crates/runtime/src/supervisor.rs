// SPDX-License-Identifier: MIT
//! Supervises long-lived workers discovered from the registry: restarts with
//! back-off, opens a per-worker circuit breaker on sustained failure, and
//! escalates critical-worker exhaustion to the orchestrator.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use ignite_core::{
    BackoffPolicy, CircuitPolicy, Criticality, ExponentialBackoff, ServiceKey, Worker, WorkerContext, WorkerOptions,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clock::Clock;

const CIRCUIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A worker has escalated past what the supervisor can absorb locally: a
/// `Critical` worker exhausted its restart budget or tripped its circuit.
/// The orchestrator reacts by beginning an ordinary shutdown.
#[derive(Debug, Clone)]
pub struct Escalation {
    pub worker: String,
    pub reason: String,
}

/// Point-in-time view of a single supervised worker, for diagnostics/status
/// endpoints.
#[derive(Debug, Clone, Default)]
pub struct WorkerSnapshot {
    pub name: String,
    pub restart_count: u32,
    pub circuit_open: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct CircuitBreaker {
    policy: CircuitPolicy,
    failures: VecDeque<Instant>,
    state: CircuitState,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    fn new(policy: CircuitPolicy) -> Self {
        Self { policy, failures: VecDeque::new(), state: CircuitState::Closed, opened_at: None }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&front) = self.failures.front() {
            if now.duration_since(front) > self.policy.window {
                self.failures.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a failure, pruning the sliding window first, and report
    /// whether the circuit is open as of this failure. A half-open probe
    /// that fails re-trips immediately rather than counting toward the
    /// window threshold again.
    fn record_failure(&mut self, now: Instant) -> bool {
        self.prune(now);
        self.failures.push_back(now);
        if self.state == CircuitState::HalfOpen {
            self.trip(now);
            return true;
        }
        if self.failures.len() as u32 >= self.policy.threshold {
            self.trip(now);
            return true;
        }
        false
    }

    fn trip(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
    }

    fn record_success(&mut self) {
        self.failures.clear();
        self.state = CircuitState::Closed;
        self.opened_at = None;
    }

    /// Whether an attempt may proceed now, transitioning `Open -> HalfOpen`
    /// once the cool-down has elapsed.
    fn allow_attempt(&mut self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                #[allow(clippy::expect_used)]
                let opened_at = self.opened_at.expect("circuit open without an opened_at timestamp");
                if now.duration_since(opened_at) >= self.policy.cool_down {
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Spawns and restarts workers discovered from the registry.
pub struct WorkerSupervisor {
    clock: Arc<dyn Clock>,
    backoff: Arc<dyn BackoffPolicy>,
}

impl WorkerSupervisor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, backoff: Arc::new(ExponentialBackoff::default()) }
    }

    pub fn with_backoff(mut self, backoff: Arc<dyn BackoffPolicy>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Spawn every discovered worker, expanding `pool_size > 1` into
    /// `name`, `name-1`, .., `name-(n-1)` independent supervised units that
    /// share the same `Arc<dyn Worker>` but restart on their own.
    pub fn spawn_all(
        &self,
        workers: Vec<(ServiceKey, Arc<dyn Worker>, WorkerOptions)>,
        cancellation: &CancellationToken,
    ) -> (Vec<SupervisedHandle>, mpsc::UnboundedReceiver<Escalation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handles = Vec::new();

        for (_key, worker, options) in workers {
            let base_name = worker.name().to_string();
            let pool_size = options.pool_size.max(1);
            for index in 1..=pool_size {
                let instance_name = if pool_size == 1 { base_name.clone() } else { format!("{base_name}-{index}") };
                let token = cancellation.child_token();
                let state = Arc::new(Mutex::new(WorkerSnapshot {
                    name: instance_name.clone(),
                    restart_count: 0,
                    circuit_open: false,
                }));

                let join = tokio::spawn(run_supervised(
                    instance_name.clone(),
                    worker.clone(),
                    options.clone(),
                    self.clock.clone(),
                    self.backoff.clone(),
                    token.clone(),
                    tx.clone(),
                    state.clone(),
                ));

                handles.push(SupervisedHandle {
                    name: instance_name,
                    worker: worker.clone(),
                    cancellation: token,
                    stop_timeout: options.stop_timeout,
                    state,
                    join,
                });
            }
        }

        (handles, rx)
    }
}

/// A single spawned restart unit, returned so the orchestrator can inspect
/// or stop it.
pub struct SupervisedHandle {
    pub name: String,
    worker: Arc<dyn Worker>,
    cancellation: CancellationToken,
    stop_timeout: Duration,
    state: Arc<Mutex<WorkerSnapshot>>,
    join: JoinHandle<()>,
}

impl SupervisedHandle {
    pub fn snapshot(&self) -> WorkerSnapshot {
        self.state.lock().clone()
    }

    /// Invoke the worker's own `stop` hook, cancel its token, and wait for
    /// the supervised task to exit, bounded by its registered stop timeout.
    /// A task that doesn't exit in time is left to finish on its own; the
    /// handle is simply dropped rather than force-aborted.
    pub async fn stop(self) {
        let cx = WorkerContext::new(self.cancellation.clone());
        if let Err(err) = self.worker.stop(cx).await {
            warn!(worker = self.name.as_str(), error = %err, "worker stop hook failed");
        }
        self.cancellation.cancel();
        if tokio::time::timeout(self.stop_timeout, self.join).await.is_err() {
            warn!(worker = self.name.as_str(), "worker did not stop within its timeout");
        }
    }
}

/// Stop every handle concurrently, each bounded by its own stop timeout.
pub async fn stop_all(handles: Vec<SupervisedHandle>) {
    let stops = handles.into_iter().map(SupervisedHandle::stop);
    futures::future::join_all(stops).await;
}

#[allow(clippy::too_many_arguments)]
async fn run_supervised(
    name: String,
    worker: Arc<dyn Worker>,
    options: WorkerOptions,
    clock: Arc<dyn Clock>,
    backoff: Arc<dyn BackoffPolicy>,
    cancellation: CancellationToken,
    escalations: mpsc::UnboundedSender<Escalation>,
    state: Arc<Mutex<WorkerSnapshot>>,
) {
    let mut breaker = CircuitBreaker::new(options.circuit.clone());
    let mut attempt: u32 = 0;

    loop {
        if cancellation.is_cancelled() {
            return;
        }

        if !breaker.allow_attempt(clock.now()) {
            clock.sleep(CIRCUIT_POLL_INTERVAL).await;
            continue;
        }

        let cx = WorkerContext::new(cancellation.clone());
        let outcome = std::panic::AssertUnwindSafe(worker.start(cx)).catch_unwind().await;

        if cancellation.is_cancelled() {
            return;
        }

        let failed = match outcome {
            Ok(Ok(())) => {
                info!(worker = name.as_str(), "worker exited, restarting");
                breaker.record_success();
                attempt = 0;
                false
            }
            Ok(Err(err)) => {
                warn!(worker = name.as_str(), error = %err, "worker returned an error");
                true
            }
            Err(panic) => {
                error!(worker = name.as_str(), message = panic_message(&panic).as_str(), "worker panicked");
                true
            }
        };

        if failed {
            attempt += 1;
            state.lock().restart_count = attempt;

            if breaker.record_failure(clock.now()) {
                state.lock().circuit_open = true;
                warn!(worker = name.as_str(), "circuit opened after repeated failures");
                if options.criticality == Criticality::Critical {
                    let _ = escalations.send(Escalation { worker: name.clone(), reason: "circuit open".to_string() });
                    return;
                }
                clock.sleep(breaker.policy.cool_down).await;
                continue;
            }

            if let Some(max) = options.max_restarts {
                if attempt >= max {
                    warn!(worker = name.as_str(), attempt, "worker exceeded its max restart count");
                    if options.criticality == Criticality::Critical {
                        let _ = escalations
                            .send(Escalation { worker: name.clone(), reason: "max restarts exceeded".to_string() });
                    }
                    return;
                }
            }
        }

        let delay = backoff.delay_for(attempt);
        if !delay.is_zero() {
            clock.sleep(delay).await;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
