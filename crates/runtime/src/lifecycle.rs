// SPDX-License-Identifier: MIT
//! Drives start/stop hooks across the layered dependency graph (§4.4).
//!
//! Start-up walks layers forward, running every hook in a layer
//! concurrently and blocking until the layer completes or a hook fails;
//! shutdown walks layers in reverse, tolerating failures and laggards so the
//! rest of the graph still gets a chance to stop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ignite_core::{HookContext, HookOutcome, Layers, Lifecycle, ServiceKey};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::LifecycleError;

/// Timeouts governing a single bring-up/shutdown pass.
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Per-hook deadline during start-up; exceeding it produces `StartTimeout`.
    pub start_hook_timeout: Duration,
    /// Per-hook soft deadline during shutdown; exceeding it marks the hook a
    /// laggard but does not abort it.
    pub stop_hook_soft_deadline: Duration,
    /// Total wall-clock budget for an entire shutdown pass.
    pub total_shutdown_budget: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_hook_timeout: Duration::from_secs(30),
            stop_hook_soft_deadline: Duration::from_secs(5),
            total_shutdown_budget: Duration::from_secs(30),
        }
    }
}

/// Per-hook terminal outcome plus how long it took, aggregated across a
/// shutdown pass — the "single aggregated error object" §7 calls for.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub outcomes: Vec<(ServiceKey, HookOutcome, Duration)>,
    /// Hooks that exceeded their soft deadline (still ran to completion,
    /// just slowly) or were abandoned when the total budget ran out.
    pub laggards: Vec<ServiceKey>,
    /// Hooks still in flight when the total shutdown budget expired.
    pub abandoned: Vec<ServiceKey>,
}

impl ShutdownReport {
    fn record(&mut self, key: ServiceKey, outcome: HookOutcome, elapsed: Duration, soft_deadline: Duration) {
        if elapsed > soft_deadline {
            self.laggards.push(key.clone());
        }
        self.outcomes.push((key, outcome, elapsed));
    }

    fn mark_abandoned(&mut self, key: ServiceKey) {
        self.abandoned.push(key.clone());
        self.laggards.push(key.clone());
        self.outcomes.push((key, HookOutcome::TimedOut, Duration::ZERO));
    }

    fn already_recorded(&self, key: &ServiceKey) -> bool {
        self.outcomes.iter().any(|(k, _, _)| k == key)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|(_, outcome, _)| !outcome.is_ok())
    }

    pub fn is_clean(&self) -> bool {
        !self.has_failures() && self.laggards.is_empty()
    }

    fn merge(&mut self, mut other: ShutdownReport) {
        self.outcomes.append(&mut other.outcomes);
        self.laggards.append(&mut other.laggards);
        self.abandoned.append(&mut other.abandoned);
    }
}

/// The failure that aborted a bring-up, plus the report from rolling back
/// whatever had already started.
#[derive(Debug)]
pub struct BringUpFailure {
    pub cause: LifecycleError,
    pub rollback: ShutdownReport,
}

type HandleMap = HashMap<ServiceKey, Arc<dyn Lifecycle>>;

/// Drives a single [`Layers`] graph's start/stop hooks.
pub struct LifecycleEngine {
    config: LifecycleConfig,
    clock: Arc<dyn Clock>,
}

impl LifecycleEngine {
    pub fn new(config: LifecycleConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Run start hooks forward, layer by layer. On any failure, already
    /// -started hooks are stopped in reverse completion order and the
    /// failure plus rollback report are returned together.
    pub async fn start(
        &self,
        layers: &Layers,
        handles: &HandleMap,
        cancellation: &CancellationToken,
    ) -> Result<Vec<ServiceKey>, BringUpFailure> {
        let mut started: Vec<ServiceKey> = Vec::new();

        for layer in layers.forward() {
            let layer_token = cancellation.child_token();
            let mut set: JoinSet<(ServiceKey, Result<Result<(), ignite_core::HookError>, tokio::time::error::Elapsed>)> =
                JoinSet::new();

            for key in layer {
                #[allow(clippy::expect_used)]
                let lifecycle = handles.get(key).cloned().expect("lifecycle handle missing for layered key");
                let key = key.clone();
                let deadline = self.config.start_hook_timeout;
                let hook_cx = HookContext::new(layer_token.clone(), deadline);
                set.spawn(async move {
                    let result = tokio::time::timeout(deadline, lifecycle.start(&hook_cx)).await;
                    (key, result)
                });
            }

            let mut failure = None;
            while let Some(joined) = set.join_next().await {
                #[allow(clippy::expect_used)]
                let (key, result) = joined.expect("start hook task panicked unexpectedly");
                match result {
                    Ok(Ok(())) => {
                        info!(service = key.as_str(), "start hook completed");
                        started.push(key);
                    }
                    Ok(Err(source)) => {
                        warn!(service = key.as_str(), error = %source, "start hook failed");
                        if failure.is_none() {
                            failure = Some(LifecycleError::HookFailed { key, source });
                        }
                        layer_token.cancel();
                    }
                    Err(_elapsed) => {
                        warn!(service = key.as_str(), "start hook timed out");
                        if failure.is_none() {
                            failure = Some(LifecycleError::StartTimeout { key, elapsed: self.config.start_hook_timeout });
                        }
                        layer_token.cancel();
                    }
                }
            }

            if let Some(cause) = failure {
                let rollback = self.stop_reverse_completion_order(&started, handles, cancellation).await;
                return Err(BringUpFailure { cause, rollback });
            }
        }

        Ok(started)
    }

    /// Shutdown path used by the orchestrator: walk layers in reverse,
    /// running each layer's stop hooks concurrently, bounded by the total
    /// shutdown budget.
    pub async fn stop(&self, layers: &Layers, handles: &HandleMap, cancellation: &CancellationToken) -> ShutdownReport {
        let deadline = self.clock.now() + self.config.total_shutdown_budget;
        let mut report = ShutdownReport::default();

        for layer in layers.reverse() {
            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining.is_zero() {
                for key in layer {
                    report.mark_abandoned(key.clone());
                }
                continue;
            }
            let layer_report = self.run_stop_layer(layer, handles, cancellation, remaining).await;
            report.merge(layer_report);
        }

        report
    }

    /// Rollback path used when start-up itself fails: stop only the hooks
    /// that actually started, in reverse order of *completion* (not layer
    /// order, since a failed layer may have only partially started).
    async fn stop_reverse_completion_order(
        &self,
        started: &[ServiceKey],
        handles: &HandleMap,
        cancellation: &CancellationToken,
    ) -> ShutdownReport {
        let deadline = self.clock.now() + self.config.total_shutdown_budget;
        let mut report = ShutdownReport::default();

        for key in started.iter().rev() {
            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining.is_zero() {
                report.mark_abandoned(key.clone());
                continue;
            }
            let layer_report = self.run_stop_layer(std::slice::from_ref(key), handles, cancellation, remaining).await;
            report.merge(layer_report);
        }

        report
    }

    async fn run_stop_layer(
        &self,
        layer: &[ServiceKey],
        handles: &HandleMap,
        cancellation: &CancellationToken,
        budget: Duration,
    ) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        let soft_deadline = self.config.stop_hook_soft_deadline;
        let layer_token = cancellation.child_token();

        let mut set: JoinSet<(ServiceKey, Result<(), ignite_core::HookError>, Duration)> = JoinSet::new();
        for key in layer {
            let Some(lifecycle) = handles.get(key).cloned() else { continue };
            let key = key.clone();
            let token = layer_token.clone();
            set.spawn(async move {
                let hook_cx = HookContext::new(token, soft_deadline);
                let started_at = std::time::Instant::now();
                let result = lifecycle.stop(&hook_cx).await;
                (key, result, started_at.elapsed())
            });
        }

        let outcome = tokio::time::timeout(budget, async {
            let mut out = Vec::new();
            while let Some(joined) = set.join_next().await {
                #[allow(clippy::expect_used)]
                out.push(joined.expect("stop hook task panicked unexpectedly"));
            }
            out
        })
        .await;

        match outcome {
            Ok(results) => {
                for (key, result, elapsed) in results {
                    let outcome = match result {
                        Ok(()) => HookOutcome::Completed,
                        Err(err) => {
                            warn!(service = key.as_str(), error = %err, "stop hook failed");
                            HookOutcome::Failed(err.to_string())
                        }
                    };
                    if elapsed > soft_deadline {
                        warn!(service = key.as_str(), elapsed = ?elapsed, "stop hook exceeded soft deadline");
                    }
                    report.record(key, outcome, elapsed, soft_deadline);
                }
            }
            Err(_elapsed) => {
                layer_token.cancel();
                for key in layer {
                    if !report.already_recorded(key) {
                        report.mark_abandoned(key.clone());
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
