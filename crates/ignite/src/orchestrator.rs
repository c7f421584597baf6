// SPDX-License-Identifier: MIT
//! The running application: a sealed registry, a loaded configuration, and
//! (once started) the lifecycle engine's layers and the supervised worker
//! pool (§4.8).

use std::collections::HashMap;
use std::sync::Arc;

use ignite_core::{layer, Layers, Lifecycle, Resolver, SealedRegistry, ServiceKey};
use ignite_runtime::{
    stop_all, Clock, Escalation, LifecycleConfig, LifecycleEngine, SupervisedHandle, SupervisorError, WorkerSnapshot,
};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::OrchestratorError;

/// The orchestrator's phase machine (§4.8). Every transition is one-way
/// except `Failed`/`Stopped`, which are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Sealed,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

struct RunningState {
    layers: Layers,
    handles: HashMap<ServiceKey, Arc<dyn Lifecycle>>,
    workers: Vec<SupervisedHandle>,
    escalation_watcher: JoinHandle<()>,
    pending_escalation: Arc<SyncMutex<Option<Escalation>>>,
}

struct Inner {
    resolver: Resolver,
    config: Arc<ignite_config::ConfigManager>,
    lifecycle_config: LifecycleConfig,
    clock: Arc<dyn Clock>,
    cancellation: CancellationToken,
    state: SyncMutex<AppState>,
    running: AsyncMutex<Option<RunningState>>,
}

/// A built, sealed application ready to be started. Constructed only by
/// [`crate::OrchestratorBuilder::build`].
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub(crate) fn new(
        registry: Arc<SealedRegistry>,
        config: Arc<ignite_config::ConfigManager>,
        lifecycle_config: LifecycleConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = Resolver::new(registry);
        Self {
            inner: Arc::new(Inner {
                resolver,
                config,
                lifecycle_config,
                clock,
                cancellation: CancellationToken::new(),
                state: SyncMutex::new(AppState::Sealed),
                running: AsyncMutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> AppState {
        *self.inner.state.lock()
    }

    pub fn config(&self) -> &ignite_config::ConfigManager {
        &self.inner.config
    }

    /// Snapshot of every supervised worker, empty before `start()` or after
    /// `stop()`.
    pub async fn worker_snapshot(&self) -> Vec<WorkerSnapshot> {
        match &*self.inner.running.lock().await {
            Some(running) => running.workers.iter().map(SupervisedHandle::snapshot).collect(),
            None => Vec::new(),
        }
    }

    /// Resolve every eager-shared service, layer the dependency graph, run
    /// start hooks forward, and spawn the worker pool.
    pub async fn start(&self) -> Result<(), OrchestratorError> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                AppState::Sealed => *state = AppState::Starting,
                _ => return Err(OrchestratorError::AlreadyStarted),
            }
        }

        match self.bring_up().await {
            Ok(running) => {
                *self.inner.running.lock().await = Some(running);
                *self.inner.state.lock() = AppState::Running;
                Ok(())
            }
            Err(err) => {
                *self.inner.state.lock() = AppState::Failed;
                Err(err)
            }
        }
    }

    async fn bring_up(&self) -> Result<RunningState, OrchestratorError> {
        self.inner.resolver.resolve_all_eager().await?;

        let lifecycle_handles = self.inner.resolver.lifecycle_handles().await?;
        let worker_handles = self.inner.resolver.worker_handles().await?;

        let lifecycle_keys: Vec<ServiceKey> = lifecycle_handles.iter().map(|(key, _)| key.clone()).collect();
        let handles: HashMap<ServiceKey, Arc<dyn Lifecycle>> = lifecycle_handles.into_iter().collect();
        let edges = self.inner.resolver.edges();
        let layers = layer(&lifecycle_keys, &edges)?;

        let engine = LifecycleEngine::new(self.inner.lifecycle_config.clone(), self.inner.clock.clone());
        engine.start(&layers, &handles, &self.inner.cancellation).await?;

        let supervisor = ignite_runtime::WorkerSupervisor::new(self.inner.clock.clone());
        let (workers, escalations) = supervisor.spawn_all(worker_handles, &self.inner.cancellation);

        let pending_escalation = Arc::new(SyncMutex::new(None));
        let escalation_watcher =
            spawn_escalation_watcher(escalations, pending_escalation.clone(), self.inner.cancellation.clone());

        Ok(RunningState { layers, handles, workers, escalation_watcher, pending_escalation })
    }

    /// Stop the worker pool, then run stop hooks in reverse layer order.
    /// Idempotent: calling `stop()` on an already-stopped orchestrator is a
    /// no-op.
    pub async fn stop(&self) -> Result<(), OrchestratorError> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                AppState::Stopped => return Ok(()),
                AppState::Running | AppState::Failed => *state = AppState::Stopping,
                AppState::Sealed | AppState::Starting => return Err(OrchestratorError::NotStarted),
                AppState::Stopping => return Ok(()),
            }
        }

        let running = self.inner.running.lock().await.take();
        let Some(running) = running else {
            *self.inner.state.lock() = AppState::Stopped;
            return Ok(());
        };

        stop_all(running.workers).await;
        // Every worker task has now exited, so every clone of the escalation
        // sender has been dropped; the watcher either already recorded an
        // escalation or is about to observe the channel close. Waiting for
        // it here (rather than aborting it) avoids a race against its last
        // `recv()`.
        let _ = running.escalation_watcher.await;

        let engine = LifecycleEngine::new(self.inner.lifecycle_config.clone(), self.inner.clock.clone());
        let report = engine.stop(&running.layers, &running.handles, &self.inner.cancellation).await;
        if !report.is_clean() {
            warn!(laggards = report.laggards.len(), abandoned = report.abandoned.len(), "shutdown finished with failures");
        }

        *self.inner.state.lock() = AppState::Stopped;

        if let Some(escalation) = running.pending_escalation.lock().take() {
            return Err(OrchestratorError::WorkerEscalated { source: to_supervisor_error(&escalation), shutdown: report });
        }

        Ok(())
    }

    /// Start, then block until a termination signal or an internal
    /// cancellation (e.g. a critical worker escalating) arrives, then stop.
    /// This is the entry point most binaries call from `main`.
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        self.start().await?;

        let cancellation = self.inner.cancellation.clone();
        tokio::select! {
            _ = cancellation.cancelled() => {}
            _ = wait_for_termination_signal() => {
                self.inner.cancellation.cancel();
            }
        }

        self.stop().await
    }
}

fn to_supervisor_error(escalation: &Escalation) -> SupervisorError {
    if escalation.reason.contains("circuit") {
        SupervisorError::WorkerCircuitOpen { name: escalation.worker.clone() }
    } else {
        SupervisorError::WorkerPanic { name: escalation.worker.clone(), message: escalation.reason.clone() }
    }
}

fn spawn_escalation_watcher(
    mut escalations: mpsc::UnboundedReceiver<Escalation>,
    pending: Arc<SyncMutex<Option<Escalation>>>,
    cancellation: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(escalation) = escalations.recv().await {
            warn!(worker = escalation.worker.as_str(), reason = escalation.reason.as_str(), "critical worker escalated");
            *pending.lock() = Some(escalation);
            cancellation.cancel();
        }
    })
}

#[cfg(unix)]
#[allow(clippy::expect_used)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut interrupt = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = terminate.recv() => {}
        _ = interrupt.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
