// SPDX-License-Identifier: MIT
//! The long-lived background worker contract and its per-worker policy.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Context handed to a worker's `start`/`stop`. The worker is expected to run
/// cooperatively until `cancellation` fires, yielding control at `.await`
/// points rather than blocking its task — the supervisor, not the worker,
/// owns the scheduled unit the worker body runs on.
#[derive(Clone)]
pub struct WorkerContext {
    cancellation: CancellationToken,
}

impl WorkerContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct WorkerError(pub Box<dyn std::error::Error + Send + Sync>);

impl WorkerError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    pub fn msg(msg: impl Into<String>) -> Self {
        #[derive(Debug, Error)]
        #[error("{0}")]
        struct Message(String);
        Self(Box::new(Message(msg.into())))
    }
}

/// A long-running background task discovered from the registry.
///
/// `start` runs until `cx` is cancelled or the worker's own work is
/// exhausted; it is driven inside a supervisor-owned task, so a panic
/// anywhere in its body is caught and turned into a restart rather than
/// taking the process down. `stop` must be idempotent and may block (within
/// reason) until the worker has drained in-flight work.
#[async_trait]
pub trait Worker: Send + Sync {
    /// A stable, non-empty identifier unique across workers.
    fn name(&self) -> &str;

    async fn start(&self, cx: WorkerContext) -> Result<(), WorkerError>;

    async fn stop(&self, cx: WorkerContext) -> Result<(), WorkerError> {
        cx.cancellation().cancel();
        Ok(())
    }
}

/// Whether a worker's failure is confined to itself or escalates to the
/// orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Criticality {
    #[default]
    NonCritical,
    Critical,
}

/// A pure function from restart attempt number to back-off delay. Kept
/// Clock-free (no sleeping here) so it is trivially unit-testable; the
/// supervisor is what actually sleeps, via the `Clock` abstraction.
pub trait BackoffPolicy: Send + Sync {
    fn delay_for(&self, attempt: u32) -> Duration;
}

/// Exponential back-off with a cap and a deterministic pseudo-jitter term
/// derived from the attempt number (not from a random source, so retries
/// stay reproducible in tests without needing to inject an RNG).
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self { base: Duration::from_millis(100), max: Duration::from_secs(30) }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(20);
        let scaled = self.base.saturating_mul(1u32 << exp.min(16));
        let capped = scaled.min(self.max);
        // Deterministic jitter: +/- up to 10% based on the attempt number,
        // so two workers failing in lock-step don't restart in lock-step.
        let jitter_pct = (attempt.wrapping_mul(37) % 21) as i64 - 10;
        let nanos = capped.as_nanos() as i64;
        let jittered = nanos + (nanos / 100) * jitter_pct;
        Duration::from_nanos(jittered.max(0) as u64).min(self.max)
    }
}

/// Circuit-breaker policy: how many restarts within `window` before the
/// circuit opens, and how long to wait before a half-open probe.
#[derive(Clone, Debug)]
pub struct CircuitPolicy {
    pub threshold: u32,
    pub window: Duration,
    pub cool_down: Duration,
}

impl Default for CircuitPolicy {
    fn default() -> Self {
        Self { threshold: 5, window: Duration::from_secs(60), cool_down: Duration::from_secs(30) }
    }
}

/// Per-worker registration options.
#[derive(Clone)]
pub struct WorkerOptions {
    pub criticality: Criticality,
    pub max_restarts: Option<u32>,
    pub circuit: CircuitPolicy,
    pub stop_timeout: Duration,
    pub pool_size: u32,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            criticality: Criticality::NonCritical,
            max_restarts: None,
            circuit: CircuitPolicy::default(),
            stop_timeout: Duration::from_secs(10),
            pool_size: 1,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
