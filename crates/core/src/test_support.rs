// SPDX-License-Identifier: MIT
//! Test-only helpers for exercising registries without a full runtime.
//!
//! Gated behind the `test-support` feature so these types never ship in a
//! release build of a dependent crate; mirrors the pattern of keeping
//! proptest strategies and fixtures out of the default feature set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::hook::{HookContext, HookError, Lifecycle};
use crate::worker::{Worker, WorkerContext, WorkerError};

/// A [`Lifecycle`] implementation that records call order and can be told
/// to fail or hang on demand, for lifecycle-engine tests.
pub struct RecordingLifecycle {
    pub name: &'static str,
    starts: Arc<std::sync::Mutex<Vec<&'static str>>>,
    stops: Arc<std::sync::Mutex<Vec<&'static str>>>,
    fail_start: bool,
    hang_start: bool,
}

impl RecordingLifecycle {
    pub fn new(
        name: &'static str,
        starts: Arc<std::sync::Mutex<Vec<&'static str>>>,
        stops: Arc<std::sync::Mutex<Vec<&'static str>>>,
    ) -> Self {
        Self { name, starts, stops, fail_start: false, hang_start: false }
    }

    pub fn failing(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang_start = true;
        self
    }
}

#[async_trait]
impl Lifecycle for RecordingLifecycle {
    async fn start(&self, cx: &HookContext) -> Result<(), HookError> {
        if self.hang_start {
            cx.cancellation().cancelled().await;
            return Err(HookError::msg("cancelled while hanging"));
        }
        if self.fail_start {
            return Err(HookError::msg(format!("{} failed to start", self.name)));
        }
        self.starts.lock().unwrap_or_else(|e| e.into_inner()).push(self.name);
        Ok(())
    }

    async fn stop(&self, _cx: &HookContext) -> Result<(), HookError> {
        self.stops.lock().unwrap_or_else(|e| e.into_inner()).push(self.name);
        Ok(())
    }
}

/// A [`Worker`] that fails its first `fail_count` starts, then runs until
/// cancelled, for supervisor restart/circuit-breaker tests.
pub struct FlakyWorker {
    pub name: &'static str,
    pub fail_count: usize,
    attempts: AtomicUsize,
}

impl FlakyWorker {
    pub fn new(name: &'static str, fail_count: usize) -> Self {
        Self { name, fail_count, attempts: AtomicUsize::new(0) }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for FlakyWorker {
    fn name(&self) -> &str {
        self.name
    }

    async fn start(&self, cx: WorkerContext) -> Result<(), WorkerError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_count {
            return Err(WorkerError::msg(format!("{} failing on attempt {attempt}", self.name)));
        }
        cx.cancellation().cancelled().await;
        Ok(())
    }
}
