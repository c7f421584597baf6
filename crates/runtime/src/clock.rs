// SPDX-License-Identifier: MIT
//! Clock abstraction for deterministic testing of timeouts, back-off delays,
//! and circuit cool-downs.
//!
//! The lifecycle engine and worker supervisor never call `tokio::time`
//! directly; they go through `Arc<dyn Clock>` so tests can swap in
//! [`FakeClock`] and fast-forward restart back-off without real wall-clock
//! waits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock whose `now()` advances only when told to, and whose `sleep()`
/// returns immediately while still advancing its notion of `now()` by the
/// requested duration. This lets supervisor/back-off tests assert on elapsed
/// windows without a real-time wait.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(Instant::now())) }
    }

    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
