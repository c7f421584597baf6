// SPDX-License-Identifier: MIT
//! The start/stop hook contract a service implements to take part in
//! dependency-ordered bring-up and shutdown.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Per-call context threaded into a hook invocation: a cancellation handle
/// the hook should honor, and the deadline the caller is enforcing (for the
/// hook's own informational use — the engine enforces the deadline itself
/// via a timeout around the call, the hook does not need to self-police it).
#[derive(Clone)]
pub struct HookContext {
    cancellation: CancellationToken,
    deadline: Duration,
}

impl HookContext {
    pub fn new(cancellation: CancellationToken, deadline: Duration) -> Self {
        Self { cancellation, deadline }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(pub Box<dyn std::error::Error + Send + Sync>);

impl HookError {
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

/// Terminal outcome of a single hook invocation.
///
/// `idle` is implicit (a hook that has not yet been invoked has no
/// `HookOutcome` at all); `running` is the engine holding the in-flight
/// future. Once an outcome is produced it never changes.
#[derive(Debug, Clone)]
pub enum HookOutcome {
    Completed,
    Failed(String),
    TimedOut,
}

impl HookOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, HookOutcome::Completed)
    }
}

/// A service's bring-up/shutdown contract. Implementations are invoked by
/// the lifecycle engine, never directly by application code.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn start(&self, cx: &HookContext) -> Result<(), HookError>;
    async fn stop(&self, cx: &HookContext) -> Result<(), HookError>;
}
