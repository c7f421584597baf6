// SPDX-License-Identifier: MIT
//! Error taxonomy for the lifecycle engine and worker supervisor.

use std::time::Duration;

use ignite_core::{HookError, ServiceKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("start hook for {key} timed out after {elapsed:?}")]
    StartTimeout { key: ServiceKey, elapsed: Duration },

    #[error("start hook for {key} failed: {source}")]
    HookFailed {
        key: ServiceKey,
        #[source]
        source: HookError,
    },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("worker {name} panicked: {message}")]
    WorkerPanic { name: String, message: String },

    #[error("worker {name} exceeded its restart threshold; circuit is open")]
    WorkerCircuitOpen { name: String },
}
