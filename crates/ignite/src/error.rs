// SPDX-License-Identifier: MIT
//! The top-level error type returned from `build()`/`start()`/`run()`,
//! aggregating every subsystem's error taxonomy (§7).

use ignite_config::ConfigError;
use ignite_core::{GraphError, RegistryError, ResolveError};
use ignite_runtime::{BringUpFailure, LifecycleError, ShutdownReport, SupervisorError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Start-up failed; already-started components were rolled back. Carries
    /// the rollback's `ShutdownReport` so the caller can see exactly what
    /// was torn down and how cleanly.
    #[error("bring-up failed: {cause}")]
    BringUpFailed {
        #[source]
        cause: LifecycleError,
        shutdown: ShutdownReport,
    },

    /// A critical worker exhausted its restart budget or tripped its
    /// circuit; the orchestrator began an ordinary shutdown in response.
    #[error("a critical worker escalated: {source}")]
    WorkerEscalated {
        #[source]
        source: SupervisorError,
        shutdown: ShutdownReport,
    },

    #[error("orchestrator is already started")]
    AlreadyStarted,

    #[error("orchestrator has not been started")]
    NotStarted,

    #[error("orchestrator was cancelled")]
    Cancelled,
}

impl From<BringUpFailure> for OrchestratorError {
    fn from(failure: BringUpFailure) -> Self {
        OrchestratorError::BringUpFailed { cause: failure.cause, shutdown: failure.rollback }
    }
}
