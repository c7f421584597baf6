// SPDX-License-Identifier: MIT
//! Carries a process exit code alongside a message so `main()` is the only
//! place that calls `std::process::exit`.

use std::fmt;

use ignite::OrchestratorError;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Maps the orchestrator's aggregated error onto the exit codes from the
/// CLI surface: 1 for a build/start failure, 2 for a shutdown that finished
/// with laggards or stop-hook errors.
impl From<OrchestratorError> for ExitError {
    fn from(err: OrchestratorError) -> Self {
        let code = match &err {
            OrchestratorError::BringUpFailed { .. } => 1,
            OrchestratorError::WorkerEscalated { shutdown, .. } if !shutdown.is_clean() => 2,
            OrchestratorError::WorkerEscalated { .. } => 1,
            OrchestratorError::Registry(_) | OrchestratorError::Resolve(_) | OrchestratorError::Graph(_) | OrchestratorError::Config(_) => 1,
            OrchestratorError::AlreadyStarted | OrchestratorError::NotStarted | OrchestratorError::Cancelled => 1,
        };
        Self::new(code, err.to_string())
    }
}
