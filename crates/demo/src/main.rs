// SPDX-License-Identifier: MIT
//! Thin CLI front end exercising the orchestrator end-to-end: it builds a
//! `clap::Command`, attaches it to an [`ignite::OrchestratorBuilder`],
//! registers a couple of illustrative services and one worker, and calls
//! `run()`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod exit_error;
mod logging;
mod services;

use std::process::ExitCode;
use std::time::Duration;

use clap::Command;
use ignite::{Registration, Scope, WorkerOptions};

use exit_error::ExitError;
use services::{Greeter, HeartbeatWorker, ServerFlags, ServerSettings};

const BUILD_GIT_HASH: &str = env!("BUILD_GIT_HASH");

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ignite-demo: {err}");
            ExitCode::from(err.code as u8)
        }
    }
}

async fn run() -> Result<(), ExitError> {
    logging::bootstrap("ignite-demo");

    let command = Command::new("ignite-demo").version(BUILD_GIT_HASH).about("Reference service process built on ignite");

    let orchestrator = ignite::OrchestratorBuilder::new()
        .attach_cli(command)
        .env_prefix("IGNITE_DEMO")
        .config_strict(false)
        .with_config::<ServerSettings>()
        .register(Registration::<ServerFlags>::value(ServerFlags).provider_config(ServerFlags::declarations()))
        .register(
            Registration::<Greeter>::factory(Scope::Shared, |cx| async move {
                let settings = cx.resolve::<ServerSettings>().await?;
                Ok(Greeter::new(settings))
            })
            .with_lifecycle(),
        )
        .register(
            Registration::<HeartbeatWorker>::value(HeartbeatWorker::new(Duration::from_secs(10)))
                .as_worker(WorkerOptions::default()),
        )
        .build()
        .map_err(ExitError::from)?;

    orchestrator.run().await.map_err(ExitError::from)
}
