// SPDX-License-Identifier: MIT
//! Typed service registry, resolver, and dependency graph engine.
//!
//! This crate has no notion of a running process: it answers "what depends
//! on what, and in what order must it be built" but leaves actually driving
//! start/stop hooks and supervising workers to `ignite-runtime`, and leaves
//! composing everything into a running application to `ignite`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod descriptor;
mod error;
mod graph;
mod hook;
mod instance;
mod key;
mod provider_config;
mod registry;
mod resolver;
mod scope;
mod worker;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use descriptor::{Construct, Descriptor, Registration};
pub use error::{GraphError, RegistryError, ResolveError};
pub use graph::{layer, Layers};
pub use hook::{HookContext, HookError, HookOutcome, Lifecycle};
pub use key::ServiceKey;
pub use provider_config::{FlagSpec, FlagType, FlagValue, ProviderConfigMeta};
pub use registry::{Registry, SealedRegistry};
pub use resolver::{ResolveContext, Resolver};
pub use scope::Scope;
pub use worker::{BackoffPolicy, CircuitPolicy, Criticality, ExponentialBackoff, Worker, WorkerContext, WorkerError, WorkerOptions};
