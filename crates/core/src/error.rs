// SPDX-License-Identifier: MIT
//! Error taxonomy for registration, resolution, and graph construction.

use thiserror::Error;

use crate::key::ServiceKey;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate service key: {0}")]
    DuplicateKey(ServiceKey),

    #[error("registry is sealed and cannot accept new registrations")]
    RegistryClosed,

    #[error("eager-shared descriptor {0} must declare a constructor or a pre-built value")]
    MissingConstruction(ServiceKey),

    #[error("module {0:?} is already registered")]
    DuplicateModule(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no service registered for key: {0}")]
    NotFound(ServiceKey),

    #[error("dependency cycle detected: {}", format_cycle(.0))]
    CycleDetected(Vec<ServiceKey>),

    #[error("construction failed for {key}: {source}")]
    ProviderFailed {
        key: ServiceKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("service {key} was registered as {registered} but resolved as {requested}")]
    TypeMismatch { key: ServiceKey, registered: &'static str, requested: &'static str },
}

fn format_cycle(path: &[ServiceKey]) -> String {
    let mut s = String::new();
    for (i, key) in path.iter().enumerate() {
        if i > 0 {
            s.push_str(" -> ");
        }
        s.push_str(key.as_str());
    }
    s
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(
        "lifecycle cycle detected among {} vertices: {}",
        .0.len(),
        .0.iter().map(ServiceKey::as_str).collect::<Vec<_>>().join(", ")
    )]
    LifecycleCycle(Vec<ServiceKey>),
}
