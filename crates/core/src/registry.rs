// SPDX-License-Identifier: MIT
//! The service registry: a builder pre-seal, a read-only index post-seal.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::descriptor::Descriptor;
use crate::error::RegistryError;
use crate::key::ServiceKey;
use crate::scope::Scope;

enum State {
    Open { descriptors: Vec<Arc<Descriptor>>, index: HashMap<ServiceKey, usize> },
    Sealed(Arc<SealedRegistry>),
}

/// Accepts descriptors through [`Registry::register`] until [`Registry::seal`]
/// is called, after which it is immutable and safely shared (every reader
/// holds the same `Arc<SealedRegistry>`, no locking on the read path).
pub struct Registry {
    state: RwLock<State>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self { state: RwLock::new(State::Open { descriptors: Vec::new(), index: HashMap::new() }) }
    }

    /// Insert a built descriptor. Fails with `DuplicateKey` if the key is
    /// already taken, or `RegistryClosed` once the registry is sealed.
    pub fn register_descriptor(&self, descriptor: Descriptor) -> Result<(), RegistryError> {
        let mut guard = self.state.write();
        match &mut *guard {
            State::Sealed(_) => Err(RegistryError::RegistryClosed),
            State::Open { descriptors, index } => {
                if index.contains_key(&descriptor.key) {
                    return Err(RegistryError::DuplicateKey(descriptor.key));
                }
                if descriptor.scope == Scope::EagerShared && descriptor.value().is_none() && descriptor.ctor().is_none() {
                    return Err(RegistryError::MissingConstruction(descriptor.key));
                }
                let key = descriptor.key.clone();
                index.insert(key, descriptors.len());
                descriptors.push(Arc::new(descriptor));
                Ok(())
            }
        }
    }

    /// Convenience wrapper taking a [`crate::descriptor::Registration`] builder.
    pub fn register<T: Send + Sync + 'static>(
        &self,
        registration: crate::descriptor::Registration<T>,
    ) -> Result<(), RegistryError> {
        self.register_descriptor(registration.into_descriptor())
    }

    /// Transition to immutable. Idempotent: re-entry returns the same sealed
    /// snapshot rather than erroring.
    pub fn seal(&self) -> Arc<SealedRegistry> {
        let mut guard = self.state.write();
        match &*guard {
            State::Sealed(sealed) => sealed.clone(),
            State::Open { descriptors, index } => {
                let sealed = Arc::new(SealedRegistry { descriptors: descriptors.clone(), index: index.clone() });
                *guard = State::Sealed(sealed.clone());
                sealed
            }
        }
    }

    pub fn is_sealed(&self) -> bool {
        matches!(&*self.state.read(), State::Sealed(_))
    }
}

/// The immutable, shareable view of a registry after [`Registry::seal`].
pub struct SealedRegistry {
    descriptors: Vec<Arc<Descriptor>>,
    index: HashMap<ServiceKey, usize>,
}

impl SealedRegistry {
    pub fn lookup(&self, key: &ServiceKey) -> Option<Arc<Descriptor>> {
        self.index.get(key).map(|&i| self.descriptors[i].clone())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Descriptor>> {
        self.descriptors.iter()
    }

    /// Keys of every `shared`/`eager-shared` descriptor whose declared type
    /// is `T`, in registration order.
    pub fn keys_of_type<T: 'static>(&self) -> Vec<ServiceKey> {
        self.descriptors
            .iter()
            .filter(|d| d.key.is_type::<T>() && d.scope.is_memoized())
            .map(|d| d.key.clone())
            .collect()
    }

    /// Like [`SealedRegistry::keys_of_type`], filtered to a group tag.
    pub fn keys_of_group<T: 'static>(&self, tag: &str) -> Vec<ServiceKey> {
        self.descriptors
            .iter()
            .filter(|d| d.key.is_type::<T>() && d.scope.is_memoized() && d.group.as_deref() == Some(tag))
            .map(|d| d.key.clone())
            .collect()
    }

    /// Keys of every `eager-shared` descriptor, in registration order.
    pub fn eager_keys(&self) -> Vec<ServiceKey> {
        self.descriptors.iter().filter(|d| d.scope.is_eager()).map(|d| d.key.clone()).collect()
    }

    /// Every descriptor carrying a start/stop hook — the Graph Engine's
    /// vertex set (§4.3 step 1).
    pub fn lifecycle_descriptors(&self) -> Vec<Arc<Descriptor>> {
        self.descriptors.iter().filter(|d| d.has_lifecycle()).cloned().collect()
    }

    /// Every descriptor whose declared type satisfies the worker capability.
    pub fn worker_descriptors(&self) -> Vec<Arc<Descriptor>> {
        self.descriptors.iter().filter(|d| d.has_worker()).cloned().collect()
    }

    pub(crate) fn type_id_of(&self, key: &ServiceKey) -> Option<TypeId> {
        self.lookup(key).map(|d| d.key.type_id())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
