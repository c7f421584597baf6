// SPDX-License-Identifier: MIT
//! Named, nestable groups of registrations (§6 "module contract").

use std::collections::HashSet;

use ignite_core::{Registration, Registry, RegistryError};

type RegistrationFn = Box<dyn FnOnce(&Registry) -> Result<(), RegistryError> + Send>;

/// A named bundle of registrations, optionally composed of child modules.
/// Child modules are applied strictly before a module's own registrations;
/// a module name seen twice anywhere in the tree fails the whole build with
/// `DuplicateModule`, which also catches a module accidentally nested inside
/// itself.
pub struct Module {
    name: String,
    registrations: Vec<RegistrationFn>,
    children: Vec<Module>,
}

impl Module {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), registrations: Vec::new(), children: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a registration to run when this module is applied.
    pub fn register<T: Send + Sync + 'static>(mut self, registration: Registration<T>) -> Self {
        self.registrations.push(Box::new(move |registry| registry.register(registration)));
        self
    }

    pub fn child(mut self, module: Module) -> Self {
        self.children.push(module);
        self
    }

    pub(crate) fn apply(self, registry: &Registry, seen: &mut HashSet<String>) -> Result<(), RegistryError> {
        if !seen.insert(self.name.clone()) {
            return Err(RegistryError::DuplicateModule(self.name));
        }
        for child in self.children {
            child.apply(registry, seen)?;
        }
        for registration in self.registrations {
            registration(registry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
