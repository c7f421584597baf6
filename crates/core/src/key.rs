// SPDX-License-Identifier: MIT
//! Service keys: the registry's unit of identity.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifies a single registration: either the canonical type name of the
/// declared type parameter, or an explicit name the caller supplied to
/// disambiguate multiple instances of the same type.
///
/// Equality and hashing are by name only — two keys with the same name but
/// different `TypeId`s cannot coexist in a registry (that would be a
/// `DuplicateKey` at registration time), so name uniqueness is the only
/// invariant that matters once a key exists.
#[derive(Clone, Debug)]
pub struct ServiceKey {
    name: Arc<str>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceKey {
    /// The default key for type `T`: its canonical type name.
    pub fn of<T: 'static>() -> Self {
        let type_name = std::any::type_name::<T>();
        Self { name: Arc::from(type_name), type_id: TypeId::of::<T>(), type_name }
    }

    /// An explicit key disambiguating a registration of type `T`.
    pub fn named<T: 'static>(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into(), type_id: TypeId::of::<T>(), type_name: std::any::type_name::<T>() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when this key was registered against the given type parameter.
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Ord for ServiceKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for ServiceKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
