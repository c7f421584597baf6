// SPDX-License-Identifier: MIT

use super::*;
use crate::descriptor::Registration;

#[test]
fn duplicate_key_without_explicit_name_is_rejected() {
    let registry = Registry::new();
    registry.register(Registration::<u32>::value(1)).unwrap();
    let err = registry.register(Registration::<u32>::value(2)).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateKey(_)));
}

#[test]
fn register_after_seal_is_rejected() {
    let registry = Registry::new();
    registry.seal();
    let err = registry.register(Registration::<u32>::value(1)).unwrap_err();
    assert!(matches!(err, RegistryError::RegistryClosed));
}

#[test]
fn seal_is_idempotent() {
    let registry = Registry::new();
    registry.register(Registration::<u32>::value(1)).unwrap();
    let first = registry.seal();
    let second = registry.seal();
    assert_eq!(first.len(), second.len());
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn explicit_names_allow_multiple_instances_of_the_same_type() {
    let registry = Registry::new();
    registry.register(Registration::<u32>::value_named("a", 1)).unwrap();
    registry.register(Registration::<u32>::value_named("b", 2)).unwrap();
    let sealed = registry.seal();
    assert_eq!(sealed.len(), 2);
}
