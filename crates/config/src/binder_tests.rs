// SPDX-License-Identifier: MIT

use super::*;
use ignite_core::{FlagValue, ProviderConfigMeta, Registration, Registry};

#[test]
fn duplicate_flag_names_keep_only_the_first_declaration() {
    let registry = Registry::new();
    registry
        .register(
            Registration::<u32>::value_named(
                "a",
                1,
            )
            .provider_config(
                ProviderConfigMeta::new("server").with_flag(FlagSpec::new("port", FlagValue::Int(8080), "listen port")),
            ),
        )
        .unwrap();
    registry
        .register(
            Registration::<u32>::value_named(
                "b",
                2,
            )
            .provider_config(
                ProviderConfigMeta::new("server").with_flag(FlagSpec::new("port", FlagValue::Int(9090), "listen port, again")),
            ),
        )
        .unwrap();
    let sealed = registry.seal();
    let flags = FlagRegistry::collect(&sealed);
    assert_eq!(flags.declarations.len(), 1);
    assert_eq!(flags.declarations[0].1.default, FlagValue::Int(8080));
}
