// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn env_strings_are_sniffed_in_priority_order() {
    assert_eq!(ConfigValue::from_env_str("true"), ConfigValue::Bool(true));
    assert_eq!(ConfigValue::from_env_str("42"), ConfigValue::Int(42));
    assert_eq!(ConfigValue::from_env_str("4.5"), ConfigValue::Float(4.5));
    assert_eq!(ConfigValue::from_env_str("hello"), ConfigValue::String("hello".to_string()));
}
