// SPDX-License-Identifier: MIT

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn env_vars_translate_double_underscore_to_dots() {
    std::env::set_var("IGNITE_TEST_DB__USER", "alice");
    let loaded = load_env("IGNITE_TEST");
    std::env::remove_var("IGNITE_TEST_DB__USER");
    assert_eq!(loaded.get("db.user"), Some(&ConfigValue::String("alice".to_string())));
}
