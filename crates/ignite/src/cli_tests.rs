// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn defaults_apply_when_nothing_is_passed() {
    let command = with_global_flags(Command::new("demo"));
    let matches = command.try_get_matches_from(["demo"]).unwrap();
    let options = parse_global_options(&matches);
    assert_eq!(options.log_level, "info");
    assert_eq!(options.log_format, "text");
    assert!(!options.config_strict);
}

#[test]
fn explicit_flags_override_defaults() {
    let command = with_global_flags(Command::new("demo"));
    let matches = command
        .try_get_matches_from(["demo", "--log-level", "debug", "--config-strict", "--env-prefix", "APP"])
        .unwrap();
    let options = parse_global_options(&matches);
    assert_eq!(options.log_level, "debug");
    assert!(options.config_strict);
    assert_eq!(options.env_prefix.as_deref(), Some("APP"));
}
