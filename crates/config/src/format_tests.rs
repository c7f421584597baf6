// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn nested_tables_flatten_to_dotted_keys() {
    let format = TomlFormat;
    let parsed = format
        .parse(
            r#"
            [server]
            port = 8080
            host = "localhost"
            "#,
        )
        .unwrap();
    assert_eq!(parsed.get("server.port"), Some(&ConfigValue::Int(8080)));
    assert_eq!(parsed.get("server.host"), Some(&ConfigValue::String("localhost".to_string())));
}

#[test]
fn yaml_nested_mappings_flatten_to_dotted_keys() {
    let parsed = YamlFormat.parse("server:\n  port: 8080\n  host: localhost\n").unwrap();
    assert_eq!(parsed.get("server.port"), Some(&ConfigValue::Int(8080)));
    assert_eq!(parsed.get("server.host"), Some(&ConfigValue::String("localhost".to_string())));
}

#[test]
fn json_nested_objects_flatten_to_dotted_keys() {
    let parsed = JsonFormat.parse(r#"{"server": {"port": 8080, "host": "localhost"}}"#).unwrap();
    assert_eq!(parsed.get("server.port"), Some(&ConfigValue::Int(8080)));
    assert_eq!(parsed.get("server.host"), Some(&ConfigValue::String("localhost".to_string())));
}

#[test]
fn format_by_name_defaults_to_yaml() {
    assert_eq!(format_by_name("toml").extension(), "toml");
    assert_eq!(format_by_name("json").extension(), "json");
    assert_eq!(format_by_name("yaml").extension(), "yaml");
    assert_eq!(format_by_name("bogus").extension(), "yaml");
}
