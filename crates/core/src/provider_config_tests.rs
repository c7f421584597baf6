// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn flag_names_derive_from_namespace_and_key() {
    let flag = FlagSpec::new("port", FlagValue::Int(8080), "listen port");
    assert_eq!(flag.dotted_key("server"), "server.port");
    assert_eq!(flag.flag_name("server"), "server-port");
}
