// SPDX-License-Identifier: MIT
//! File discovery and environment-variable overlay logic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::value::ConfigValue;

/// Default search order: the current directory, then the platform
/// configuration directory (`~/.config` on Linux, etc.), when resolvable.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir);
    }
    paths
}

/// Look for `<name>.<ext>` across `search_paths`, in order, returning the
/// first match.
pub(crate) fn discover_file(name: &str, ext: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    search_paths.iter().map(|dir| dir.join(format!("{name}.{ext}"))).find(|candidate| candidate.is_file())
}

/// Collect `<PREFIX>_<KEY>` environment variables into a dotted map, with
/// `__` translating to `.` inside the key (`DB__USER` -> `db.user`).
pub(crate) fn load_env(prefix: &str) -> BTreeMap<String, ConfigValue> {
    let screaming_prefix = format!("{}_", prefix.to_uppercase());
    let mut out = BTreeMap::new();
    for (key, raw) in std::env::vars() {
        if let Some(rest) = key.strip_prefix(&screaming_prefix) {
            if rest.is_empty() {
                continue;
            }
            let dotted = rest.to_lowercase().replace("__", ".");
            out.insert(dotted, ConfigValue::from_env_str(&raw));
        }
    }
    out
}

pub(crate) fn read_to_string(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
