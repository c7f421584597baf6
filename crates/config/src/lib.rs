// SPDX-License-Identifier: MIT
//! Layered configuration loading, typed binding, and provider-declared flag
//! binding.
//!
//! Nothing here watches files or re-merges after `build()` — layers are
//! read once, during bring-up, and the result is handed off as an immutable
//! [`ConfigManager`].

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod binder;
mod builder;
mod error;
mod format;
mod profile;
mod source;
mod value;

pub use binder::{FlagRegistry, ProviderValues};
pub use builder::{ConfigBuilder, ConfigDefaults, ConfigEvent, ConfigManager, ConfigValidate};
pub use error::ConfigError;
pub use format::{format_by_name, ConfigFormat, JsonFormat, TomlFormat, YamlFormat};
pub use source::default_search_paths;
pub use value::ConfigValue;
