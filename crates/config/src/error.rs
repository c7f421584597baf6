// SPDX-License-Identifier: MIT
//! Error taxonomy for configuration loading and binding.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration failed validation: {0}")]
    ConfigInvalid(String),

    #[error("unknown configuration keys rejected under strict mode: {0:?}")]
    ConfigUnknownKeys(Vec<String>),

    #[error("failed to load configuration file {path}: {source}")]
    ConfigLoadFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to parse configuration: {0}")]
    ConfigParseFailed(Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to bind configuration into the target type: {0}")]
    ConfigBindFailed(#[from] serde_json::Error),
}
