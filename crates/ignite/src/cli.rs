// SPDX-License-Identifier: MIT
//! The global persistent flags a CLI host attaches alongside provider-
//! declared flags (§6 "CLI surface").

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

pub const CONFIG_FLAG: &str = "config";
pub const ENV_PREFIX_FLAG: &str = "env-prefix";
pub const CONFIG_STRICT_FLAG: &str = "config-strict";
pub const LOG_LEVEL_FLAG: &str = "log-level";
pub const LOG_FORMAT_FLAG: &str = "log-format";
pub const LOG_OUTPUT_FLAG: &str = "log-output";
pub const LOG_ADD_SOURCE_FLAG: &str = "log-add-source";

/// Add the seven global persistent flags to a host command. Called before
/// provider-declared flags are registered, so `--help` lists the global
/// surface first.
pub fn with_global_flags(command: Command) -> Command {
    command
        .arg(
            Arg::new(CONFIG_FLAG)
                .long(CONFIG_FLAG)
                .help("explicit configuration file; disables search-path lookup")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(Arg::new(ENV_PREFIX_FLAG).long(ENV_PREFIX_FLAG).help("overrides the environment-variable prefix"))
        .arg(
            Arg::new(CONFIG_STRICT_FLAG)
                .long(CONFIG_STRICT_FLAG)
                .action(ArgAction::SetTrue)
                .help("reject unknown configuration file keys"),
        )
        .arg(
            Arg::new(LOG_LEVEL_FLAG)
                .long(LOG_LEVEL_FLAG)
                .default_value("info")
                .value_parser(["debug", "info", "warn", "error"]),
        )
        .arg(Arg::new(LOG_FORMAT_FLAG).long(LOG_FORMAT_FLAG).default_value("text").value_parser(["json", "text"]))
        .arg(Arg::new(LOG_OUTPUT_FLAG).long(LOG_OUTPUT_FLAG).default_value("stdout"))
        .arg(Arg::new(LOG_ADD_SOURCE_FLAG).long(LOG_ADD_SOURCE_FLAG).action(ArgAction::SetTrue))
}

/// The parsed global flags, independent of anything provider-declared.
#[derive(Clone, Debug)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub env_prefix: Option<String>,
    pub config_strict: bool,
    pub log_level: String,
    pub log_format: String,
    pub log_output: String,
    pub log_add_source: bool,
}

pub fn parse_global_options(matches: &ArgMatches) -> GlobalOptions {
    GlobalOptions {
        config: matches.get_one::<PathBuf>(CONFIG_FLAG).cloned(),
        env_prefix: matches.get_one::<String>(ENV_PREFIX_FLAG).cloned(),
        config_strict: matches.get_flag(CONFIG_STRICT_FLAG),
        log_level: matches.get_one::<String>(LOG_LEVEL_FLAG).cloned().unwrap_or_else(|| "info".to_string()),
        log_format: matches.get_one::<String>(LOG_FORMAT_FLAG).cloned().unwrap_or_else(|| "text".to_string()),
        log_output: matches.get_one::<String>(LOG_OUTPUT_FLAG).cloned().unwrap_or_else(|| "stdout".to_string()),
        log_add_source: matches.get_flag(LOG_ADD_SOURCE_FLAG),
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
