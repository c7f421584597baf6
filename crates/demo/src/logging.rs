// SPDX-License-Identifier: MIT
//! Wires `tracing-subscriber` from the `--log-level`/`--log-format`/
//! `--log-output`/`--log-add-source` global flags (§6).
//!
//! These flags are parsed twice: once here, leniently, before the
//! orchestrator's own authoritative `clap::Command::get_matches()` runs
//! inside `build()`. That second parse is the one that actually validates
//! provider-contributed flags and exits on a bad invocation; this pass only
//! needs enough to stand up logging before anything interesting happens.

use std::fs::OpenOptions;
use std::io;

use clap::Command;
use ignite::cli::{parse_global_options, with_global_flags, GlobalOptions};
use tracing_subscriber::EnvFilter;

pub fn bootstrap(program: &str) -> GlobalOptions {
    let command = with_global_flags(Command::new(program.to_string())).ignore_errors(true);
    let matches = command.get_matches();
    let options = parse_global_options(&matches);
    init_subscriber(&options);
    options
}

fn init_subscriber(options: &GlobalOptions) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.log_level));
    let json = options.log_format == "json";
    let add_source = options.log_add_source;

    macro_rules! init_with_writer {
        ($writer:expr) => {{
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_file(add_source)
                .with_line_number(add_source)
                .with_writer($writer);
            if json {
                let _ = builder.json().try_init();
            } else {
                let _ = builder.try_init();
            }
        }};
    }

    match options.log_output.as_str() {
        "stderr" => init_with_writer!(io::stderr),
        "stdout" => init_with_writer!(io::stdout),
        path => match OpenOptions::new().create(true).append(true).open(path) {
            #[allow(clippy::expect_used)]
            Ok(file) => init_with_writer!(move || file.try_clone().expect("clone log file handle")),
            Err(err) => {
                eprintln!("failed to open log output file {path}: {err}, falling back to stderr");
                init_with_writer!(io::stderr);
            }
        },
    }
}
