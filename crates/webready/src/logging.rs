//! Logging initialization.
//!
//! Log output goes to stderr; stdout is reserved for command output. The
//! effective level comes from the config file's `[logging]` section, with
//! `--verbose` forcing debug and `RUST_LOG` overriding everything.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use webready_core::Config;

/// Resolve the effective level directive and JSON flag from the config
/// plus CLI overrides.
fn resolve(config: &Config, verbose: bool, json_logs: bool) -> (String, bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let json = json_logs || config.logging.format == "json";
    (level, json)
}

/// Install the global subscriber at `level` (error, warn, info, debug,
/// trace), honoring `RUST_LOG` when set.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the loaded configuration and CLI flags.
pub fn init_from_config(config: &Config, verbose: bool, json_logs: bool) {
    let (level, json) = resolve(config, verbose, json_logs);
    init(&level, json);
}
