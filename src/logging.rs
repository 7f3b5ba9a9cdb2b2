//! Tracing setup.
//!
//! Logs go to stderr so stdout stays clean for reports. Verbosity follows
//! `RUST_LOG` (e.g. `RUST_LOG=census_rollup=debug`), default `info`.

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
