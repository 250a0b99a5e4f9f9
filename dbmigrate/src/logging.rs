//! Log output.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG`, `info` by default.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}
